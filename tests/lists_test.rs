//! Live list subscription tests

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use mockito::{Matcher, Server};
use tokio::time::timeout;

use flixtui::api::{DocumentStore, FirestoreClient, MemoryDocStore};
use flixtui::lists::{toggle_membership, ListSnapshot, ListSubscription};
use flixtui::models::{ListKind, Movie, User};

const WAIT: Duration = Duration::from_secs(2);

fn user() -> User {
    User {
        uid: "uid-1".into(),
        email: "neo@matrix.io".into(),
        id_token: "id-token".into(),
        refresh_token: String::new(),
        expires_at: None,
    }
}

fn movie(id: u64, title: &str) -> Movie {
    Movie {
        id,
        title: Some(title.into()),
        ..Movie::default()
    }
}

/// Wait until the subscription reports a snapshot matching `done`
async fn wait_for(sub: &ListSubscription, done: impl Fn(&ListSnapshot) -> bool) -> ListSnapshot {
    let mut rx = sub.receiver();
    timeout(WAIT, async {
        loop {
            let snapshot = rx.borrow_and_update().clone();
            if done(&snapshot) {
                return snapshot;
            }
            assert!(rx.changed().await.is_ok(), "subscription stopped");
        }
    })
    .await
    .expect("snapshot did not arrive in time")
}

#[tokio::test]
async fn test_subscription_follows_writes() {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocStore::new());
    let sub = ListSubscription::subscribe(
        Arc::clone(&store),
        user(),
        ListKind::MyList,
        Duration::from_secs(60),
    );

    let first = wait_for(&sub, |s| !s.is_loading()).await;
    assert!(first.is_empty());

    let matrix = movie(603, "The Matrix");
    let message = toggle_membership(store.as_ref(), &user(), ListKind::MyList, &matrix, false)
        .await
        .unwrap();
    assert_eq!(message, "The Matrix has been added to My List.");

    let added = wait_for(&sub, |s| s.contains(603)).await;
    assert_eq!(added.movies().len(), 1);

    toggle_membership(store.as_ref(), &user(), ListKind::MyList, &matrix, true)
        .await
        .unwrap();
    let removed = wait_for(&sub, |s| !s.contains(603)).await;
    assert!(removed.is_empty());
}

#[tokio::test]
async fn test_lists_do_not_leak_into_each_other() {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocStore::new());
    let liked = ListSubscription::subscribe(
        Arc::clone(&store),
        user(),
        ListKind::Liked,
        Duration::from_secs(60),
    );
    wait_for(&liked, |s| !s.is_loading()).await;

    store
        .add_movie(&user(), ListKind::MyList, &movie(1, "Heat"))
        .await
        .unwrap();
    store
        .add_movie(&user(), ListKind::Liked, &movie(2, "Alien"))
        .await
        .unwrap();

    let snapshot = wait_for(&liked, |s| s.contains(2)).await;
    assert!(!snapshot.contains(1));
}

#[tokio::test]
async fn test_concurrent_adds_all_land() {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocStore::new());
    let titles = ["Heat", "Alien", "Ronin", "Se7en", "Fargo"];

    let adds = titles.iter().enumerate().map(|(i, title)| {
        let store = Arc::clone(&store);
        let movie = movie(i as u64 + 1, title);
        async move {
            toggle_membership(store.as_ref(), &user(), ListKind::MyList, &movie, false).await
        }
    });
    let results = join_all(adds).await;
    assert!(results.iter().all(|r| r.is_ok()));

    let sub = ListSubscription::subscribe(
        Arc::clone(&store),
        user(),
        ListKind::MyList,
        Duration::from_secs(60),
    );
    let snapshot = wait_for(&sub, |s| !s.is_loading()).await;
    assert_eq!(snapshot.movies().len(), titles.len());
}

#[tokio::test]
async fn test_dropped_subscription_stops_its_task() {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocStore::new());
    let sub = ListSubscription::subscribe(
        Arc::clone(&store),
        user(),
        ListKind::MyList,
        Duration::from_secs(60),
    );
    let mut rx = sub.receiver();
    drop(sub);

    // once the task is aborted its sender goes away
    let closed = timeout(WAIT, async {
        while rx.changed().await.is_ok() {}
    })
    .await;
    assert!(closed.is_ok());
}

#[tokio::test]
async fn test_polling_store_reports_failures() {
    let mut server = Server::new_async().await;

    let _mock = server
        .mock("GET", Matcher::Regex(r"/users/uid-1/myList$".into()))
        .match_query(Matcher::Any)
        .with_status(401)
        .create_async()
        .await;

    let store: Arc<dyn DocumentStore> =
        Arc::new(FirestoreClient::with_base_url("flix-test", server.url()));
    let sub = ListSubscription::subscribe(
        store,
        user(),
        ListKind::MyList,
        Duration::from_millis(50),
    );

    let snapshot = wait_for(&sub, |s| matches!(s, ListSnapshot::Failed(_))).await;
    assert!(snapshot.movies().is_empty());
}

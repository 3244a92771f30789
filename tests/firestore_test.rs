//! Document store tests
//!
//! Firestore REST calls against mockito, plus the in-process store.

use mockito::{Matcher, Server};
use serde_json::json;

use flixtui::api::{DocStoreError, DocumentStore, FirestoreClient, MemoryDocStore};
use flixtui::models::{ListKind, Movie, Profile, User};

const LIST_PATH: &str = "/projects/flix-test/databases/(default)/documents/users/uid-1/myList";

fn user() -> User {
    User {
        uid: "uid-1".into(),
        email: "neo@matrix.io".into(),
        id_token: "id-token".into(),
        refresh_token: String::new(),
        expires_at: None,
    }
}

fn matrix() -> Movie {
    Movie {
        id: 603,
        title: Some("The Matrix".into()),
        vote_average: 8.2,
        vote_count: 24000,
        release_date: Some("1999-03-30".into()),
        ..Movie::default()
    }
}

// =============================================================================
// Firestore REST
// =============================================================================

#[tokio::test]
async fn test_list_decodes_typed_fields() {
    let mut server = Server::new_async().await;

    let body = json!({
        "documents": [{
            "name": "projects/flix-test/databases/(default)/documents/users/uid-1/myList/603",
            "fields": {
                "id": { "integerValue": "603" },
                "title": { "stringValue": "The Matrix" },
                "vote_average": { "doubleValue": 8.2 },
                "release_date": { "stringValue": "1999-03-30" },
                "genre_ids": { "arrayValue": { "values": [
                    { "integerValue": "28" }, { "integerValue": "878" }
                ] } }
            }
        }]
    });

    let mock = server
        .mock("GET", LIST_PATH)
        .match_query(Matcher::UrlEncoded("pageSize".into(), "300".into()))
        .match_header("authorization", "Bearer id-token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create_async()
        .await;

    let client = FirestoreClient::with_base_url("flix-test", server.url());
    let movies = client.list_movies(&user(), ListKind::MyList).await.unwrap();

    mock.assert_async().await;
    assert_eq!(movies.len(), 1);
    assert_eq!(movies[0].id, 603);
    assert_eq!(movies[0].display_title(), "The Matrix");
    assert_eq!(movies[0].genre_ids, vec![28, 878]);
}

fn movie_document(id: u64, title: &str) -> serde_json::Value {
    json!({
        "name": format!("projects/flix-test/databases/(default)/documents/users/uid-1/myList/{}", id),
        "fields": {
            "id": { "integerValue": id.to_string() },
            "title": { "stringValue": title }
        }
    })
}

#[tokio::test]
async fn test_list_follows_next_page_token() {
    let mut server = Server::new_async().await;

    let first = server
        .mock("GET", LIST_PATH)
        .match_query(Matcher::Regex("^pageSize=300$".into()))
        .with_status(200)
        .with_body(
            json!({
                "documents": [movie_document(1, "Heat"), movie_document(2, "Alien")],
                "nextPageToken": "p2"
            })
            .to_string(),
        )
        .create_async()
        .await;
    let second = server
        .mock("GET", LIST_PATH)
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("pageSize".into(), "300".into()),
            Matcher::UrlEncoded("pageToken".into(), "p2".into()),
        ]))
        .with_status(200)
        .with_body(json!({ "documents": [movie_document(3, "Ronin")] }).to_string())
        .create_async()
        .await;

    let client = FirestoreClient::with_base_url("flix-test", server.url());
    let movies = client.list_movies(&user(), ListKind::MyList).await.unwrap();

    first.assert_async().await;
    second.assert_async().await;
    let ids: Vec<u64> = movies.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_empty_collection_has_no_documents_key() {
    let mut server = Server::new_async().await;

    let _mock = server
        .mock("GET", Matcher::Regex(r"/users/uid-1/Liked$".into()))
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let client = FirestoreClient::with_base_url("flix-test", server.url());
    let movies = client.list_movies(&user(), ListKind::Liked).await.unwrap();
    assert!(movies.is_empty());
}

#[tokio::test]
async fn test_add_writes_document_under_movie_id() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("PATCH", format!("{}/603", LIST_PATH).as_str())
        .match_header("authorization", "Bearer id-token")
        .match_body(Matcher::PartialJson(json!({
            "fields": {
                "id": { "integerValue": "603" },
                "title": { "stringValue": "The Matrix" },
                "vote_count": { "integerValue": "24000" }
            }
        })))
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let client = FirestoreClient::with_base_url("flix-test", server.url());
    client
        .add_movie(&user(), ListKind::MyList, &matrix())
        .await
        .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_delete_missing_document_is_ok() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("DELETE", format!("{}/42", LIST_PATH).as_str())
        .with_status(404)
        .create_async()
        .await;

    let client = FirestoreClient::with_base_url("flix-test", server.url());
    client
        .remove_movie(&user(), ListKind::MyList, 42)
        .await
        .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_forbidden_is_permission_denied() {
    let mut server = Server::new_async().await;

    let _mock = server
        .mock("GET", Matcher::Regex(r"/users/uid-1/profiles$".into()))
        .match_query(Matcher::Any)
        .with_status(403)
        .with_body(r#"{"error": {"status": "PERMISSION_DENIED"}}"#)
        .create_async()
        .await;

    let client = FirestoreClient::with_base_url("flix-test", server.url());
    let err = client.list_profiles(&user()).await.unwrap_err();
    assert!(matches!(err, DocStoreError::PermissionDenied));
}

#[tokio::test]
async fn test_profile_saved_under_its_name() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("PATCH", Matcher::Regex(r"/users/uid-1/profiles/Kids%20Room$".into()))
        .match_body(Matcher::PartialJson(json!({
            "fields": { "profileIcon": { "stringValue": "blue" } }
        })))
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let client = FirestoreClient::with_base_url("flix-test", server.url());
    client
        .save_profile(&user(), &Profile::new("Kids Room", "blue"))
        .await
        .unwrap();

    mock.assert_async().await;
}

// =============================================================================
// In-Memory Store
// =============================================================================

#[tokio::test]
async fn test_memory_store_is_scoped_per_user() {
    let store = MemoryDocStore::new();
    let other = User {
        uid: "uid-2".into(),
        ..user()
    };

    store
        .add_movie(&user(), ListKind::MyList, &matrix())
        .await
        .unwrap();

    assert_eq!(store.list_movies(&user(), ListKind::MyList).await.unwrap().len(), 1);
    assert!(store.list_movies(&user(), ListKind::Liked).await.unwrap().is_empty());
    assert!(store.list_movies(&other, ListKind::MyList).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_memory_store_publishes_changes() {
    let store = MemoryDocStore::new();
    let mut changes = store.changes().expect("memory store pushes changes");
    let before = *changes.borrow_and_update();

    store
        .add_movie(&user(), ListKind::Liked, &matrix())
        .await
        .unwrap();
    changes.changed().await.unwrap();
    assert!(*changes.borrow() > before);

    // removing twice only notifies once
    store.remove_movie(&user(), ListKind::Liked, 603).await.unwrap();
    store.remove_movie(&user(), ListKind::Liked, 603).await.unwrap();
    assert!(store.list_movies(&user(), ListKind::Liked).await.unwrap().is_empty());
}

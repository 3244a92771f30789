//! Live list subscriptions and membership toggling
//!
//! A `ListSubscription` is the terminal counterpart of a standing query: it
//! owns a background task that keeps a `ListSnapshot` current and is
//! cancelled when the subscription is dropped.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::api::firestore::{DocStoreError, DocumentStore};
use crate::models::{ListKind, Movie, User};

/// Latest known contents of a list collection
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ListSnapshot {
    #[default]
    Loading,
    Ready(Vec<Movie>),
    Failed(String),
}

impl ListSnapshot {
    /// Movies in the snapshot; empty while loading or failed
    pub fn movies(&self) -> &[Movie] {
        match self {
            ListSnapshot::Ready(movies) => movies,
            _ => &[],
        }
    }

    pub fn contains(&self, movie_id: u64) -> bool {
        self.movies().iter().any(|m| m.id == movie_id)
    }

    /// Loaded and holding zero documents
    pub fn is_empty(&self) -> bool {
        matches!(self, ListSnapshot::Ready(movies) if movies.is_empty())
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ListSnapshot::Loading)
    }
}

/// Standing query over one of the signed-in user's lists
pub struct ListSubscription {
    kind: ListKind,
    rx: watch::Receiver<ListSnapshot>,
    task: JoinHandle<()>,
}

impl ListSubscription {
    /// Start watching `kind` for `user`.
    ///
    /// Stores with change notifications are re-read after each change;
    /// the others are re-read every `poll` interval.
    pub fn subscribe(
        store: Arc<dyn DocumentStore>,
        user: User,
        kind: ListKind,
        poll: Duration,
    ) -> Self {
        let (tx, rx) = watch::channel(ListSnapshot::Loading);
        let task = tokio::spawn(watch_list(store, user, kind, poll, tx));
        Self { kind, rx, task }
    }

    pub fn kind(&self) -> ListKind {
        self.kind
    }

    /// Current snapshot
    pub fn snapshot(&self) -> ListSnapshot {
        self.rx.borrow().clone()
    }

    /// Another handle on the snapshot channel
    pub fn receiver(&self) -> watch::Receiver<ListSnapshot> {
        self.rx.clone()
    }
}

impl Drop for ListSubscription {
    fn drop(&mut self) {
        debug!(list = %self.kind, "unsubscribing");
        self.task.abort();
    }
}

async fn watch_list(
    store: Arc<dyn DocumentStore>,
    user: User,
    kind: ListKind,
    poll: Duration,
    tx: watch::Sender<ListSnapshot>,
) {
    let mut changes = store.changes();
    loop {
        let snapshot = match store.list_movies(&user, kind).await {
            Ok(movies) => ListSnapshot::Ready(movies),
            Err(e) => {
                warn!(list = %kind, error = %e, "list refresh failed");
                ListSnapshot::Failed(e.to_string())
            }
        };

        // unchanged snapshots do not wake receivers
        tx.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
        if tx.is_closed() {
            break;
        }

        match changes.as_mut() {
            Some(rx) => {
                if rx.changed().await.is_err() {
                    break;
                }
            }
            None => tokio::time::sleep(poll).await,
        }
    }
}

/// Whether `movie_id` is in the list.
///
/// A loaded snapshot answers directly; otherwise the store is asked.
pub async fn membership(
    store: &dyn DocumentStore,
    user: &User,
    kind: ListKind,
    snapshot: &ListSnapshot,
    movie_id: u64,
) -> Result<bool, DocStoreError> {
    if let ListSnapshot::Ready(movies) = snapshot {
        return Ok(movies.iter().any(|m| m.id == movie_id));
    }
    let movies = store.list_movies(user, kind).await?;
    Ok(movies.iter().any(|m| m.id == movie_id))
}

/// Add or remove `movie` and return the confirmation toast
pub async fn toggle_membership(
    store: &dyn DocumentStore,
    user: &User,
    kind: ListKind,
    movie: &Movie,
    is_added: bool,
) -> Result<String, DocStoreError> {
    let title = movie.display_title();
    if is_added {
        store.remove_movie(user, kind, movie.id).await?;
        Ok(format!("{} has been removed from {}.", title, kind))
    } else {
        store.add_movie(user, kind, movie).await?;
        Ok(format!("{} has been added to {}.", title, kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::firestore::MemoryDocStore;

    fn user() -> User {
        User {
            uid: "u1".into(),
            email: "neo@matrix.io".into(),
            id_token: "t".into(),
            refresh_token: String::new(),
            expires_at: None,
        }
    }

    #[test]
    fn test_snapshot_membership() {
        let movie = Movie {
            id: 3,
            ..Movie::default()
        };
        assert!(!ListSnapshot::Loading.contains(3));
        assert!(!ListSnapshot::Loading.is_empty());
        assert!(ListSnapshot::Ready(vec![movie]).contains(3));
        assert!(ListSnapshot::Ready(vec![]).is_empty());
    }

    #[tokio::test]
    async fn test_toggle_messages() {
        let store = MemoryDocStore::new();
        let movie = Movie {
            id: 11,
            title: Some("Star Wars".into()),
            ..Movie::default()
        };

        let added = toggle_membership(&store, &user(), ListKind::MyList, &movie, false)
            .await
            .unwrap();
        assert_eq!(added, "Star Wars has been added to My List.");

        let removed = toggle_membership(&store, &user(), ListKind::MyList, &movie, true)
            .await
            .unwrap();
        assert_eq!(removed, "Star Wars has been removed from My List.");
    }
}

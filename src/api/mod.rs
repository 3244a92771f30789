//! API clients for external services
//!
//! - TMDB: movie/TV metadata, home rows, genres and trailers
//! - Firestore: per-user lists and profiles

pub mod firestore;
pub mod tmdb;

pub use firestore::{DocStoreError, DocumentStore, FirestoreClient, MemoryDocStore};
pub use tmdb::{Row, TmdbClient, TmdbError};

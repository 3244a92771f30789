//! flixtui - terminal client for a Netflix-style streaming catalogue
//!
//! Sign in, pick a plan, browse rows of titles, keep My List and Liked in
//! sync with the document store, and manage account settings.
//!
//! # Modules
//!
//! - `models` - Movies, users, profiles, plans
//! - `validation` - Local form checks and their messages
//! - `auth` - Identity provider clients and the session facade
//! - `store` - Serializable client state, reducers, persistence
//! - `api` - Metadata (TMDB) and document store (Firestore) clients
//! - `lists` - Live list subscriptions and membership toggling
//! - `forms` - Account form state machines
//! - `app` - Screen resolution, key handling, effects
//! - `ui` - TUI rendering
//! - `cli` / `commands` - Scriptable subcommands

pub mod api;
pub mod app;
pub mod auth;
pub mod cli;
pub mod commands;
pub mod config;
pub mod forms;
pub mod lists;
pub mod models;
pub mod store;
pub mod telemetry;
pub mod ui;
pub mod validation;

// Re-export commonly used types
pub use models::{ListKind, MediaType, Movie, MovieExtras, Plan, Profile, User};

pub use api::{DocumentStore, FirestoreClient, MemoryDocStore, TmdbClient};
pub use app::{App, Effect, Screen, Services};
pub use auth::{AuthError, AuthSession};
pub use store::{RootState, Store};

//! Per-user documents: list collections and profiles
//!
//! Layout in the document database:
//!
//! ```text
//! users/{uid}/myList/{movie_id}    # Movie document
//! users/{uid}/Liked/{movie_id}     # Movie document
//! users/{uid}/profiles/{name}      # Profile document
//! ```
//!
//! `FirestoreClient` talks to the Firestore REST API, `MemoryDocStore` keeps
//! everything in process and publishes a change counter for live lists.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tracing::debug;

use crate::models::{ListKind, Movie, Profile, User};

/// Documents requested per list page
const PAGE_SIZE: &str = "300";
const PROFILES: &str = "profiles";

/// Document store error types
#[derive(Error, Debug)]
pub enum DocStoreError {
    #[error("permission denied (token expired or wrong user)")]
    PermissionDenied,

    #[error("document not found")]
    NotFound,

    #[error("server error: {0}")]
    ServerError(u16),

    #[error("invalid document: {0}")]
    InvalidDocument(String),

    #[error("request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
}

/// Access to the signed-in user's documents
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list_movies(&self, user: &User, kind: ListKind) -> Result<Vec<Movie>, DocStoreError>;

    /// Write the movie under its id; writing an existing id replaces it
    async fn add_movie(&self, user: &User, kind: ListKind, movie: &Movie)
        -> Result<(), DocStoreError>;

    /// Delete by movie id; deleting a missing document succeeds
    async fn remove_movie(&self, user: &User, kind: ListKind, movie_id: u64)
        -> Result<(), DocStoreError>;

    async fn list_profiles(&self, user: &User) -> Result<Vec<Profile>, DocStoreError>;

    async fn save_profile(&self, user: &User, profile: &Profile) -> Result<(), DocStoreError>;

    /// Delete a profile by name; deleting a missing profile succeeds
    async fn remove_profile(&self, user: &User, name: &str) -> Result<(), DocStoreError>;

    /// Change counter bumped on every write, for stores that can push.
    /// `None` means callers have to poll.
    fn changes(&self) -> Option<watch::Receiver<u64>> {
        None
    }
}

// =============================================================================
// Firestore REST
// =============================================================================

/// Firestore REST client
pub struct FirestoreClient {
    project_id: String,
    base_url: String,
    client: reqwest::Client,
}

impl FirestoreClient {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self::with_base_url(project_id, "https://firestore.googleapis.com/v1")
    }

    /// Create a client with a custom base URL (for testing)
    pub fn with_base_url(project_id: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            base_url: base_url.into(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
        }
    }

    fn collection_url(&self, uid: &str, collection: &str) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents/users/{}/{}",
            self.base_url,
            self.project_id,
            urlencoding::encode(uid),
            collection
        )
    }

    fn document_url(&self, uid: &str, collection: &str, id: &str) -> String {
        format!(
            "{}/{}",
            self.collection_url(uid, collection),
            urlencoding::encode(id)
        )
    }

    async fn list<T: DeserializeOwned>(
        &self,
        user: &User,
        collection: &str,
    ) -> Result<Vec<T>, DocStoreError> {
        let url = self.collection_url(&user.uid, collection);
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            debug!(collection, page = ?page_token, "firestore list");
            let mut request = self
                .client
                .get(&url)
                .query(&[("pageSize", PAGE_SIZE)])
                .bearer_auth(&user.id_token);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }
            let page: ListDocuments = check(request.send().await?)?.json().await?;

            for doc in &page.documents {
                items.push(decode_document(&doc.fields)?);
            }
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => return Ok(items),
            }
        }
    }

    async fn write<T: Serialize>(
        &self,
        user: &User,
        collection: &str,
        id: &str,
        value: &T,
    ) -> Result<(), DocStoreError> {
        let url = self.document_url(&user.uid, collection, id);
        debug!(collection, id, "firestore write");

        let fields = encode_document(value)?;
        let response = self
            .client
            .patch(&url)
            .bearer_auth(&user.id_token)
            .json(&json!({ "fields": fields }))
            .send()
            .await?;
        check(response)?;
        Ok(())
    }

    async fn delete(&self, user: &User, collection: &str, id: &str) -> Result<(), DocStoreError> {
        let url = self.document_url(&user.uid, collection, id);
        debug!(collection, id, "firestore delete");

        let response = self
            .client
            .delete(&url)
            .bearer_auth(&user.id_token)
            .send()
            .await?;
        match check(response) {
            Ok(_) | Err(DocStoreError::NotFound) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl DocumentStore for FirestoreClient {
    async fn list_movies(&self, user: &User, kind: ListKind) -> Result<Vec<Movie>, DocStoreError> {
        self.list(user, kind.collection()).await
    }

    async fn add_movie(
        &self,
        user: &User,
        kind: ListKind,
        movie: &Movie,
    ) -> Result<(), DocStoreError> {
        self.write(user, kind.collection(), &movie.id.to_string(), movie)
            .await
    }

    async fn remove_movie(
        &self,
        user: &User,
        kind: ListKind,
        movie_id: u64,
    ) -> Result<(), DocStoreError> {
        self.delete(user, kind.collection(), &movie_id.to_string())
            .await
    }

    async fn list_profiles(&self, user: &User) -> Result<Vec<Profile>, DocStoreError> {
        self.list(user, PROFILES).await
    }

    async fn save_profile(&self, user: &User, profile: &Profile) -> Result<(), DocStoreError> {
        self.write(user, PROFILES, &profile.name, profile).await
    }

    async fn remove_profile(&self, user: &User, name: &str) -> Result<(), DocStoreError> {
        self.delete(user, PROFILES, name).await
    }
}

fn check(response: reqwest::Response) -> Result<reqwest::Response, DocStoreError> {
    match response.status() {
        s if s.is_success() => Ok(response),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(DocStoreError::PermissionDenied),
        StatusCode::NOT_FOUND => Err(DocStoreError::NotFound),
        status => Err(DocStoreError::ServerError(status.as_u16())),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDocuments {
    #[serde(default)]
    documents: Vec<RawDocument>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    #[serde(default)]
    fields: Map<String, Value>,
}

// =============================================================================
// Typed Value Codec
// =============================================================================

/// Encode a plain JSON value as a Firestore typed value
pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            // integers travel as strings
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64().unwrap_or_default() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

/// Decode a Firestore typed value back to plain JSON
pub fn decode_value(value: &Value) -> Result<Value, DocStoreError> {
    let Some((tag, inner)) = value.as_object().and_then(|o| o.iter().next()) else {
        return Err(DocStoreError::InvalidDocument(format!(
            "not a typed value: {}",
            value
        )));
    };

    let decoded = match tag.as_str() {
        "nullValue" => Value::Null,
        "booleanValue" => Value::Bool(inner.as_bool().unwrap_or_default()),
        "stringValue" | "timestampValue" | "referenceValue" => {
            Value::String(inner.as_str().unwrap_or_default().to_string())
        }
        "integerValue" => {
            let parsed = match inner {
                Value::String(s) => s.parse::<i64>().ok(),
                other => other.as_i64(),
            };
            parsed.map(Value::from).ok_or_else(|| {
                DocStoreError::InvalidDocument(format!("bad integerValue: {}", inner))
            })?
        }
        "doubleValue" => inner
            .as_f64()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        "arrayValue" => {
            let values = inner
                .get("values")
                .and_then(Value::as_array)
                .map(|v| v.as_slice())
                .unwrap_or_default();
            Value::Array(values.iter().map(decode_value).collect::<Result<_, _>>()?)
        }
        "mapValue" => {
            let fields = inner
                .get("fields")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default();
            Value::Object(decode_fields(&fields)?)
        }
        other => {
            return Err(DocStoreError::InvalidDocument(format!(
                "unsupported value type: {}",
                other
            )))
        }
    };
    Ok(decoded)
}

fn encode_fields(map: &Map<String, Value>) -> Map<String, Value> {
    map.iter()
        .map(|(k, v)| (k.clone(), encode_value(v)))
        .collect()
}

fn decode_fields(fields: &Map<String, Value>) -> Result<Map<String, Value>, DocStoreError> {
    fields
        .iter()
        .map(|(k, v)| Ok((k.clone(), decode_value(v)?)))
        .collect()
}

/// Serialize a struct into a Firestore `fields` map
pub fn encode_document<T: Serialize>(value: &T) -> Result<Map<String, Value>, DocStoreError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(encode_fields(&map)),
        Ok(other) => Err(DocStoreError::InvalidDocument(format!(
            "documents must be objects, got {}",
            other
        ))),
        Err(e) => Err(DocStoreError::InvalidDocument(e.to_string())),
    }
}

/// Deserialize a Firestore `fields` map into a struct
pub fn decode_document<T: DeserializeOwned>(
    fields: &Map<String, Value>,
) -> Result<T, DocStoreError> {
    let plain = decode_fields(fields)?;
    serde_json::from_value(Value::Object(plain))
        .map_err(|e| DocStoreError::InvalidDocument(e.to_string()))
}

// =============================================================================
// In-Memory Store
// =============================================================================

type Collection = BTreeMap<String, Value>;

/// In-process document store for offline mode and tests.
///
/// Every write bumps a change counter so live list subscriptions re-read
/// without polling.
#[derive(Clone)]
pub struct MemoryDocStore {
    collections: Arc<Mutex<HashMap<(String, String), Collection>>>,
    version: Arc<watch::Sender<u64>>,
}

impl Default for MemoryDocStore {
    fn default() -> Self {
        Self {
            collections: Arc::default(),
            version: Arc::new(watch::channel(0).0),
        }
    }
}

impl MemoryDocStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T: DeserializeOwned>(
        &self,
        uid: &str,
        collection: &str,
    ) -> Result<Vec<T>, DocStoreError> {
        let collections = self.collections.lock().unwrap_or_else(|e| e.into_inner());
        let Some(docs) = collections.get(&(uid.to_string(), collection.to_string())) else {
            return Ok(Vec::new());
        };
        docs.values()
            .map(|doc| {
                serde_json::from_value(doc.clone())
                    .map_err(|e| DocStoreError::InvalidDocument(e.to_string()))
            })
            .collect()
    }

    fn put<T: Serialize>(
        &self,
        uid: &str,
        collection: &str,
        id: String,
        value: &T,
    ) -> Result<(), DocStoreError> {
        let doc =
            serde_json::to_value(value).map_err(|e| DocStoreError::InvalidDocument(e.to_string()))?;
        self.collections
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry((uid.to_string(), collection.to_string()))
            .or_default()
            .insert(id, doc);
        self.bump();
        Ok(())
    }

    fn delete(&self, uid: &str, collection: &str, id: &str) {
        let removed = self
            .collections
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get_mut(&(uid.to_string(), collection.to_string()))
            .and_then(|docs| docs.remove(id));
        if removed.is_some() {
            self.bump();
        }
    }

    fn bump(&self) {
        self.version.send_modify(|v| *v += 1);
    }
}

#[async_trait]
impl DocumentStore for MemoryDocStore {
    async fn list_movies(&self, user: &User, kind: ListKind) -> Result<Vec<Movie>, DocStoreError> {
        self.read(&user.uid, kind.collection())
    }

    async fn add_movie(
        &self,
        user: &User,
        kind: ListKind,
        movie: &Movie,
    ) -> Result<(), DocStoreError> {
        self.put(&user.uid, kind.collection(), movie.id.to_string(), movie)
    }

    async fn remove_movie(
        &self,
        user: &User,
        kind: ListKind,
        movie_id: u64,
    ) -> Result<(), DocStoreError> {
        self.delete(&user.uid, kind.collection(), &movie_id.to_string());
        Ok(())
    }

    async fn list_profiles(&self, user: &User) -> Result<Vec<Profile>, DocStoreError> {
        self.read(&user.uid, PROFILES)
    }

    async fn save_profile(&self, user: &User, profile: &Profile) -> Result<(), DocStoreError> {
        self.put(&user.uid, PROFILES, profile.name.clone(), profile)
    }

    async fn remove_profile(&self, user: &User, name: &str) -> Result<(), DocStoreError> {
        self.delete(&user.uid, PROFILES, name);
        Ok(())
    }

    fn changes(&self) -> Option<watch::Receiver<u64>> {
        Some(self.version.subscribe())
    }
}

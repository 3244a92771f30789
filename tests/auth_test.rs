//! Identity provider tests
//!
//! Uses mockito to stand in for the Identity Toolkit REST API.

use std::sync::Arc;

use chrono::{Duration, Utc};
use mockito::{Matcher, Server};
use tempfile::TempDir;

use flixtui::auth::session::SESSION_KEY;
use flixtui::auth::{AuthClient, AuthError, AuthSession, FirebaseAuth, OpStatus};
use flixtui::models::User;
use flixtui::store::{FileStorage, LocalStorage};

fn account_body(uid: &str, email: &str) -> String {
    serde_json::json!({
        "localId": uid,
        "email": email,
        "idToken": "id-token",
        "refreshToken": "refresh-token"
    })
    .to_string()
}

fn error_body(message: &str) -> String {
    serde_json::json!({ "error": { "code": 400, "message": message } }).to_string()
}

fn token_body(id_token: &str) -> String {
    serde_json::json!({
        "expires_in": "3600",
        "token_type": "Bearer",
        "refresh_token": "refresh-2",
        "id_token": id_token,
        "user_id": "uid-1",
        "project_id": "flix-test"
    })
    .to_string()
}

/// Storage holding a signed-in user whose id token is `id_token`
fn stored_session(dir: &TempDir, id_token: &str, expires_in: Duration) -> Arc<dyn LocalStorage> {
    let storage: Arc<dyn LocalStorage> = Arc::new(FileStorage::new(dir.path()));
    let user = User {
        uid: "uid-1".into(),
        email: "neo@matrix.io".into(),
        id_token: id_token.into(),
        refresh_token: "refresh-1".into(),
        expires_at: Some(Utc::now() + expires_in),
    };
    storage
        .set_item(SESSION_KEY, &serde_json::to_string(&user).unwrap())
        .unwrap();
    storage
}

// =============================================================================
// FirebaseAuth
// =============================================================================

#[tokio::test]
async fn test_sign_in_success() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("POST", "/accounts:signInWithPassword")
        .match_query(Matcher::UrlEncoded("key".into(), "web-key".into()))
        .match_body(Matcher::PartialJson(serde_json::json!({
            "email": "neo@matrix.io",
            "password": "redpill",
            "returnSecureToken": true
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(account_body("uid-1", "neo@matrix.io"))
        .create_async()
        .await;

    let auth = FirebaseAuth::with_base_url("web-key", server.url());
    let user = auth.sign_in("neo@matrix.io", "redpill").await.unwrap();

    mock.assert_async().await;
    assert_eq!(user.uid, "uid-1");
    assert_eq!(user.email, "neo@matrix.io");
    assert_eq!(user.id_token, "id-token");
}

#[tokio::test]
async fn test_sign_in_unknown_email() {
    let mut server = Server::new_async().await;

    let _mock = server
        .mock("POST", "/accounts:signInWithPassword")
        .match_query(Matcher::Any)
        .with_status(400)
        .with_body(error_body("EMAIL_NOT_FOUND"))
        .create_async()
        .await;

    let auth = FirebaseAuth::with_base_url("web-key", server.url());
    let err = auth.sign_in("ghost@matrix.io", "redpill").await.unwrap_err();
    assert_eq!(err, AuthError::UserNotFound);
}

#[tokio::test]
async fn test_sign_up_email_taken() {
    let mut server = Server::new_async().await;

    let _mock = server
        .mock("POST", "/accounts:signUp")
        .match_query(Matcher::Any)
        .with_status(400)
        .with_body(error_body("EMAIL_EXISTS"))
        .create_async()
        .await;

    let auth = FirebaseAuth::with_base_url("web-key", server.url());
    let err = auth.sign_up("neo@matrix.io", "redpill").await.unwrap_err();
    assert_eq!(err, AuthError::EmailAlreadyInUse);
}

#[tokio::test]
async fn test_unknown_provider_message_is_kept() {
    let mut server = Server::new_async().await;

    let _mock = server
        .mock("POST", "/accounts:signInWithPassword")
        .match_query(Matcher::Any)
        .with_status(400)
        .with_body(error_body("OPERATION_NOT_ALLOWED"))
        .create_async()
        .await;

    let auth = FirebaseAuth::with_base_url("web-key", server.url());
    let err = auth.sign_in("neo@matrix.io", "redpill").await.unwrap_err();
    assert_eq!(err, AuthError::Provider("OPERATION_NOT_ALLOWED".into()));
    assert!(err.is_alert());
}

#[tokio::test]
async fn test_session_records_rejection() {
    let mut server = Server::new_async().await;

    let _mock = server
        .mock("POST", "/accounts:signInWithPassword")
        .match_query(Matcher::Any)
        .with_status(400)
        .with_body(error_body("INVALID_PASSWORD"))
        .create_async()
        .await;

    let mut session = AuthSession::new(Arc::new(FirebaseAuth::with_base_url(
        "web-key",
        server.url(),
    )));
    let err = session.sign_in("neo@matrix.io", "bluepill").await.unwrap_err();

    assert_eq!(err, AuthError::WrongPassword);
    assert_eq!(session.status(), &OpStatus::Rejected(AuthError::WrongPassword));
    assert!(!session.is_signed_in());
}

// =============================================================================
// Session persistence
// =============================================================================

#[tokio::test]
async fn test_session_persists_to_disk() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/accounts:signInWithPassword")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(account_body("uid-7", "trinity@matrix.io"))
        .create_async()
        .await;

    let dir = TempDir::new().unwrap();
    let auth: Arc<dyn AuthClient> = Arc::new(FirebaseAuth::with_base_url("web-key", server.url()));
    let storage: Arc<dyn LocalStorage> = Arc::new(FileStorage::new(dir.path()));

    let mut session = AuthSession::with_storage(Arc::clone(&auth), Arc::clone(&storage));
    session.sign_in("trinity@matrix.io", "redpill").await.unwrap();

    // a second run with fresh handles on the same directory
    let reopened_storage: Arc<dyn LocalStorage> = Arc::new(FileStorage::new(dir.path()));
    let restored = AuthSession::with_storage(Arc::clone(&auth), reopened_storage);
    assert_eq!(restored.user().map(|u| u.uid.as_str()), Some("uid-7"));
}

#[tokio::test]
async fn test_sign_out_clears_stored_user() {
    let mut server = Server::new_async().await;
    let _sign_in = server
        .mock("POST", "/accounts:signInWithPassword")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(account_body("uid-7", "trinity@matrix.io"))
        .create_async()
        .await;

    let dir = TempDir::new().unwrap();
    let auth: Arc<dyn AuthClient> = Arc::new(FirebaseAuth::with_base_url("web-key", server.url()));
    let storage: Arc<dyn LocalStorage> = Arc::new(FileStorage::new(dir.path()));

    let mut session = AuthSession::with_storage(Arc::clone(&auth), Arc::clone(&storage));
    session.sign_in("trinity@matrix.io", "redpill").await.unwrap();
    session.sign_out().await.unwrap();

    assert!(!session.is_signed_in());
    let restored = AuthSession::with_storage(auth, storage);
    assert!(restored.user().is_none());
}

// =============================================================================
// Token refresh
// =============================================================================

#[tokio::test]
async fn test_refresh_exchanges_refresh_token() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/token")
        .match_query(Matcher::UrlEncoded("key".into(), "web-key".into()))
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()),
            Matcher::UrlEncoded("refresh_token".into(), "refresh-1".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(token_body("fresh"))
        .create_async()
        .await;

    let dir = TempDir::new().unwrap();
    let storage = stored_session(&dir, "stale", Duration::seconds(10));
    let auth: Arc<dyn AuthClient> = Arc::new(FirebaseAuth::with_base_url("web-key", server.url()));

    let mut session = AuthSession::with_storage(Arc::clone(&auth), Arc::clone(&storage));
    assert!(session.refresh_if_expiring().await.unwrap());
    mock.assert_async().await;

    let user = session.user().unwrap();
    assert_eq!(user.id_token, "fresh");
    assert_eq!(user.refresh_token, "refresh-2");
    assert_eq!(user.email, "neo@matrix.io");
    assert!(!user.token_expiring(Utc::now()));

    // the next run starts from the renewed token
    let reopened = AuthSession::with_storage(auth, storage);
    assert_eq!(reopened.user().map(|u| u.id_token.as_str()), Some("fresh"));
}

#[tokio::test]
async fn test_stale_token_is_refreshed_before_retrying_update() {
    let mut server = Server::new_async().await;
    let rejected = server
        .mock("POST", "/accounts:update")
        .match_query(Matcher::Any)
        .match_body(Matcher::PartialJson(serde_json::json!({ "idToken": "stale" })))
        .with_status(400)
        .with_body(error_body("INVALID_ID_TOKEN"))
        .create_async()
        .await;
    let refreshed = server
        .mock("POST", "/token")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(token_body("fresh"))
        .create_async()
        .await;
    let accepted = server
        .mock("POST", "/accounts:update")
        .match_query(Matcher::Any)
        .match_body(Matcher::PartialJson(serde_json::json!({
            "idToken": "fresh",
            "email": "the.one@matrix.io"
        })))
        .with_status(200)
        .with_body(
            serde_json::json!({
                "localId": "uid-1",
                "email": "the.one@matrix.io",
                "idToken": "fresh-2",
                "refreshToken": "refresh-3",
                "expiresIn": "3600"
            })
            .to_string(),
        )
        .create_async()
        .await;

    // the stored expiry looks fine, but the provider has revoked the token
    let dir = TempDir::new().unwrap();
    let storage = stored_session(&dir, "stale", Duration::minutes(30));
    let auth: Arc<dyn AuthClient> = Arc::new(FirebaseAuth::with_base_url("web-key", server.url()));
    let mut session = AuthSession::with_storage(auth, storage);

    session.change_email("the.one@matrix.io").await.unwrap();

    rejected.assert_async().await;
    refreshed.assert_async().await;
    accepted.assert_async().await;
    assert_eq!(session.status(), &OpStatus::Resolved);
    let user = session.user().unwrap();
    assert_eq!(user.email, "the.one@matrix.io");
    assert_eq!(user.id_token, "fresh-2");
}

#[tokio::test]
async fn test_revoked_refresh_token_ends_session() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/token")
        .match_query(Matcher::Any)
        .with_status(400)
        .with_body(error_body("TOKEN_EXPIRED"))
        .create_async()
        .await;

    let dir = TempDir::new().unwrap();
    let storage = stored_session(&dir, "stale", -Duration::minutes(5));
    let auth: Arc<dyn AuthClient> = Arc::new(FirebaseAuth::with_base_url("web-key", server.url()));

    let mut session = AuthSession::with_storage(Arc::clone(&auth), Arc::clone(&storage));
    assert_eq!(
        session.refresh_if_expiring().await,
        Err(AuthError::TokenExpired)
    );
    assert!(!session.is_signed_in());
    assert!(AuthSession::with_storage(auth, storage).user().is_none());
}

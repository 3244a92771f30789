//! Identity provider access
//!
//! - `AuthClient`: provider interface (sign in/up, credential updates)
//! - `FirebaseAuth`: Identity Toolkit REST implementation
//! - `MemoryAuth`: in-process provider for offline mode and tests
//! - `AuthSession`: the facade views talk to

pub mod firebase;
pub mod memory;
pub mod session;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::User;

pub use firebase::FirebaseAuth;
pub use memory::MemoryAuth;
pub use session::{AuthSession, OpStatus};

/// Closed set of provider failures the forms know how to present
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("user not found")]
    UserNotFound,

    #[error("wrong password")]
    WrongPassword,

    #[error("email already in use")]
    EmailAlreadyInUse,

    #[error("weak password")]
    WeakPassword,

    #[error("invalid email")]
    InvalidEmail,

    #[error("recent login required")]
    RequiresRecentLogin,

    #[error("too many attempts, try again later")]
    TooManyRequests,

    #[error("credentials belong to a different user")]
    UserMismatch,

    #[error("session expired, please sign in again")]
    TokenExpired,

    #[error("not signed in")]
    NotSignedIn,

    #[error("network error: {0}")]
    Network(String),

    #[error("{0}")]
    Provider(String),
}

impl AuthError {
    /// Classify a raw provider message.
    ///
    /// Matches both the JS SDK codes (`auth/wrong-password`) and the REST
    /// codes (`INVALID_PASSWORD`), case-insensitively. Unknown messages are
    /// kept verbatim in `Provider`.
    pub fn classify(message: &str) -> Self {
        let table = [
            ("user-not-found", AuthError::UserNotFound),
            ("email_not_found", AuthError::UserNotFound),
            ("user_not_found", AuthError::UserNotFound),
            ("wrong-password", AuthError::WrongPassword),
            ("invalid_password", AuthError::WrongPassword),
            ("invalid_login_credentials", AuthError::WrongPassword),
            ("invalid-credential", AuthError::WrongPassword),
            ("email-already-in-use", AuthError::EmailAlreadyInUse),
            ("email_exists", AuthError::EmailAlreadyInUse),
            ("weak-password", AuthError::WeakPassword),
            ("weak_password", AuthError::WeakPassword),
            ("invalid-email", AuthError::InvalidEmail),
            ("invalid_email", AuthError::InvalidEmail),
            ("requires-recent-login", AuthError::RequiresRecentLogin),
            ("credential_too_old_login_again", AuthError::RequiresRecentLogin),
            ("too-many-requests", AuthError::TooManyRequests),
            ("too_many_attempts_try_later", AuthError::TooManyRequests),
            ("user-mismatch", AuthError::UserMismatch),
            ("token_expired", AuthError::TokenExpired),
            ("invalid_id_token", AuthError::TokenExpired),
            ("invalid_refresh_token", AuthError::TokenExpired),
            ("id-token-expired", AuthError::TokenExpired),
            ("user-token-expired", AuthError::TokenExpired),
        ];

        let lower = message.to_ascii_lowercase();
        table
            .into_iter()
            .find(|(needle, _)| lower.contains(needle))
            .map(|(_, kind)| kind)
            .unwrap_or_else(|| AuthError::Provider(message.to_string()))
    }

    /// Whether the form has no field to attach this to and must alert instead
    pub fn is_alert(&self) -> bool {
        matches!(
            self,
            AuthError::Network(_)
                | AuthError::Provider(_)
                | AuthError::TooManyRequests
                | AuthError::TokenExpired
        )
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        AuthError::Network(err.to_string())
    }
}

/// Identity provider interface
#[async_trait]
pub trait AuthClient: Send + Sync {
    /// Exchange email + password for a session
    async fn sign_in(&self, email: &str, password: &str) -> Result<User, AuthError>;

    /// Create an account and sign it in
    async fn sign_up(&self, email: &str, password: &str) -> Result<User, AuthError>;

    /// Change the account email; returns the refreshed user
    async fn update_email(&self, user: &User, new_email: &str) -> Result<User, AuthError>;

    /// Change the account password; returns the refreshed user
    async fn update_password(&self, user: &User, new_password: &str) -> Result<User, AuthError>;

    /// Trade the user's refresh token for a new id token
    async fn refresh(&self, user: &User) -> Result<User, AuthError>;

    /// End the provider session
    async fn sign_out(&self, user: &User) -> Result<(), AuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_sdk_codes() {
        assert_eq!(
            AuthError::classify("Firebase: Error (auth/user-not-found)."),
            AuthError::UserNotFound
        );
        assert_eq!(
            AuthError::classify("Firebase: Error (auth/wrong-password)."),
            AuthError::WrongPassword
        );
        assert_eq!(
            AuthError::classify("Firebase: Error (auth/email-already-in-use)."),
            AuthError::EmailAlreadyInUse
        );
        assert_eq!(
            AuthError::classify(
                "Firebase: Password should be at least 6 characters (auth/weak-password)."
            ),
            AuthError::WeakPassword
        );
    }

    #[test]
    fn test_classify_rest_codes() {
        assert_eq!(AuthError::classify("EMAIL_NOT_FOUND"), AuthError::UserNotFound);
        assert_eq!(AuthError::classify("INVALID_PASSWORD"), AuthError::WrongPassword);
        assert_eq!(AuthError::classify("EMAIL_EXISTS"), AuthError::EmailAlreadyInUse);
        assert_eq!(
            AuthError::classify("WEAK_PASSWORD : Password should be at least 6 characters"),
            AuthError::WeakPassword
        );
        assert_eq!(
            AuthError::classify("CREDENTIAL_TOO_OLD_LOGIN_AGAIN"),
            AuthError::RequiresRecentLogin
        );
        assert_eq!(
            AuthError::classify("TOO_MANY_ATTEMPTS_TRY_LATER : blocked"),
            AuthError::TooManyRequests
        );
        assert_eq!(AuthError::classify("TOKEN_EXPIRED"), AuthError::TokenExpired);
        assert_eq!(AuthError::classify("INVALID_ID_TOKEN"), AuthError::TokenExpired);
        assert!(AuthError::TokenExpired.is_alert());
    }

    #[test]
    fn test_classify_unknown_is_alert() {
        let err = AuthError::classify("OPERATION_NOT_ALLOWED");
        assert_eq!(err, AuthError::Provider("OPERATION_NOT_ALLOWED".into()));
        assert!(err.is_alert());
        assert!(!AuthError::WrongPassword.is_alert());
    }
}

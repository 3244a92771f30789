//! Session facade over an `AuthClient`
//!
//! Owns the signed-in user, tracks the status of the last provider call and
//! mirrors the user into local storage so separate runs share one session.

use chrono::{DateTime, Duration, Utc};
use std::future::Future;
use std::sync::Arc;
use tracing::{info, warn};

use super::{AuthClient, AuthError};
use crate::models::User;
use crate::store::persist::LocalStorage;

/// Storage key for the signed-in user
pub const SESSION_KEY: &str = "auth:user";

/// Pause after a refresh that failed for reasons other than a dead session
const REFRESH_RETRY_SECS: i64 = 30;

/// Outcome of the most recent provider call
#[derive(Debug, Clone, PartialEq, Default)]
pub enum OpStatus {
    #[default]
    Idle,
    Pending,
    Resolved,
    Rejected(AuthError),
}

pub struct AuthSession {
    client: Arc<dyn AuthClient>,
    storage: Option<Arc<dyn LocalStorage>>,
    user: Option<User>,
    status: OpStatus,
    retry_refresh_at: Option<DateTime<Utc>>,
}

impl AuthSession {
    /// Session without persistence
    pub fn new(client: Arc<dyn AuthClient>) -> Self {
        Self {
            client,
            storage: None,
            user: None,
            status: OpStatus::Idle,
            retry_refresh_at: None,
        }
    }

    /// Session that restores and mirrors the user through `storage`
    pub fn with_storage(client: Arc<dyn AuthClient>, storage: Arc<dyn LocalStorage>) -> Self {
        let user = match storage.get_item(SESSION_KEY) {
            Ok(Some(raw)) => serde_json::from_str(&raw)
                .map_err(|e| warn!(error = %e, "discarding unreadable session"))
                .ok(),
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "could not read session");
                None
            }
        };

        Self {
            client,
            storage: Some(storage),
            user,
            status: OpStatus::Idle,
            retry_refresh_at: None,
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    pub fn status(&self) -> &OpStatus {
        &self.status
    }

    /// True while a provider call is in flight
    pub fn loading(&self) -> bool {
        self.status == OpStatus::Pending
    }

    /// Error of the last call, if it was rejected
    pub fn last_error(&self) -> Option<&AuthError> {
        match &self.status {
            OpStatus::Rejected(err) => Some(err),
            _ => None,
        }
    }

    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<(), AuthError> {
        self.status = OpStatus::Pending;
        let client = Arc::clone(&self.client);
        let result = client.sign_in(email.trim(), password).await;
        let user = self.settle(result)?;
        info!(uid = %user.uid, "signed in");
        self.set_user(Some(user));
        Ok(())
    }

    pub async fn sign_up(&mut self, email: &str, password: &str) -> Result<(), AuthError> {
        self.status = OpStatus::Pending;
        let client = Arc::clone(&self.client);
        let result = client.sign_up(email.trim(), password).await;
        let user = self.settle(result)?;
        info!(uid = %user.uid, "account created");
        self.set_user(Some(user));
        Ok(())
    }

    /// Confirm the current user's password.
    ///
    /// The provider must answer with the same uid; a different account behind
    /// the same email is reported as `UserMismatch`.
    pub async fn reauthenticate(&mut self, password: &str) -> Result<(), AuthError> {
        let current = self.require_user()?;
        self.status = OpStatus::Pending;
        let client = Arc::clone(&self.client);
        let result = match client.sign_in(&current.email, password).await {
            Ok(user) if user.uid != current.uid => Err(AuthError::UserMismatch),
            other => other,
        };
        let user = self.settle(result)?;
        self.set_user(Some(user));
        Ok(())
    }

    pub async fn change_email(&mut self, new_email: &str) -> Result<(), AuthError> {
        let new_email = new_email.trim();
        let user = self
            .update(|client, user| async move { client.update_email(&user, new_email).await })
            .await?;
        info!(uid = %user.uid, "email changed");
        self.set_user(Some(user));
        Ok(())
    }

    pub async fn change_password(&mut self, new_password: &str) -> Result<(), AuthError> {
        let user = self
            .update(|client, user| async move { client.update_password(&user, new_password).await })
            .await?;
        info!(uid = %user.uid, "password changed");
        self.set_user(Some(user));
        Ok(())
    }

    /// Trade the refresh token for a new id token and persist it.
    ///
    /// A refresh token the provider no longer accepts ends the session
    /// locally and reports `TokenExpired`.
    pub async fn refresh(&mut self) -> Result<(), AuthError> {
        let current = self.require_user()?;
        let client = Arc::clone(&self.client);
        match client.refresh(&current).await {
            Ok(user) => {
                info!(uid = %user.uid, "id token refreshed");
                self.retry_refresh_at = None;
                self.set_user(Some(user));
                Ok(())
            }
            Err(AuthError::TokenExpired | AuthError::UserNotFound) => {
                warn!(uid = %current.uid, "refresh token rejected, session ended");
                self.set_user(None);
                Err(AuthError::TokenExpired)
            }
            Err(e) => {
                self.retry_refresh_at = Some(Utc::now() + Duration::seconds(REFRESH_RETRY_SECS));
                Err(e)
            }
        }
    }

    /// Refresh when the id token is about to lapse. Returns true if it was renewed.
    pub async fn refresh_if_expiring(&mut self) -> Result<bool, AuthError> {
        let now = Utc::now();
        if self.retry_refresh_at.is_some_and(|at| now < at) {
            return Ok(false);
        }
        match &self.user {
            Some(user) if user.token_expiring(now) => self.refresh().await.map(|()| true),
            _ => Ok(false),
        }
    }

    /// End the session. The local user is dropped even if the provider call fails.
    pub async fn sign_out(&mut self) -> Result<(), AuthError> {
        let Some(current) = self.user.clone() else {
            self.status = OpStatus::Idle;
            return Ok(());
        };
        self.status = OpStatus::Pending;
        let client = Arc::clone(&self.client);
        let result = client.sign_out(&current).await;
        self.set_user(None);
        info!(uid = %current.uid, "signed out");
        self.settle(result)
    }

    fn require_user(&mut self) -> Result<User, AuthError> {
        match &self.user {
            Some(user) => Ok(user.clone()),
            None => {
                self.status = OpStatus::Rejected(AuthError::NotSignedIn);
                Err(AuthError::NotSignedIn)
            }
        }
    }

    /// Run a credential update, refreshing once if the id token was stale
    async fn update<F, Fut>(&mut self, call: F) -> Result<User, AuthError>
    where
        F: Fn(Arc<dyn AuthClient>, User) -> Fut,
        Fut: Future<Output = Result<User, AuthError>>,
    {
        let current = self.require_user()?;
        self.status = OpStatus::Pending;
        let result = match call(Arc::clone(&self.client), current).await {
            Err(AuthError::TokenExpired) => match self.refresh().await {
                Ok(()) => {
                    let fresh = self.require_user()?;
                    call(Arc::clone(&self.client), fresh).await
                }
                Err(e) => Err(e),
            },
            other => other,
        };
        self.settle(result)
    }

    fn settle<T>(&mut self, result: Result<T, AuthError>) -> Result<T, AuthError> {
        self.status = match &result {
            Ok(_) => OpStatus::Resolved,
            Err(err) => OpStatus::Rejected(err.clone()),
        };
        result
    }

    fn set_user(&mut self, user: Option<User>) {
        self.user = user;
        let Some(storage) = &self.storage else {
            return;
        };
        let outcome = match &self.user {
            Some(user) => serde_json::to_string(user)
                .map_err(|e| e.to_string())
                .and_then(|raw| {
                    storage
                        .set_item(SESSION_KEY, &raw)
                        .map_err(|e| e.to_string())
                }),
            None => storage.remove_item(SESSION_KEY).map_err(|e| e.to_string()),
        };
        if let Err(e) = outcome {
            warn!(error = %e, "could not persist session");
        }
    }
}

//! Firebase Identity Toolkit REST client
//!
//! API docs: https://firebase.google.com/docs/reference/rest/auth

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{AuthClient, AuthError};
use crate::models::User;

const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const SECURE_TOKEN_URL: &str = "https://securetoken.googleapis.com/v1";

/// Identity Toolkit client authenticated by the project's web API key
pub struct FirebaseAuth {
    api_key: String,
    base_url: String,
    token_url: String,
    client: reqwest::Client,
}

impl FirebaseAuth {
    /// Create a new client for the given web API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            token_url: SECURE_TOKEN_URL.to_string(),
            ..Self::with_base_url(api_key, IDENTITY_TOOLKIT_URL)
        }
    }

    /// Create a client with a custom base URL (for testing).
    /// Token refreshes go to `{base_url}/token`.
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            api_key: api_key.into(),
            token_url: base_url.clone(),
            base_url,
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
        }
    }

    /// POST to an `accounts:*` endpoint and decode the account response
    async fn post<B: Serialize>(&self, method: &str, body: &B) -> Result<AccountResponse, AuthError> {
        let url = format!("{}/accounts:{}", self.base_url, method);
        debug!(method, "identity toolkit request");

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await?;
        decode(response).await
    }

    async fn password_grant(
        &self,
        method: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let body = PasswordRequest {
            email,
            password,
            return_secure_token: true,
        };
        let account = self.post(method, &body).await?;
        Ok(account.into_user(None))
    }
}

/// Decode a success body, or classify the provider's error message
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, AuthError> {
    let status = response.status();
    let text = response.text().await?;

    if status.is_success() {
        return serde_json::from_str(&text)
            .map_err(|e| AuthError::Provider(format!("invalid response: {}", e)));
    }

    let message = serde_json::from_str::<ErrorEnvelope>(&text)
        .map(|env| env.error.message)
        .unwrap_or_else(|_| format!("HTTP {}", status.as_u16()));
    Err(AuthError::classify(&message))
}

/// `now + expires_in`, where the provider sends seconds as a string
fn expiry(expires_in: Option<&str>) -> Option<DateTime<Utc>> {
    let secs = expires_in?.trim().parse::<i64>().ok()?;
    Some(Utc::now() + chrono::Duration::seconds(secs))
}

#[async_trait]
impl AuthClient for FirebaseAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<User, AuthError> {
        self.password_grant("signInWithPassword", email, password).await
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<User, AuthError> {
        self.password_grant("signUp", email, password).await
    }

    async fn update_email(&self, user: &User, new_email: &str) -> Result<User, AuthError> {
        let body = UpdateRequest {
            id_token: &user.id_token,
            email: Some(new_email),
            password: None,
            return_secure_token: true,
        };
        let account = self.post("update", &body).await?;
        Ok(account.into_user(Some(user)))
    }

    async fn update_password(&self, user: &User, new_password: &str) -> Result<User, AuthError> {
        let body = UpdateRequest {
            id_token: &user.id_token,
            email: None,
            password: Some(new_password),
            return_secure_token: true,
        };
        let account = self.post("update", &body).await?;
        Ok(account.into_user(Some(user)))
    }

    async fn refresh(&self, user: &User) -> Result<User, AuthError> {
        let url = format!("{}/token", self.token_url);
        debug!(uid = %user.uid, "refreshing id token");

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", user.refresh_token.as_str()),
            ])
            .send()
            .await?;
        let grant: TokenResponse = decode(response).await?;

        Ok(User {
            uid: grant.user_id,
            email: user.email.clone(),
            expires_at: expiry(grant.expires_in.as_deref()),
            id_token: grant.id_token,
            refresh_token: grant.refresh_token,
        })
    }

    async fn sign_out(&self, _user: &User) -> Result<(), AuthError> {
        // ID tokens are stateless; dropping them locally ends the session.
        Ok(())
    }
}

// =============================================================================
// Request / Response Structures
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateRequest<'a> {
    id_token: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<&'a str>,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<String>,
}

/// Secure Token API answer; snake_case unlike the Identity Toolkit
#[derive(Debug, Deserialize)]
struct TokenResponse {
    id_token: String,
    refresh_token: String,
    user_id: String,
    #[serde(default)]
    expires_in: Option<String>,
}

impl AccountResponse {
    /// Build a user, keeping tokens from `previous` when the response omits them
    fn into_user(self, previous: Option<&User>) -> User {
        let expires_at = match (&self.id_token, previous) {
            (None, Some(previous)) => previous.expires_at,
            _ => expiry(self.expires_in.as_deref()),
        };
        User {
            uid: self.local_id,
            email: self
                .email
                .or_else(|| previous.map(|u| u.email.clone()))
                .unwrap_or_default(),
            id_token: self
                .id_token
                .or_else(|| previous.map(|u| u.id_token.clone()))
                .unwrap_or_default(),
            refresh_token: self
                .refresh_token
                .or_else(|| previous.map(|u| u.refresh_token.clone()))
                .unwrap_or_default(),
            expires_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

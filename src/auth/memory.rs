use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use super::{AuthClient, AuthError};
use crate::models::User;
use crate::validation::{is_valid_email, PASSWORD_MIN_LEN};

#[derive(Debug, Clone)]
struct Account {
    uid: String,
    password: String,
}

/// In-memory identity provider for offline mode and testing.
///
/// Speaks the same error vocabulary as the real provider and hands out
/// tokens that last an hour. Every call is counted so tests can assert that
/// local validation short-circuited.
#[derive(Clone, Debug, Default)]
pub struct MemoryAuth {
    accounts: Arc<Mutex<HashMap<String, Account>>>,
    calls: Arc<Mutex<usize>>,
}

impl MemoryAuth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-register an account
    pub fn with_account(self, email: &str, password: &str) -> Self {
        self.insert(email, password);
        self
    }

    /// Number of provider calls made so far
    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn insert(&self, email: &str, password: &str) {
        let mut accounts = self.accounts.lock().unwrap_or_else(|e| e.into_inner());
        accounts.insert(
            email.to_ascii_lowercase(),
            Account {
                uid: Uuid::new_v4().simple().to_string(),
                password: password.to_string(),
            },
        );
    }

    fn count(&self) {
        *self.calls.lock().unwrap_or_else(|e| e.into_inner()) += 1;
    }

    fn issue(uid: &str, email: &str) -> User {
        User {
            uid: uid.to_string(),
            email: email.to_ascii_lowercase(),
            id_token: Uuid::new_v4().to_string(),
            refresh_token: Uuid::new_v4().to_string(),
            expires_at: Some(Utc::now() + Duration::hours(1)),
        }
    }
}

#[async_trait]
impl AuthClient for MemoryAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<User, AuthError> {
        self.count();
        let accounts = self.accounts.lock().unwrap_or_else(|e| e.into_inner());
        let account = accounts
            .get(&email.to_ascii_lowercase())
            .ok_or(AuthError::UserNotFound)?;
        if account.password != password {
            return Err(AuthError::WrongPassword);
        }
        Ok(Self::issue(&account.uid, email))
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<User, AuthError> {
        self.count();
        if !is_valid_email(email) {
            return Err(AuthError::InvalidEmail);
        }
        if password.chars().count() < PASSWORD_MIN_LEN {
            return Err(AuthError::WeakPassword);
        }
        let mut accounts = self.accounts.lock().unwrap_or_else(|e| e.into_inner());
        match accounts.entry(email.to_ascii_lowercase()) {
            Entry::Occupied(_) => Err(AuthError::EmailAlreadyInUse),
            Entry::Vacant(slot) => {
                let uid = Uuid::new_v4().simple().to_string();
                slot.insert(Account {
                    uid: uid.clone(),
                    password: password.to_string(),
                });
                Ok(Self::issue(&uid, email))
            }
        }
    }

    async fn update_email(&self, user: &User, new_email: &str) -> Result<User, AuthError> {
        self.count();
        if !is_valid_email(new_email) {
            return Err(AuthError::InvalidEmail);
        }
        let mut accounts = self.accounts.lock().unwrap_or_else(|e| e.into_inner());
        let new_key = new_email.to_ascii_lowercase();
        if accounts.contains_key(&new_key) {
            return Err(AuthError::EmailAlreadyInUse);
        }
        let account = accounts
            .remove(&user.email.to_ascii_lowercase())
            .ok_or(AuthError::UserNotFound)?;
        accounts.insert(new_key, account);
        Ok(User {
            email: new_email.to_ascii_lowercase(),
            ..user.clone()
        })
    }

    async fn update_password(&self, user: &User, new_password: &str) -> Result<User, AuthError> {
        self.count();
        if new_password.chars().count() < PASSWORD_MIN_LEN {
            return Err(AuthError::WeakPassword);
        }
        let mut accounts = self.accounts.lock().unwrap_or_else(|e| e.into_inner());
        let account = accounts
            .get_mut(&user.email.to_ascii_lowercase())
            .ok_or(AuthError::UserNotFound)?;
        account.password = new_password.to_string();
        Ok(user.clone())
    }

    async fn refresh(&self, user: &User) -> Result<User, AuthError> {
        self.count();
        let accounts = self.accounts.lock().unwrap_or_else(|e| e.into_inner());
        match accounts.get(&user.email.to_ascii_lowercase()) {
            Some(account) if account.uid == user.uid => Ok(Self::issue(&account.uid, &user.email)),
            _ => Err(AuthError::TokenExpired),
        }
    }

    async fn sign_out(&self, _user: &User) -> Result<(), AuthError> {
        self.count();
        Ok(())
    }
}

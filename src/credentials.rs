//! Credential Store: lowercase username -> (email, password hash).

use chrono::Utc;
use tracing::{debug, info};

use crate::auth::PasswordHasher;
use crate::error::StoreError;
use crate::models::User;
use crate::storage::Keyspace;

pub fn normalize_username(username: &str) -> String {
    username.to_lowercase()
}

#[derive(Clone)]
pub struct CredentialStore<K: Keyspace> {
    users: K,
    hasher: PasswordHasher,
}

impl<K: Keyspace> CredentialStore<K> {
    pub fn new(users: K, hasher: PasswordHasher) -> Self {
        Self { users, hasher }
    }

    /// Create the account. Fails with `AlreadyExists` without touching the
    /// existing record, including when two registrations race.
    pub fn register(&self, username: &str, email: &str, password: &str) -> Result<User, StoreError> {
        let username = normalize_username(username);
        if self.users.get(username.as_bytes())?.is_some() {
            return Err(StoreError::AlreadyExists);
        }

        let user = User {
            username: username.clone(),
            email: email.to_string(),
            password_hash: self.hasher.hash_password(password)?,
            created_at: Utc::now(),
        };
        let record = serde_json::to_vec(&user)?;

        if !self.users.insert_if_absent(username.as_bytes(), record)? {
            return Err(StoreError::AlreadyExists);
        }

        info!(username = %user.username, scheme = %self.hasher.scheme(), "Account created");
        Ok(user)
    }

    pub fn get_user(&self, username: &str) -> Result<Option<User>, StoreError> {
        let username = normalize_username(username);
        match self.users.get(username.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Check a login attempt. Returns the stored user on success.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<User, StoreError> {
        let user = self.get_user(username)?.ok_or(StoreError::UserNotFound)?;

        if !self.hasher.verify_password(password, &user.password_hash)? {
            return Err(StoreError::InvalidPassword);
        }

        debug!(username = %user.username, "Credentials verified");
        Ok(user)
    }
}

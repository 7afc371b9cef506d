use std::sync::Arc;

use anyhow::Context;
use bytes::Bytes;
use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

use crate::auth::repo_types::User;
use crate::storage::StorageClient;

/// Persists the user list and the active-session pointer under namespaced keys.
#[derive(Clone)]
pub struct UserStore {
    storage: Arc<dyn StorageClient>,
    users_key: String,
    session_key: String,
}

impl UserStore {
    pub fn new(storage: Arc<dyn StorageClient>, key_prefix: &str) -> Self {
        Self {
            storage,
            users_key: format!("{}.users", key_prefix),
            session_key: format!("{}.currentUser", key_prefix),
        }
    }

    /// All registered users; missing or unreadable data counts as none.
    pub async fn load_users(&self) -> Vec<User> {
        self.load_json(&self.users_key).await.unwrap_or_default()
    }

    /// Like [`Self::load_users`], but a failed read is an error rather than an
    /// empty list. Callers that rewrite the list must use this one.
    pub async fn try_load_users(&self) -> anyhow::Result<Vec<User>> {
        Ok(self
            .try_load_json(&self.users_key)
            .await?
            .unwrap_or_default())
    }

    pub async fn save_users(&self, users: &[User]) -> anyhow::Result<()> {
        self.save_json(&self.users_key, users).await
    }

    /// Find a user by email, ignoring case.
    pub async fn find_by_email(&self, email: &str) -> Option<User> {
        self.load_users()
            .await
            .into_iter()
            .find(|u| u.has_email(email))
    }

    pub async fn load_current_session(&self) -> Option<User> {
        self.load_json(&self.session_key).await
    }

    pub async fn save_current_session(&self, user: &User) -> anyhow::Result<()> {
        self.save_json(&self.session_key, user).await
    }

    pub async fn clear_current_session(&self) -> anyhow::Result<()> {
        self.storage
            .delete_object(&self.session_key)
            .await
            .context("clear current session")
    }

    async fn load_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.try_load_json(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, key, "read failed; treating as no data");
                None
            }
        }
    }

    // Absent and malformed both come back as Ok(None); only read failures are errors.
    async fn try_load_json<T: DeserializeOwned>(&self, key: &str) -> anyhow::Result<Option<T>> {
        let body = match self
            .storage
            .get_object(key)
            .await
            .with_context(|| format!("read {}", key))?
        {
            Some(body) => body,
            None => return Ok(None),
        };
        match serde_json::from_slice(&body) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(error = %e, key, "malformed stored data; treating as no data");
                Ok(None)
            }
        }
    }

    async fn save_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> anyhow::Result<()> {
        let body = serde_json::to_vec(value).with_context(|| format!("encode {}", key))?;
        self.storage
            .put_object(key, Bytes::from(body))
            .await
            .with_context(|| format!("store {}", key))
    }
}

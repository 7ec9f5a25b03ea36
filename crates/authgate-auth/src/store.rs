//! Credential store seam
//!
//! The authenticator only ever reads through [`CredentialStore`]; the
//! composition root decides what backs it. [`InMemoryCredentialStore`] is
//! the process-local implementation used by the API server and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Role assigned when a record or token carries none
pub const DEFAULT_ROLE: &str = "user";

/// Stored credential for a single user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// Opaque unique identifier (UUID v4 for the in-memory store)
    pub id: String,
    pub username: String,
    /// PHC string produced by [`crate::password::hash_password`]
    pub password_hash: String,
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    DEFAULT_ROLE.to_string()
}

/// Store errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Username '{0}' already exists")]
    DuplicateUsername(String),

    #[error("Credential store unavailable: {0}")]
    Backend(String),
}

/// Lookup and registration of credential records
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Find a record by exact username
    async fn find_by_username(&self, username: &str)
        -> Result<Option<CredentialRecord>, StoreError>;

    /// Insert a new record, failing if the username is taken
    async fn insert(
        &self,
        username: &str,
        password_hash: &str,
        role: &str,
    ) -> Result<CredentialRecord, StoreError>;
}

/// Credential store held in process memory
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    records: RwLock<HashMap<String, CredentialRecord>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<CredentialRecord>, StoreError> {
        Ok(self.records.read().await.get(username).cloned())
    }

    async fn insert(
        &self,
        username: &str,
        password_hash: &str,
        role: &str,
    ) -> Result<CredentialRecord, StoreError> {
        let mut records = self.records.write().await;

        if records.contains_key(username) {
            return Err(StoreError::DuplicateUsername(username.to_string()));
        }

        let record = CredentialRecord {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            role: if role.is_empty() {
                default_role()
            } else {
                role.to_string()
            },
        };
        records.insert(username.to_string(), record.clone());

        Ok(record)
    }
}

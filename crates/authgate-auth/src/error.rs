//! Errors surfaced by identity resolution and authorization

use thiserror::Error;

use crate::password::PasswordError;
use crate::store::StoreError;

/// Authentication and authorization outcomes visible to callers
///
/// Token validation details never reach this type: every failed
/// credential, whatever the scheme, is `Unauthenticated`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid authentication credentials")]
    Unauthenticated,

    #[error("Insufficient permissions")]
    Forbidden,

    #[error("Username '{0}' already exists")]
    DuplicateUsername(String),

    #[error("Credential store error: {0}")]
    Store(String),

    #[error("Password hashing error: {0}")]
    Hashing(String),
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateUsername(username) => AuthError::DuplicateUsername(username),
            StoreError::Backend(message) => AuthError::Store(message),
        }
    }
}

impl From<PasswordError> for AuthError {
    fn from(e: PasswordError) -> Self {
        AuthError::Hashing(e.to_string())
    }
}

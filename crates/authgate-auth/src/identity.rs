//! Resolved principals and access decisions

use serde::{Deserialize, Serialize};

use crate::error::AuthError;
use crate::jwt::JwtClaims;
use crate::store::{CredentialRecord, DEFAULT_ROLE};

/// Principal resolved for a single request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub username: String,
    /// Never empty; falls back to [`DEFAULT_ROLE`]
    pub role: String,
}

impl Identity {
    pub fn new(user_id: String, username: String, role: Option<String>) -> Self {
        let role = role
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_ROLE.to_string());

        Self {
            user_id,
            username,
            role,
        }
    }
}

impl From<JwtClaims> for Identity {
    fn from(claims: JwtClaims) -> Self {
        Self::new(claims.sub, claims.username, claims.role)
    }
}

impl From<CredentialRecord> for Identity {
    fn from(record: CredentialRecord) -> Self {
        Self::new(record.id, record.username, Some(record.role))
    }
}

/// Why access was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DenialReason {
    Unauthenticated,
    Forbidden,
}

/// Outcome of authenticate + authorize for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessDecision {
    pub granted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<DenialReason>,
}

impl AccessDecision {
    pub fn granted() -> Self {
        Self {
            granted: true,
            reason: None,
        }
    }

    pub fn denied(reason: DenialReason) -> Self {
        Self {
            granted: false,
            reason: Some(reason),
        }
    }

    /// Derive the decision from a resolution result
    ///
    /// Only `Forbidden` maps to a forbidden decision; every other error is
    /// an unauthenticated outcome.
    pub fn from_result(result: &Result<Identity, AuthError>) -> Self {
        match result {
            Ok(_) => Self::granted(),
            Err(AuthError::Forbidden) => Self::denied(DenialReason::Forbidden),
            Err(_) => Self::denied(DenialReason::Unauthenticated),
        }
    }
}

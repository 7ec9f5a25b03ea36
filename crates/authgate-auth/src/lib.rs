//! Authentication and authorization core for authgate
//!
//! - [`password`]: Argon2id hashing and verification
//! - [`jwt`]: signed, issuer-bound, time-boxed access tokens
//! - [`store`]: credential store seam and in-memory implementation
//! - [`authenticator`]: token-then-password identity resolution
//! - [`authorizer`]: role allow-lists

pub mod authenticator;
pub mod authorizer;
pub mod error;
pub mod identity;
pub mod jwt;
pub mod password;
pub mod store;

pub use authenticator::{Authenticator, BasicCredentials, PresentedCredentials};
pub use authorizer::{authorize, AllowedRoles};
pub use error::AuthError;
pub use identity::{AccessDecision, DenialReason, Identity};
pub use jwt::{JwtClaims, JwtError, TokenCodec, TokenConfig, DEFAULT_TOKEN_TTL_MINUTES};
pub use password::{hash_password, verify_password, PasswordError};
pub use store::{
    CredentialRecord, CredentialStore, InMemoryCredentialStore, StoreError, DEFAULT_ROLE,
};

// Re-export useful types
pub use async_trait::async_trait;
pub use jsonwebtoken::Algorithm;

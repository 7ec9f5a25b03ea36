//! JWT (JSON Web Token) issuance and validation

use std::fmt;

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Token lifetime used when the caller does not supply one
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 15;

/// Claims that must be present for a token to be considered at all
const REQUIRED_CLAIMS: [&str; 3] = ["sub", "exp", "iss"];

/// Process-wide token settings, immutable once loaded
#[derive(Clone)]
pub struct TokenConfig {
    /// HMAC secret shared by issuer and validator
    pub secret_key: String,
    /// Signing algorithm (HS256, HS384 or HS512)
    pub algorithm: Algorithm,
    /// Expected `iss` claim
    pub issuer: String,
    /// Lifetime of tokens handed out by the login flow
    pub access_token_ttl: Duration,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            secret_key: "your-secret-key-change-in-production".to_string(),
            algorithm: Algorithm::HS256,
            issuer: "http://localhost:8000".to_string(),
            access_token_ttl: Duration::minutes(30),
        }
    }
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret_key", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .field("issuer", &self.issuer)
            .field("access_token_ttl", &self.access_token_ttl)
            .finish()
    }
}

/// JWT claims carried by access tokens
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JwtClaims {
    /// Subject (credential record ID)
    pub sub: String,
    /// Username at issuance time
    #[serde(default)]
    pub username: String,
    /// Issuer
    pub iss: String,
    /// Issued at (timestamp)
    #[serde(default)]
    pub iat: i64,
    /// Expiration time (timestamp)
    pub exp: i64,
    /// Role of the subject, if the issuer recorded one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl JwtClaims {
    /// Build claims valid for `validity` from now
    ///
    /// Fails with [`JwtError::InvalidTtl`] if the expiry is not representable.
    pub fn new(
        user_id: String,
        username: String,
        issuer: String,
        validity: Duration,
    ) -> Result<Self, JwtError> {
        let now = Utc::now();
        let exp = now
            .checked_add_signed(validity)
            .ok_or(JwtError::InvalidTtl)?;

        Ok(Self {
            sub: user_id,
            username,
            iss: issuer,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            role: None,
        })
    }

    pub fn with_role(mut self, role: Option<String>) -> Self {
        self.role = role.filter(|r| !r.is_empty());
        self
    }

    /// A token is live strictly before `exp`
    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.exp
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp())
    }
}

/// JWT errors
///
/// The validation variants are consumed by the authenticator to decide
/// whether to fall back to password credentials; none of them are shown
/// to HTTP callers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum JwtError {
    #[error("Malformed token")]
    Malformed,

    #[error("Invalid token signature")]
    SignatureInvalid,

    #[error("Token expired")]
    Expired,

    #[error("Token missing required claim '{0}'")]
    ClaimsMissing(String),

    #[error("Token issuer mismatch")]
    IssuerMismatch,

    #[error("Token lifetime out of range")]
    InvalidTtl,

    #[error("JWT encoding error: {0}")]
    Encoding(String),

    #[error("Unsupported signing algorithm {0:?}, expected HS256, HS384 or HS512")]
    UnsupportedAlgorithm(Algorithm),
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => JwtError::SignatureInvalid,
            ErrorKind::ExpiredSignature => JwtError::Expired,
            ErrorKind::MissingRequiredClaim(claim) => JwtError::ClaimsMissing(claim.clone()),
            ErrorKind::InvalidIssuer => JwtError::IssuerMismatch,
            _ => JwtError::Malformed,
        }
    }
}

/// Signs and validates access tokens for a single issuer
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    issuer: String,
    validation: Validation,
}

impl TokenCodec {
    /// Create a codec from the token configuration
    ///
    /// Validation checks signature, issuer and the presence of `sub`, `exp`
    /// and `iss`. Expiry is checked by the codec itself with no leeway so
    /// that a token is rejected from the second `exp` is reached.
    pub fn new(config: &TokenConfig) -> Result<Self, JwtError> {
        if !matches!(
            config.algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(JwtError::UnsupportedAlgorithm(config.algorithm));
        }

        let mut validation = Validation::new(config.algorithm);
        validation.set_required_spec_claims(&REQUIRED_CLAIMS);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;

        let secret = config.secret_key.as_bytes();

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm: config.algorithm,
            issuer: config.issuer.clone(),
            validation,
        })
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Issue a signed token for a user
    ///
    /// `ttl` falls back to [`DEFAULT_TOKEN_TTL_MINUTES`] when absent.
    pub fn issue(
        &self,
        user_id: &str,
        username: &str,
        role: Option<&str>,
        ttl: Option<Duration>,
    ) -> Result<String, JwtError> {
        let ttl = ttl.unwrap_or_else(|| Duration::minutes(DEFAULT_TOKEN_TTL_MINUTES));
        let claims = JwtClaims::new(
            user_id.to_string(),
            username.to_string(),
            self.issuer.clone(),
            ttl,
        )?
        .with_role(role.map(str::to_string));

        self.encode(&claims)
    }

    /// Sign an arbitrary claims set with the configured key
    pub fn encode(&self, claims: &JwtClaims) -> Result<String, JwtError> {
        encode(&Header::new(self.algorithm), claims, &self.encoding_key)
            .map_err(|e| JwtError::Encoding(e.to_string()))
    }

    pub fn validate(&self, token: &str) -> Result<JwtClaims, JwtError> {
        self.validate_at(token, Utc::now().timestamp())
    }

    /// Validate a token against an explicit clock (Unix seconds)
    pub fn validate_at(&self, token: &str, now: i64) -> Result<JwtClaims, JwtError> {
        // Decode loosely first so that missing claims surface as
        // MissingRequiredClaim rather than a deserialization error.
        let token_data = decode::<serde_json::Value>(token, &self.decoding_key, &self.validation)?;

        let claims: JwtClaims =
            serde_json::from_value(token_data.claims).map_err(|_| JwtError::Malformed)?;

        if claims.is_expired_at(now) {
            return Err(JwtError::Expired);
        }

        Ok(claims)
    }
}

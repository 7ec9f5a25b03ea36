//! Dual-scheme identity resolution
//!
//! A request may present a bearer token, a username/password pair, both or
//! neither. The token is always tried first; the password pair is only
//! consulted when there is no usable token or the token fails validation.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::authorizer::{authorize, AllowedRoles};
use crate::error::AuthError;
use crate::identity::Identity;
use crate::jwt::TokenCodec;
use crate::password::verify_password;
use crate::store::CredentialStore;

/// Username/password pair presented by a client
#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

impl BasicCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Credentials extracted from a request, independent of transport
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresentedCredentials {
    pub bearer: Option<String>,
    pub basic: Option<BasicCredentials>,
}

impl PresentedCredentials {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_bearer(token: impl Into<String>) -> Self {
        Self::none().with_bearer(token)
    }

    pub fn from_password(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::none().with_basic(BasicCredentials::new(username, password))
    }

    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    pub fn with_basic(mut self, basic: BasicCredentials) -> Self {
        self.basic = Some(basic);
        self
    }

    /// The bearer token, if one was presented and is not blank
    pub fn bearer_token(&self) -> Option<&str> {
        self.bearer
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.bearer_token().is_none() && self.basic.is_none()
    }
}

/// Resolves request identities from tokens or stored credentials
pub struct Authenticator {
    codec: Arc<TokenCodec>,
    store: Arc<dyn CredentialStore>,
}

impl Authenticator {
    pub fn new(codec: Arc<TokenCodec>, store: Arc<dyn CredentialStore>) -> Self {
        Self { codec, store }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// Resolve an identity, token first, then password
    ///
    /// Every failure is reported as [`AuthError::Unauthenticated`] so the
    /// caller cannot tell which scheme was tried or why it failed.
    pub async fn authenticate(
        &self,
        credentials: &PresentedCredentials,
    ) -> Result<Identity, AuthError> {
        if let Some(token) = credentials.bearer_token() {
            match self.codec.validate(token) {
                Ok(claims) => {
                    debug!("Bearer auth: valid token for subject '{}'", claims.sub);
                    return Ok(Identity::from(claims));
                }
                Err(e) => {
                    debug!("Bearer auth: rejected ({})", e);
                }
            }
        }

        if let Some(basic) = &credentials.basic {
            if let Some(identity) = self.verify_basic(basic).await {
                return Ok(identity);
            }
        }

        Err(AuthError::Unauthenticated)
    }

    /// Authenticate, then require one of `allowed` roles
    pub async fn authenticate_with_roles(
        &self,
        credentials: &PresentedCredentials,
        allowed: &AllowedRoles,
    ) -> Result<Identity, AuthError> {
        let identity = self.authenticate(credentials).await?;
        authorize(identity, allowed)
    }

    async fn verify_basic(&self, basic: &BasicCredentials) -> Option<Identity> {
        let record = match self.store.find_by_username(&basic.username).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                debug!("Basic auth: invalid credentials");
                return None;
            }
            Err(e) => {
                warn!("Basic auth: credential lookup failed: {}", e);
                return None;
            }
        };

        let password = basic.password.clone();
        let hash = record.password_hash.clone();
        let verified = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .unwrap_or(false);

        if verified {
            debug!("Basic auth: valid credentials for '{}'", record.username);
            Some(Identity::from(record))
        } else {
            debug!("Basic auth: invalid credentials");
            None
        }
    }
}

//! HTTP credential extraction for authgate
//!
//! Turns request headers into the transport-independent
//! [`PresentedCredentials`] consumed by the authenticator, and parses the
//! optional deployment-platform context headers.
//!
//! # Supported schemes
//!
//! - **Bearer**: `Authorization: Bearer <jwt>` (RFC 6750)
//! - **Basic**: `Authorization: Basic <base64(user:pass)>` (RFC 7617)
//!
//! Every `Authorization` header on the request is inspected, so a client
//! may send one of each. Values that cannot be decoded are ignored as if
//! they were absent.
//!
//! # Usage
//!
//! ```
//! use authgate_http_auth::extract_credentials;
//! use http::{header::AUTHORIZATION, HeaderMap, HeaderValue};
//!
//! let mut headers = HeaderMap::new();
//! headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic YWxpY2U6c2VjcmV0MQ=="));
//!
//! let credentials = extract_credentials(&headers);
//! assert_eq!(credentials.basic.unwrap().username, "alice");
//! assert!(credentials.bearer.is_none());
//! ```

mod basic;
mod bearer;
mod context;

pub use basic::decode_basic;
pub use bearer::extract_bearer;
pub use context::{PlatformContext, LAMBDA_CONTEXT_HEADER, REQUEST_CONTEXT_HEADER};

pub use authgate_auth::{BasicCredentials, PresentedCredentials};

use http::{header::AUTHORIZATION, HeaderMap};
use thiserror::Error;
use tracing::debug;

/// Challenge sent with 401 responses
pub const WWW_AUTHENTICATE_CHALLENGE: &str = "Bearer";

/// Error type for credential decoding
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CredentialsError {
    #[error("Not a {0} credential")]
    WrongScheme(String),

    #[error("Invalid credentials format: {0}")]
    InvalidFormat(String),

    #[error("Decoding error: {0}")]
    DecodingError(String),
}

/// Collect the bearer token and basic credentials from request headers
///
/// The first usable value of each scheme wins.
pub fn extract_credentials(headers: &HeaderMap) -> PresentedCredentials {
    let mut credentials = PresentedCredentials::none();

    for value in headers.get_all(AUTHORIZATION) {
        let Ok(value) = value.to_str() else {
            debug!("Ignoring non-ASCII Authorization header");
            continue;
        };

        if credentials.bearer.is_none() {
            if let Some(token) = extract_bearer(value) {
                credentials.bearer = Some(token);
                continue;
            }
        }

        if credentials.basic.is_none() {
            match decode_basic(value) {
                Ok(basic) => credentials.basic = Some(basic),
                Err(CredentialsError::WrongScheme(_)) => {}
                Err(e) => debug!("Ignoring Basic credentials: {}", e),
            }
        }
    }

    credentials
}

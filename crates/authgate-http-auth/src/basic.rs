//! HTTP Basic credential decoding (RFC 7617)
//!
//! Credentials are transmitted as `username:password` encoded in base64:
//!
//! ```text
//! Authorization: Basic <base64(username:password)>
//! ```
//!
//! Basic authentication should only be used over HTTPS as credentials are
//! transmitted in an easily reversible encoding (not encryption).

use authgate_auth::BasicCredentials;
use base64::Engine;

use crate::CredentialsError;

const PREFIX: &str = "basic ";

/// Decode a username/password pair from an `Authorization` header value
///
/// The password may itself contain `:`; only the first colon separates
/// the two parts.
pub fn decode_basic(auth_header: &str) -> Result<BasicCredentials, CredentialsError> {
    let scheme = auth_header
        .get(..PREFIX.len())
        .ok_or_else(|| CredentialsError::WrongScheme("basic".to_string()))?;
    if !scheme.eq_ignore_ascii_case(PREFIX) {
        return Err(CredentialsError::WrongScheme("basic".to_string()));
    }

    let encoded = auth_header[PREFIX.len()..].trim();
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| CredentialsError::DecodingError(e.to_string()))?;
    let decoded =
        String::from_utf8(decoded).map_err(|e| CredentialsError::DecodingError(e.to_string()))?;

    let (username, password) = decoded
        .split_once(':')
        .ok_or_else(|| CredentialsError::InvalidFormat("missing ':' separator".to_string()))?;

    Ok(BasicCredentials::new(username, password))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_basic_auth_header(username: &str, password: &str) -> String {
        let credentials = format!("{}:{}", username, password);
        let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
        format!("Basic {}", encoded)
    }

    #[test]
    fn test_valid_credentials() {
        let creds = decode_basic(&make_basic_auth_header("alice", "secret1")).unwrap();
        assert_eq!(creds.username, "alice");
        assert_eq!(creds.password, "secret1");
    }

    #[test]
    fn test_password_with_colon() {
        let creds = decode_basic(&make_basic_auth_header("alice", "a:b:c")).unwrap();
        assert_eq!(creds.username, "alice");
        assert_eq!(creds.password, "a:b:c");
    }

    #[test]
    fn test_case_insensitive_scheme() {
        let header = make_basic_auth_header("alice", "pw").replace("Basic", "BASIC");
        assert!(decode_basic(&header).is_ok());
    }

    #[test]
    fn test_wrong_auth_scheme() {
        assert!(matches!(
            decode_basic("Bearer sometoken"),
            Err(CredentialsError::WrongScheme(_))
        ));
        assert!(matches!(
            decode_basic("Bas"),
            Err(CredentialsError::WrongScheme(_))
        ));
    }

    #[test]
    fn test_malformed_base64() {
        assert!(matches!(
            decode_basic("Basic !!!invalid!!!"),
            Err(CredentialsError::DecodingError(_))
        ));
    }

    #[test]
    fn test_missing_separator() {
        let encoded = base64::engine::general_purpose::STANDARD.encode("no-colon-here");
        assert!(matches!(
            decode_basic(&format!("Basic {}", encoded)),
            Err(CredentialsError::InvalidFormat(_))
        ));
    }
}

//! Bearer token extraction (RFC 6750)
//!
//! ```text
//! Authorization: Bearer <token>
//! ```

const PREFIX: &str = "bearer ";

/// Extract a token from an `Authorization` header value
///
/// The scheme name is case-insensitive. A blank token is treated as if no
/// token had been sent.
pub fn extract_bearer(auth_header: &str) -> Option<String> {
    let scheme = auth_header.get(..PREFIX.len())?;
    if !scheme.eq_ignore_ascii_case(PREFIX) {
        return None;
    }

    let token = auth_header[PREFIX.len()..].trim();
    if token.is_empty() {
        return None;
    }

    Some(token.to_string())
}

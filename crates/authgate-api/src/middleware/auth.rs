//! Authentication and role middleware
//!
//! `require_auth` resolves the caller from its `Authorization` headers
//! (bearer token first, then Basic credentials) and injects the resulting
//! [`Identity`] into the request extensions. `require_role` runs after it
//! and checks that identity against an allow-list captured as state.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::{self as axum_middleware, Next},
    response::{IntoResponse, Response},
    Json, Router,
};
use authgate_auth::{authorize, AccessDecision, AllowedRoles, AuthError, Authenticator, Identity};
use authgate_http_auth::{extract_credentials, WWW_AUTHENTICATE_CHALLENGE};
use std::sync::Arc;
use tracing::{debug, error};

use crate::models::ErrorResponse;

/// Map an [`AuthError`] to its HTTP response
///
/// Messages never say which scheme or field was rejected.
pub fn auth_error_response(err: &AuthError) -> Response {
    match err {
        AuthError::Unauthenticated => (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, WWW_AUTHENTICATE_CHALLENGE)],
            Json(ErrorResponse::new(err.to_string(), "UNAUTHENTICATED")),
        )
            .into_response(),
        AuthError::Forbidden => (
            StatusCode::FORBIDDEN,
            Json(ErrorResponse::new(err.to_string(), "FORBIDDEN")),
        )
            .into_response(),
        AuthError::DuplicateUsername(_) => (
            StatusCode::CONFLICT,
            Json(ErrorResponse::new("Username already exists", "USERNAME_EXISTS")),
        )
            .into_response(),
        AuthError::Store(_) | AuthError::Hashing(_) => {
            error!("Internal authentication failure: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Internal server error", "INTERNAL_ERROR")),
            )
                .into_response()
        }
    }
}

/// Authentication middleware
///
/// # Errors
/// Returns 401 Unauthorized with `WWW-Authenticate: Bearer` if neither a
/// valid token nor valid Basic credentials were presented.
pub async fn require_auth(
    State(authenticator): State<Arc<Authenticator>>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let credentials = extract_credentials(request.headers());

    let identity = authenticator
        .authenticate(&credentials)
        .await
        .map_err(|e| auth_error_response(&e))?;

    debug!(
        "Authenticated '{}' for {}",
        identity.username,
        request.uri().path()
    );
    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

/// Role middleware; must be layered inside [`require_auth`]
///
/// A request that reaches this layer without an identity is treated as
/// unauthenticated.
pub async fn require_role(
    State(allowed): State<Arc<AllowedRoles>>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    let identity = request
        .extensions()
        .get::<Identity>()
        .cloned()
        .ok_or_else(|| auth_error_response(&AuthError::Unauthenticated))?;

    let result = authorize(identity, &allowed);
    let decision = AccessDecision::from_result(&result);
    debug!(
        "Role check for {}: granted={} reason={:?}",
        request.uri().path(),
        decision.granted,
        decision.reason
    );
    result.map_err(|e| auth_error_response(&e))?;

    Ok(next.run(request).await)
}

/// Protect every route of `router` with [`require_auth`]
pub fn with_auth(router: Router, authenticator: Arc<Authenticator>) -> Router {
    router.route_layer(axum_middleware::from_fn_with_state(
        authenticator,
        require_auth,
    ))
}

/// Restrict every route of `router` to the given roles
///
/// The router must also be wrapped by [`with_auth`], outside this layer.
pub fn with_roles<I, R>(router: Router, roles: I) -> Router
where
    I: IntoIterator<Item = R>,
    R: Into<String>,
{
    let allowed = Arc::new(AllowedRoles::new(roles));
    router.route_layer(axum_middleware::from_fn_with_state(allowed, require_role))
}

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    Extension, Json,
};
use authgate_auth::{hash_password, AuthError, Identity, PresentedCredentials, DEFAULT_ROLE};
use authgate_http_auth::PlatformContext;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, info};
use validator::Validate;

use crate::models::*;
use crate::AppState;

type ApiError = (StatusCode, Json<ErrorResponse>);

const USERNAME_MIN_CHARS: usize = 3;
const USERNAME_MAX_CHARS: usize = 32;
const PASSWORD_MIN_CHARS: usize = 6;

fn internal_error(context: &str, detail: impl std::fmt::Display) -> ApiError {
    error!("{}: {}", context, detail);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new("Internal server error", "INTERNAL_ERROR")),
    )
}

/// Landing page with request and platform metadata
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Welcome message and request metadata", body = RootResponse)
    ),
    tag = "system"
)]
pub async fn root(headers: HeaderMap) -> Json<RootResponse> {
    let context = PlatformContext::from_headers(&headers);

    let mut echoed = BTreeMap::new();
    for (name, value) in headers.iter() {
        let value = if name == header::AUTHORIZATION || name == header::COOKIE {
            "<redacted>".to_string()
        } else {
            String::from_utf8_lossy(value.as_bytes()).into_owned()
        };
        echoed.insert(name.as_str().to_string(), value);
    }

    Json(RootResponse {
        message: "Welcome to authgate".to_string(),
        headers: echoed,
        root_path: context.stage_prefix(),
        lambda_context: context.lambda_context,
        request_context: context.request_context,
        cognito_identity: context.cognito_identity,
    })
}

/// Health check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(headers: HeaderMap) -> Json<HealthResponse> {
    let context = PlatformContext::from_headers(&headers);

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        function_name: context.function_name().cloned(),
    })
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = UserResponse),
        (status = 400, description = "Invalid username or password", body = ErrorResponse),
        (status = 409, description = "Username already exists", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let username_len = req.username.chars().count();
    if !(USERNAME_MIN_CHARS..=USERNAME_MAX_CHARS).contains(&username_len) {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                format!(
                    "Username must be between {} and {} characters",
                    USERNAME_MIN_CHARS, USERNAME_MAX_CHARS
                ),
                "INVALID_USERNAME",
            )),
        ));
    }

    if req.password.chars().count() < PASSWORD_MIN_CHARS {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                format!(
                    "Password must be at least {} characters",
                    PASSWORD_MIN_CHARS
                ),
                "WEAK_PASSWORD",
            )),
        ));
    }

    let password = req.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| internal_error("Password hashing task failed", e))?
        .map_err(|e| internal_error("Password hashing failed", e))?;

    let record = state
        .authenticator
        .store()
        .insert(&req.username, &password_hash, DEFAULT_ROLE)
        .await
        .map_err(|e| match AuthError::from(e) {
            AuthError::DuplicateUsername(username) => {
                debug!("Registration rejected: '{}' already exists", username);
                (
                    StatusCode::CONFLICT,
                    Json(ErrorResponse::new("Username already exists", "USERNAME_EXISTS")),
                )
            }
            other => internal_error("Failed to store credentials", other),
        })?;

    info!("Registered user '{}'", record.username);

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            username: record.username,
        }),
    ))
}

/// Exchange username and password for an access token
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 401, description = "Incorrect username or password", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let credentials = PresentedCredentials::from_password(req.username, req.password);

    let identity = state
        .authenticator
        .authenticate(&credentials)
        .await
        .map_err(|_| {
            (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::new(
                    "Incorrect username or password",
                    "INVALID_CREDENTIALS",
                )),
            )
        })?;

    let access_token = state
        .authenticator
        .codec()
        .issue(
            &identity.user_id,
            &identity.username,
            Some(&identity.role),
            Some(state.access_token_ttl),
        )
        .map_err(|e| internal_error("Failed to issue access token", e))?;

    debug!("Issued access token for '{}'", identity.username);

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
        user: UserResponse {
            username: identity.username,
        },
    }))
}

/// Current user
#[utoipa::path(
    get,
    path = "/users/me",
    responses(
        (status = 200, description = "Authenticated user", body = UserResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer" = []), ("basic" = [])),
    tag = "users"
)]
pub async fn get_me(Extension(identity): Extension<Identity>) -> Json<UserResponse> {
    Json(UserResponse {
        username: identity.username,
    })
}

/// Route open to any authenticated user
#[utoipa::path(
    get,
    path = "/users/protected",
    responses(
        (status = 200, description = "Greeting", body = MessageResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer" = []), ("basic" = [])),
    tag = "users"
)]
pub async fn protected_route(Extension(identity): Extension<Identity>) -> Json<MessageResponse> {
    Json(MessageResponse {
        message: format!("Hello, {}! This is a protected route", identity.username),
    })
}

/// Admin-only route
#[utoipa::path(
    get,
    path = "/users/admin",
    responses(
        (status = 200, description = "Greeting", body = MessageResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse)
    ),
    security(("bearer" = []), ("basic" = [])),
    tag = "users"
)]
pub async fn admin_route(Extension(identity): Extension<Identity>) -> Json<MessageResponse> {
    Json(MessageResponse {
        message: format!("Hello admin {}!", identity.username),
    })
}

/// Echo a contact form submission
#[utoipa::path(
    post,
    path = "/form/submit",
    request_body = ContactForm,
    responses(
        (status = 200, description = "Submitted form", body = ContactForm),
        (status = 400, description = "Invalid email address", body = ErrorResponse)
    ),
    tag = "form"
)]
pub async fn submit_form(Json(form): Json<ContactForm>) -> Result<Json<ContactForm>, ApiError> {
    if let Err(e) = form.validate() {
        debug!("Contact form rejected: {}", e);
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Invalid email address", "INVALID_EMAIL")),
        ));
    }

    Ok(Json(form))
}

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use utoipa::ToSchema;
use validator::Validate;

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: &str) -> Self {
        Self {
            error: error.into(),
            code: Some(code.to_string()),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Function name reported by the hosting platform, if any
    #[schema(value_type = Option<Object>)]
    pub function_name: Option<Value>,
}

/// Landing page response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RootResponse {
    pub message: String,
    /// Request headers as received (credentials redacted)
    pub headers: BTreeMap<String, String>,
    /// Stage path prefix when served from an API Gateway stage URL
    pub root_path: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub lambda_context: Option<Value>,
    #[schema(value_type = Option<Object>)]
    pub request_context: Option<Value>,
    #[schema(value_type = Option<Object>)]
    pub cognito_identity: Option<Value>,
}

// ============================================================================
// Authentication Models
// ============================================================================

/// User registration request
#[derive(Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    /// Username (3 to 32 characters, must be unique)
    pub username: String,
    /// Password (minimum 6 characters)
    pub password: String,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// User login request
#[derive(Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Public view of a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub username: String,
}

/// Login response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    /// Signed access token
    pub access_token: String,
    /// Always "bearer"
    pub token_type: String,
    /// Logged in user
    pub user: UserResponse,
}

/// Plain message response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

// ============================================================================
// Form Models
// ============================================================================

/// Contact form submission
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct ContactForm {
    pub name: String,
    /// Must be a well-formed email address
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[serde(default)]
    pub age: Option<i64>,
    #[serde(default)]
    pub message: String,
}

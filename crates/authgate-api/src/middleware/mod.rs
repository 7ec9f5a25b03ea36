//! API Middleware
//!
//! Middleware layers for authentication and role-based authorization.

pub mod auth;

pub use auth::{auth_error_response, require_auth, require_role, with_auth, with_roles};

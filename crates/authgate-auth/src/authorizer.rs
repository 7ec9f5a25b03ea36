//! Role-based authorization

use std::collections::HashSet;

use tracing::debug;

use crate::error::AuthError;
use crate::identity::Identity;

/// Set of roles permitted on a route
///
/// Membership is exact and case-sensitive; roles do not inherit from one
/// another.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedRoles {
    roles: HashSet<String>,
}

impl AllowedRoles {
    /// Build an allow-list
    ///
    /// # Example
    /// ```
    /// use authgate_auth::AllowedRoles;
    ///
    /// let roles = AllowedRoles::new(["admin", "user"]);
    /// assert!(roles.contains("admin"));
    /// assert!(!roles.contains("Admin"));
    /// ```
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.roles.iter().map(String::as_str)
    }
}

/// Check a resolved identity against an allow-list
///
/// Returns the identity unchanged when its role is allowed.
pub fn authorize(identity: Identity, allowed: &AllowedRoles) -> Result<Identity, AuthError> {
    if allowed.contains(&identity.role) {
        Ok(identity)
    } else {
        debug!(
            "Role check: '{}' with role '{}' denied",
            identity.username, identity.role
        );
        Err(AuthError::Forbidden)
    }
}

//! Session-related types for staff authentication.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use stockroom_core::{Permission, UserId};

use super::user::User;

/// Session-stored identity of the logged-in user.
///
/// Permissions are resolved from group memberships at login and refreshed
/// from the database on every request (see `middleware::refresh`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub username: String,
    pub name: String,
    pub email: String,
    pub is_superuser: bool,
    pub permissions: BTreeSet<Permission>,
}

impl CurrentUser {
    #[must_use]
    pub fn new(user: &User, permissions: BTreeSet<Permission>) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            name: user.display_name(),
            email: user.email.clone(),
            is_superuser: user.is_superuser,
            permissions,
        }
    }

    /// Superusers hold every permission.
    #[must_use]
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.is_superuser || self.permissions.contains(&permission)
    }
}

/// Session keys for authentication data.
pub mod session_keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for pending flash messages.
    pub const FLASH: &str = "flash";
}

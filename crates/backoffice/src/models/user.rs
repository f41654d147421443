//! Staff account domain types.

use chrono::{DateTime, Utc};

use stockroom_core::{GroupId, UserId};

/// A staff account.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    /// May be empty for accounts created without one.
    pub email: String,
    pub is_superuser: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// "First Last", falling back to the username.
    #[must_use]
    pub fn display_name(&self) -> String {
        let name = format!("{} {}", self.first_name, self.last_name);
        let name = name.trim();
        if name.is_empty() {
            self.username.clone()
        } else {
            name.to_string()
        }
    }
}

/// A permission group.
#[derive(Debug, Clone)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
}

/// Input for creating an account. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub is_superuser: bool,
}

/// Editable account fields.
#[derive(Debug, Clone)]
pub struct UserChanges {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(first: &str, last: &str) -> User {
        User {
            id: UserId::new(1),
            username: "clerk".to_string(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: String::new(),
            is_superuser: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_display_name() {
        assert_eq!(user("Ada", "Lovelace").display_name(), "Ada Lovelace");
        assert_eq!(user("Ada", "").display_name(), "Ada");
        assert_eq!(user("", "").display_name(), "clerk");
    }
}

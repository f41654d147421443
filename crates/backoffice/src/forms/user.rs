//! Staff account forms (add and edit).

use serde::Deserialize;

use stockroom_core::{Email, GroupId};

use super::{FieldErrors, max_length, required};
use crate::models::{User, UserChanges};

pub const USERNAME_TAKEN_MESSAGE: &str = "A user with that username already exists.";

/// Whether the form sets a password.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserFormMode {
    Add,
    Edit,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserForm {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub group: String,
}

/// Validated account fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInput {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: Email,
    /// Set only when adding.
    pub password: Option<String>,
    pub group_id: GroupId,
}

impl UserInput {
    #[must_use]
    pub fn changes(&self) -> UserChanges {
        UserChanges {
            username: self.username.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.to_string(),
        }
    }
}

impl UserForm {
    /// Prefill from an existing account.
    #[must_use]
    pub fn from_user(user: &User, group: Option<GroupId>) -> Self {
        Self {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            group: group.map(|g| g.to_string()).unwrap_or_default(),
            ..Self::default()
        }
    }

    /// Validate against the groups that exist.
    ///
    /// # Errors
    ///
    /// Returns field errors for blank or malformed values, an unknown
    /// group, or (when adding) passwords that differ.
    pub fn validate(&self, mode: UserFormMode, groups: &[GroupId]) -> Result<UserInput, FieldErrors> {
        let mut errors = FieldErrors::new();

        let first_name = required(&mut errors, "first_name", &self.first_name, "first name is required");
        if let Some(value) = first_name {
            max_length(&mut errors, "first_name", value, 100);
        }
        let last_name = required(&mut errors, "last_name", &self.last_name, "last name is required");
        if let Some(value) = last_name {
            max_length(&mut errors, "last_name", value, 100);
        }
        let username = required(&mut errors, "username", &self.username, "username is required");
        if let Some(value) = username {
            max_length(&mut errors, "username", value, 150);
        }

        let email = required(&mut errors, "email", &self.email, "email is required").and_then(
            |raw| match Email::parse(raw) {
                Ok(email) => Some(email),
                Err(_) => {
                    errors.add("email", "Enter a valid email address.");
                    None
                }
            },
        );

        let password = match mode {
            UserFormMode::Add => self.check_passwords(&mut errors),
            UserFormMode::Edit => None,
        };

        let group_id = required(&mut errors, "group", &self.group, "Group is required").and_then(
            |raw| match raw.parse::<GroupId>() {
                Ok(id) if groups.contains(&id) => Some(id),
                _ => {
                    errors.add(
                        "group",
                        "Select a valid choice. That choice is not one of the available choices.",
                    );
                    None
                }
            },
        );

        match (first_name, last_name, username, email, group_id) {
            (Some(first_name), Some(last_name), Some(username), Some(email), Some(group_id))
                if errors.is_empty() =>
            {
                Ok(UserInput {
                    first_name: first_name.to_string(),
                    last_name: last_name.to_string(),
                    username: username.to_string(),
                    email,
                    password,
                    group_id,
                })
            }
            _ => Err(errors),
        }
    }

    fn check_passwords(&self, errors: &mut FieldErrors) -> Option<String> {
        if self.password.is_empty() {
            errors.add("password", "password is required");
        }
        if self.confirm_password.is_empty() {
            errors.add("confirm_password", "confirm password is required");
        }
        if self.password.is_empty() || self.confirm_password.is_empty() {
            return None;
        }

        max_length(errors, "password", &self.password, 50);
        if self.password != self.confirm_password {
            errors.add("password", "passwords not equals");
            return None;
        }
        Some(self.password.clone())
    }

    /// Errors shown when the username is already in use.
    #[must_use]
    pub fn username_taken() -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.add("username", USERNAME_TAKEN_MESSAGE);
        errors
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn groups() -> Vec<GroupId> {
        vec![GroupId::new(1), GroupId::new(2)]
    }

    fn valid() -> UserForm {
        UserForm {
            first_name: "Sam".to_string(),
            last_name: "Lee".to_string(),
            username: "slee".to_string(),
            email: "sam@example.com".to_string(),
            password: "hunter22".to_string(),
            confirm_password: "hunter22".to_string(),
            group: "2".to_string(),
        }
    }

    #[test]
    fn test_add_user() {
        let input = valid().validate(UserFormMode::Add, &groups()).unwrap();
        assert_eq!(input.password.as_deref(), Some("hunter22"));
        assert_eq!(input.group_id, GroupId::new(2));
        assert_eq!(input.changes().email, "sam@example.com");
    }

    #[test]
    fn test_passwords_must_match() {
        let form = UserForm {
            confirm_password: "hunter23".to_string(),
            ..valid()
        };
        let errors = form.validate(UserFormMode::Add, &groups()).unwrap_err();
        assert_eq!(errors.get("password"), Some("passwords not equals"));
    }

    #[test]
    fn test_add_requires_every_field() {
        let errors = UserForm::default()
            .validate(UserFormMode::Add, &groups())
            .unwrap_err();
        for (field, message) in [
            ("first_name", "first name is required"),
            ("last_name", "last name is required"),
            ("username", "username is required"),
            ("email", "email is required"),
            ("password", "password is required"),
            ("confirm_password", "confirm password is required"),
            ("group", "Group is required"),
        ] {
            assert_eq!(errors.get(field), Some(message), "{field}");
        }
    }

    #[test]
    fn test_edit_ignores_passwords() {
        let form = UserForm {
            password: String::new(),
            confirm_password: String::new(),
            ..valid()
        };
        let input = form.validate(UserFormMode::Edit, &groups()).unwrap();
        assert!(input.password.is_none());
    }

    #[test]
    fn test_unknown_group() {
        let form = UserForm {
            group: "9".to_string(),
            ..valid()
        };
        assert!(form.validate(UserFormMode::Edit, &groups()).unwrap_err().has("group"));
    }
}

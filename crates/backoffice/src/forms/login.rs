//! Login form.

use serde::Deserialize;

use super::{FieldErrors, required};

pub const INVALID_CREDENTIALS_MESSAGE: &str = "username or password incorrect";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl LoginForm {
    /// Check both fields are present.
    ///
    /// # Errors
    ///
    /// Returns the field errors for any blank field.
    pub fn validate(&self) -> Result<(&str, &str), FieldErrors> {
        let mut errors = FieldErrors::new();
        let username = required(&mut errors, "username", &self.username, "username is required");
        // Passwords are taken as typed.
        if self.password.is_empty() {
            errors.add("password", "password is required");
        }

        match username {
            Some(username) if errors.is_empty() => Ok((username, self.password.as_str())),
            _ => Err(errors),
        }
    }

    /// Errors shown when the credentials are rejected.
    #[must_use]
    pub fn invalid_credentials() -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.add("username", INVALID_CREDENTIALS_MESSAGE);
        errors
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_both_fields_required() {
        let errors = LoginForm::default().validate().unwrap_err();
        assert_eq!(errors.get("username"), Some("username is required"));
        assert_eq!(errors.get("password"), Some("password is required"));
    }

    #[test]
    fn test_valid_login() {
        let form = LoginForm {
            username: " clerk ".to_string(),
            password: " secret ".to_string(),
        };
        assert_eq!(form.validate(), Ok(("clerk", " secret ")));
    }

    #[test]
    fn test_invalid_credentials_message() {
        assert_eq!(
            LoginForm::invalid_credentials().get("username"),
            Some("username or password incorrect")
        );
    }
}

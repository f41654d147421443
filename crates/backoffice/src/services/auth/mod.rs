//! Authentication service.
//!
//! Password login against Argon2id hashes and account creation. Permissions
//! are resolved from the account's groups once, at login.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use stockroom_core::GroupId;

use crate::db::{RepositoryError, UserRepository};
use crate::models::{CurrentUser, NewUser, User};

/// Profile fields and plaintext password for a new account.
#[derive(Debug, Clone)]
pub struct Registration<'a> {
    pub username: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub is_superuser: bool,
    pub group_id: Option<GroupId>,
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Check a username and password and build the session identity.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown username or a
    /// wrong password alike.
    pub async fn login(&self, username: &str, password: &str) -> Result<CurrentUser, AuthError> {
        let Some((user, hash)) = self.users.get_password_hash(username).await? else {
            return Err(AuthError::InvalidCredentials);
        };

        verify_password(password, &hash)?;

        let permissions = self.users.permissions(user.id).await?;
        tracing::info!(user_id = %user.id, username = %user.username, "User logged in");
        Ok(CurrentUser::new(&user, permissions))
    }

    /// Create an account with a hashed password, optionally in a group.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword` for an empty password and
    /// `AuthError::UserAlreadyExists` if the username is taken.
    pub async fn register(&self, registration: &Registration<'_>) -> Result<User, AuthError> {
        validate_password(registration.password)?;
        let password_hash = hash_password(registration.password)?;

        let new_user = NewUser {
            username: registration.username.to_string(),
            first_name: registration.first_name.to_string(),
            last_name: registration.last_name.to_string(),
            email: registration.email.to_string(),
            password_hash,
            is_superuser: registration.is_superuser,
        };

        let user = self.users.create(&new_user).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
            other => AuthError::Repository(other),
        })?;

        if let Some(group_id) = registration.group_id {
            self.users.set_group(user.id, group_id).await?;
        }

        tracing::info!(user_id = %user.id, username = %user.username, "User created");
        Ok(user)
    }
}

/// Validate password requirements.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if the password is empty.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.is_empty() {
        return Err(AuthError::WeakPassword("password is required".to_string()));
    }

    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` on mismatch or a malformed hash.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        assert_ne!(hash_password("same").unwrap(), hash_password("same").unwrap());
    }

    #[test]
    fn test_malformed_hash_is_invalid_credentials() {
        assert!(matches!(
            verify_password("anything", "not-a-hash"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_empty_password_rejected() {
        assert!(validate_password("").is_err());
        assert!(validate_password("x").is_ok());
    }
}

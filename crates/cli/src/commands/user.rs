//! Staff account creation.
//!
//! The back office has no sign-up page, so the first superuser comes from
//! here. The password is read from `STOCKROOM_NEW_USER_PASSWORD`, or from
//! the first line of stdin when that variable is unset.

use std::io::BufRead;

use tracing::info;

use stockroom_backoffice::db::GroupRepository;
use stockroom_backoffice::services::AuthService;
use stockroom_backoffice::services::auth::{AuthError, Registration};

pub struct NewAccount<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub superuser: bool,
    pub group: Option<&'a str>,
}

/// Create a staff account.
///
/// # Errors
///
/// Returns an error if no password is supplied, the database is
/// unreachable, the group does not exist, or registration is rejected.
pub async fn create(account: &NewAccount<'_>) -> Result<(), Box<dyn std::error::Error>> {
    let password = read_password()?;
    let pool = super::connect().await?;

    let group_id = match account.group {
        Some(name) => {
            let group = GroupRepository::new(&pool)
                .get_by_name(name)
                .await?
                .ok_or_else(|| AuthError::GroupNotFound(name.to_string()))?;
            Some(group.id)
        }
        None => None,
    };

    let registration = Registration {
        username: account.username,
        first_name: account.first_name,
        last_name: account.last_name,
        email: account.email,
        password: &password,
        is_superuser: account.superuser,
        group_id,
    };

    let user = AuthService::new(&pool).register(&registration).await?;
    info!(
        user_id = %user.id,
        username = %user.username,
        superuser = account.superuser,
        "User created"
    );
    Ok(())
}

fn read_password() -> Result<String, Box<dyn std::error::Error>> {
    if let Ok(password) = std::env::var("STOCKROOM_NEW_USER_PASSWORD") {
        return Ok(password);
    }

    info!("Reading password from stdin");
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        return Err("no password given".into());
    }
    Ok(password)
}

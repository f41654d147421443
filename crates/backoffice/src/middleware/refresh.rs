//! Keep the session's user in step with the database.
//!
//! The session holds a snapshot taken at login. Before each request the
//! account is read again: a deleted account ends the session, and changed
//! group permissions or profile fields replace the snapshot.

use std::collections::BTreeSet;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tower_sessions::Session;

use stockroom_core::Permission;

use crate::db::UserRepository;
use crate::models::{CurrentUser, User, session_keys};
use crate::state::AppState;

/// What to do with the session's snapshot.
#[derive(Debug, PartialEq, Eq)]
pub enum Refresh {
    Keep,
    Replace(CurrentUser),
    End,
}

/// Compare the snapshot with the account as it is now.
#[must_use]
pub fn reconcile(snapshot: &CurrentUser, account: Option<(User, BTreeSet<Permission>)>) -> Refresh {
    let Some((user, permissions)) = account else {
        return Refresh::End;
    };
    let current = CurrentUser::new(&user, permissions);
    if current == *snapshot {
        Refresh::Keep
    } else {
        Refresh::Replace(current)
    }
}

/// Static files and media never need the account.
fn skips(path: &str) -> bool {
    path == "/health"
        || path.starts_with("/health/")
        || path.starts_with("/static/")
        || path.starts_with("/media/")
}

async fn load(
    repo: &UserRepository<'_>,
    snapshot: &CurrentUser,
) -> Result<Option<(User, BTreeSet<Permission>)>, crate::db::RepositoryError> {
    let Some(user) = repo.get_by_id(snapshot.id).await? else {
        return Ok(None);
    };
    let permissions = repo.permissions(user.id).await?;
    Ok(Some((user, permissions)))
}

/// Reload the logged-in account before the handler runs.
///
/// Database errors keep the snapshot.
pub async fn refresh_current_user(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if skips(request.uri().path()) {
        return next.run(request).await;
    }
    let Some(session) = request.extensions().get::<Session>().cloned() else {
        return next.run(request).await;
    };
    let Ok(Some(snapshot)) = session.get::<CurrentUser>(session_keys::CURRENT_USER).await else {
        return next.run(request).await;
    };

    let repo = UserRepository::new(state.pool());
    match load(&repo, &snapshot).await {
        Ok(account) => match reconcile(&snapshot, account) {
            Refresh::Keep => {}
            Refresh::Replace(current) => {
                tracing::debug!(user_id = %current.id, "Session user refreshed");
                if let Err(e) = session.insert(session_keys::CURRENT_USER, current).await {
                    tracing::warn!("Failed to refresh session user: {e}");
                }
            }
            Refresh::End => {
                tracing::info!(user_id = %snapshot.id, "Account removed, ending session");
                if let Err(e) = session.flush().await {
                    tracing::warn!("Failed to end session: {e}");
                }
            }
        },
        Err(e) => tracing::warn!(user_id = %snapshot.id, "Could not reload session user: {e}"),
    }

    next.run(request).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use stockroom_core::UserId;

    use super::*;

    fn account(first_name: &str) -> User {
        User {
            id: UserId::new(5),
            username: "sam".to_string(),
            first_name: first_name.to_string(),
            last_name: "Vimes".to_string(),
            email: "sam@example.com".to_string(),
            is_superuser: false,
            created_at: Utc::now(),
        }
    }

    fn perms(list: &[Permission]) -> BTreeSet<Permission> {
        list.iter().copied().collect()
    }

    #[test]
    fn test_deleted_account_ends_session() {
        let snapshot = CurrentUser::new(&account("Sam"), perms(&[Permission::ViewUser]));
        assert_eq!(reconcile(&snapshot, None), Refresh::End);
    }

    #[test]
    fn test_revoked_permission_replaces_snapshot() {
        let snapshot = CurrentUser::new(
            &account("Sam"),
            perms(&[Permission::ViewUser, Permission::DeleteUser]),
        );

        let Refresh::Replace(current) =
            reconcile(&snapshot, Some((account("Sam"), perms(&[Permission::ViewUser]))))
        else {
            panic!("expected the snapshot to be replaced");
        };
        assert!(!current.has_permission(Permission::DeleteUser));
        assert!(current.has_permission(Permission::ViewUser));
    }

    #[test]
    fn test_unchanged_account_keeps_snapshot() {
        let snapshot = CurrentUser::new(&account("Sam"), perms(&[Permission::ViewUser]));
        assert_eq!(
            reconcile(&snapshot, Some((account("Sam"), perms(&[Permission::ViewUser])))),
            Refresh::Keep
        );
    }

    #[test]
    fn test_static_paths_skip_the_lookup() {
        assert!(skips("/static/app.css"));
        assert!(skips("/media/products/1.png"));
        assert!(skips("/health/ready"));
        assert!(!skips("/users"));
    }
}

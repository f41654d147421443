//! Authentication and permission extractors.
//!
//! Every back office page except login requires a logged-in user, and most
//! also require one permission. Failures never produce an error status:
//! the user gets a flash warning and a redirect.

use std::marker::PhantomData;

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use stockroom_core::Permission;

use super::flash;
use crate::models::{CurrentUser, session_keys};

pub const LOGIN_REQUIRED_MESSAGE: &str = "sorry ! you must be logged in to access page";
pub const PERMISSION_DENIED_MESSAGE: &str = "sorry ! you cannot access to previous page";

/// Why a protected page was refused.
#[derive(Debug)]
pub enum AuthRejection {
    /// Not logged in: back to the login page.
    RedirectToLogin,
    /// Logged in without the permission: back to the dashboard.
    RedirectToDashboard,
    /// The session layer is missing; a router wiring bug.
    MissingSession,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/login").into_response(),
            Self::RedirectToDashboard => Redirect::to("/").into_response(),
            Self::MissingSession => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

async fn current_user(parts: &Parts) -> Result<(Session, Option<CurrentUser>), AuthRejection> {
    let session = parts
        .extensions
        .get::<Session>()
        .cloned()
        .ok_or(AuthRejection::MissingSession)?;

    let user = session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten();

    Ok((session, user))
}

async fn warn(session: &Session, text: &str) {
    if let Err(e) = flash::warning(session, text).await {
        tracing::warn!("Failed to store flash message: {e}");
    }
}

/// Extractor that requires a logged-in user.
pub struct RequireUser(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match current_user(parts).await? {
            (_, Some(user)) => Ok(Self(user)),
            (session, None) => {
                warn(&session, LOGIN_REQUIRED_MESSAGE).await;
                Err(AuthRejection::RedirectToLogin)
            }
        }
    }
}

/// Extractor that optionally gets the current user.
pub struct OptionalUser(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match current_user(parts).await {
            Ok((_, user)) => user,
            Err(_) => None,
        };

        Ok(Self(user))
    }
}

/// A type standing for one [`Permission`], for use with [`RequirePermission`].
pub trait PermissionMarker: Send + Sync {
    const PERMISSION: Permission;
}

/// Extractor that requires a logged-in user holding `P::PERMISSION`.
///
/// ```rust,ignore
/// async fn list(RequirePermission(user, ..): RequirePermission<perm::ViewProduct>) { .. }
/// ```
pub struct RequirePermission<P: PermissionMarker>(pub CurrentUser, pub PhantomData<P>);

impl<S, P> FromRequestParts<S> for RequirePermission<P>
where
    S: Send + Sync,
    P: PermissionMarker,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let (session, user) = current_user(parts).await?;

        let Some(user) = user else {
            warn(&session, LOGIN_REQUIRED_MESSAGE).await;
            return Err(AuthRejection::RedirectToLogin);
        };

        if !user.has_permission(P::PERMISSION) {
            tracing::info!(
                user_id = %user.id,
                permission = %P::PERMISSION,
                path = %parts.uri.path(),
                "Permission denied"
            );
            warn(&session, PERMISSION_DENIED_MESSAGE).await;
            return Err(AuthRejection::RedirectToDashboard);
        }

        Ok(Self(user, PhantomData))
    }
}

/// Permission markers, one per codename.
pub mod perm {
    use stockroom_core::Permission;

    use super::PermissionMarker;

    macro_rules! markers {
        ($($name:ident),* $(,)?) => {
            $(
                pub struct $name;

                impl PermissionMarker for $name {
                    const PERMISSION: Permission = Permission::$name;
                }
            )*
        };
    }

    markers!(
        ViewProduct,
        AddProduct,
        ChangeProduct,
        DeleteProduct,
        UpdateStock,
        ViewCategory,
        AddCategory,
        ChangeCategory,
        DeleteCategory,
        ViewSupplier,
        AddSupplier,
        ChangeSupplier,
        DeleteSupplier,
        ViewUser,
        AddUser,
        ChangeUser,
        DeleteUser,
    );
}

/// Helper to set the current user in the session.
///
/// The session id is rotated first so a pre-login id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Helper to end the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be deleted.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use axum::http::Request;
    use stockroom_core::UserId;
    use tower_sessions::MemoryStore;

    use super::*;

    fn user(permissions: &[Permission]) -> CurrentUser {
        CurrentUser {
            id: UserId::new(3),
            username: "clerk".to_string(),
            name: "Clerk".to_string(),
            email: String::new(),
            is_superuser: false,
            permissions: permissions.iter().copied().collect::<BTreeSet<_>>(),
        }
    }

    async fn parts_with(user: Option<&CurrentUser>) -> (Parts, Session) {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        if let Some(user) = user {
            session
                .insert(session_keys::CURRENT_USER, user)
                .await
                .unwrap();
        }
        let (mut parts, ()) = Request::builder()
            .uri("/products")
            .body(())
            .unwrap()
            .into_parts();
        parts.extensions.insert(session.clone());
        (parts, session)
    }

    #[tokio::test]
    async fn test_anonymous_is_sent_to_login_with_notice() {
        let (mut parts, session) = parts_with(None).await;

        let result = RequireUser::from_request_parts(&mut parts, &()).await;

        assert!(matches!(result, Err(AuthRejection::RedirectToLogin)));
        let messages = flash::take(&session).await;
        assert_eq!(messages[0].text, LOGIN_REQUIRED_MESSAGE);
    }

    #[tokio::test]
    async fn test_missing_permission_redirects_home() {
        let (mut parts, session) = parts_with(Some(&user(&[Permission::ViewProduct]))).await;

        let result =
            RequirePermission::<perm::DeleteProduct>::from_request_parts(&mut parts, &()).await;

        assert!(matches!(result, Err(AuthRejection::RedirectToDashboard)));
        assert_eq!(flash::take(&session).await[0].text, PERMISSION_DENIED_MESSAGE);
    }

    #[tokio::test]
    async fn test_permission_granted() {
        let (mut parts, _session) = parts_with(Some(&user(&[Permission::ViewProduct]))).await;

        let RequirePermission(current, _) =
            RequirePermission::<perm::ViewProduct>::from_request_parts(&mut parts, &())
                .await
                .unwrap();

        assert_eq!(current.username, "clerk");
    }

    #[tokio::test]
    async fn test_rejection_targets() {
        let login = AuthRejection::RedirectToLogin.into_response();
        assert_eq!(login.headers()["location"], "/login");
        let home = AuthRejection::RedirectToDashboard.into_response();
        assert_eq!(home.headers()["location"], "/");
    }

    #[test]
    fn test_markers_match_codenames() {
        assert_eq!(perm::UpdateStock::PERMISSION.codename(), "update_stock");
        assert_eq!(perm::ViewUser::PERMISSION, Permission::ViewUser);
    }
}

//! Staff account route handlers.
//!
//! Superusers are created from the CLI and are out of reach of these pages.
//! Staff cannot delete their own account.

use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use tower_sessions::Session;
use tracing::instrument;

use stockroom_core::{GroupId, UserId};

use crate::components::pagination::search_suffix;
use crate::db::{GroupRepository, RepositoryError, UserRepository};
use crate::error::AppError;
use crate::filters;
use crate::forms::{FieldErrors, UserForm, UserFormMode};
use crate::middleware::{RequirePermission, flash, perm};
use crate::models::{CurrentUser, Group, User};
use crate::routes::{ListQuery, PageContext, PagerView, done, missing, render};
use crate::services::auth::Registration;
use crate::services::{AuthError, AuthService};
use crate::state::AppState;

/// An option in the group select.
#[derive(Debug, Clone)]
pub struct GroupChoice {
    pub id: GroupId,
    pub name: String,
    pub selected: bool,
}

#[derive(Template)]
#[template(path = "users/list.html")]
struct UserListTemplate {
    ctx: PageContext,
    term: String,
    rows: Vec<User>,
    pager: PagerView,
}

#[derive(Template)]
#[template(path = "users/form.html")]
struct UserFormTemplate {
    ctx: PageContext,
    heading: &'static str,
    action: String,
    /// Password fields are only shown when adding.
    with_password: bool,
    form: UserForm,
    errors: FieldErrors,
    groups: Vec<GroupChoice>,
}

impl UserFormTemplate {
    async fn new(
        session: &Session,
        user: &CurrentUser,
        mode: UserFormMode,
        action: String,
        form: UserForm,
        errors: FieldErrors,
        groups: &[Group],
    ) -> Self {
        Self {
            ctx: PageContext::new(session, user, "/users").await,
            heading: match mode {
                UserFormMode::Add => "Add user",
                UserFormMode::Edit => "Edit user",
            },
            action,
            with_password: mode == UserFormMode::Add,
            groups: group_choices(groups, &form),
            form,
            errors,
        }
    }
}

/// Build the users router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list))
        .route("/users/add", get(add_page).post(add))
        .route("/users/{id}/edit", get(edit_page).post(edit))
        .route("/users/{id}/delete", post(delete))
}

/// Staff listing with first-name search.
///
/// GET /users
#[instrument(skip_all)]
async fn list(
    State(state): State<AppState>,
    session: Session,
    RequirePermission(user, ..): RequirePermission<perm::ViewUser>,
    Query(query): Query<ListQuery>,
) -> Result<Response, AppError> {
    let term = query.searchuser.clone().unwrap_or_default();
    let page = UserRepository::new(state.pool())
        .search_page(&term, query.page())
        .await?;
    let pager = PagerView::new(&page, search_suffix("searchuser", &term));

    Ok(render(&UserListTemplate {
        ctx: PageContext::new(&session, &user, "/users").await,
        term,
        rows: page.items,
        pager,
    }))
}

/// GET /users/add
#[instrument(skip_all)]
async fn add_page(
    State(state): State<AppState>,
    session: Session,
    RequirePermission(user, ..): RequirePermission<perm::AddUser>,
) -> Result<Response, AppError> {
    let groups = GroupRepository::new(state.pool()).list_all().await?;
    let template = UserFormTemplate::new(
        &session,
        &user,
        UserFormMode::Add,
        "/users/add".to_string(),
        UserForm::default(),
        FieldErrors::new(),
        &groups,
    )
    .await;
    Ok(render(&template))
}

/// Create a staff account in the chosen group.
///
/// POST /users/add
#[instrument(skip_all)]
async fn add(
    State(state): State<AppState>,
    session: Session,
    RequirePermission(user, ..): RequirePermission<perm::AddUser>,
    Form(form): Form<UserForm>,
) -> Result<Response, AppError> {
    let groups = GroupRepository::new(state.pool()).list_all().await?;
    let group_ids: Vec<GroupId> = groups.iter().map(|g| g.id).collect();

    let errors = match form.validate(UserFormMode::Add, &group_ids) {
        Ok(input) => {
            let email = input.email.to_string();
            let registration = Registration {
                username: &input.username,
                first_name: &input.first_name,
                last_name: &input.last_name,
                email: &email,
                password: input.password.as_deref().unwrap_or_default(),
                is_superuser: false,
                group_id: Some(input.group_id),
            };

            match AuthService::new(state.pool()).register(&registration).await {
                Ok(created) => {
                    tracing::info!(user_id = %created.id, "User added");
                    return done(&session, "User added successfully !", "/users").await;
                }
                Err(AuthError::UserAlreadyExists) => UserForm::username_taken(),
                Err(AuthError::WeakPassword(message)) => {
                    let mut errors = FieldErrors::new();
                    errors.add("password", message);
                    errors
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(errors) => errors,
    };

    let template = UserFormTemplate::new(
        &session,
        &user,
        UserFormMode::Add,
        "/users/add".to_string(),
        form,
        errors,
        &groups,
    )
    .await;
    Ok(render(&template))
}

/// GET /users/{id}/edit
#[instrument(skip_all, fields(user_id = %id))]
async fn edit_page(
    State(state): State<AppState>,
    session: Session,
    RequirePermission(user, ..): RequirePermission<perm::ChangeUser>,
    Path(id): Path<UserId>,
) -> Result<Response, AppError> {
    let repo = UserRepository::new(state.pool());
    let Some(account) = repo.get_staff_by_id(id).await? else {
        return missing(&session, "user").await;
    };
    let group = repo.group_of(id).await?;
    let groups = GroupRepository::new(state.pool()).list_all().await?;

    let template = UserFormTemplate::new(
        &session,
        &user,
        UserFormMode::Edit,
        format!("/users/{id}/edit"),
        UserForm::from_user(&account, group),
        FieldErrors::new(),
        &groups,
    )
    .await;
    Ok(render(&template))
}

/// Update profile fields and group membership.
///
/// POST /users/{id}/edit
#[instrument(skip_all, fields(user_id = %id))]
async fn edit(
    State(state): State<AppState>,
    session: Session,
    RequirePermission(user, ..): RequirePermission<perm::ChangeUser>,
    Path(id): Path<UserId>,
    Form(form): Form<UserForm>,
) -> Result<Response, AppError> {
    let repo = UserRepository::new(state.pool());
    if repo.get_staff_by_id(id).await?.is_none() {
        return missing(&session, "user").await;
    }

    let groups = GroupRepository::new(state.pool()).list_all().await?;
    let group_ids: Vec<GroupId> = groups.iter().map(|g| g.id).collect();

    let errors = match form.validate(UserFormMode::Edit, &group_ids) {
        Ok(input) => match repo.update_staff(id, &input.changes()).await {
            Ok(_) => {
                repo.set_group(id, input.group_id).await?;
                tracing::info!(user_id = %id, "User updated");
                return done(&session, "User updated successfully !", "/users").await;
            }
            Err(RepositoryError::Conflict(_)) => UserForm::username_taken(),
            Err(RepositoryError::NotFound) => return missing(&session, "user").await,
            Err(e) => return Err(e.into()),
        },
        Err(errors) => errors,
    };

    let template = UserFormTemplate::new(
        &session,
        &user,
        UserFormMode::Edit,
        format!("/users/{id}/edit"),
        form,
        errors,
        &groups,
    )
    .await;
    Ok(render(&template))
}

/// POST /users/{id}/delete
#[instrument(skip_all, fields(user_id = %id))]
async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequirePermission(user, ..): RequirePermission<perm::DeleteUser>,
    Path(id): Path<UserId>,
) -> Result<Response, AppError> {
    if is_own_account(&user, id) {
        flash::warning(&session, OWN_ACCOUNT_MESSAGE).await?;
        return Ok(Redirect::to("/users").into_response());
    }
    if !UserRepository::new(state.pool()).delete_staff(id).await? {
        return missing(&session, "user").await;
    }

    tracing::info!(user_id = %id, "User deleted");
    done(&session, "User deleted successfully !", "/users").await
}

const OWN_ACCOUNT_MESSAGE: &str = "You cannot delete your own account";

fn is_own_account(user: &CurrentUser, id: UserId) -> bool {
    user.id == id
}

fn group_choices(groups: &[Group], form: &UserForm) -> Vec<GroupChoice> {
    groups
        .iter()
        .map(|g| GroupChoice {
            id: g.id,
            name: g.name.clone(),
            selected: form.group.trim() == g.id.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_choices_mark_selected_group() {
        let groups = vec![
            Group {
                id: GroupId::new(1),
                name: "Clerks".to_string(),
            },
            Group {
                id: GroupId::new(2),
                name: "Managers".to_string(),
            },
        ];
        let form = UserForm {
            group: "1".to_string(),
            ..UserForm::default()
        };

        let choices = group_choices(&groups, &form);
        assert!(choices[0].selected);
        assert!(!choices[1].selected);
    }

    #[test]
    fn test_own_account_is_detected() {
        let user = CurrentUser {
            id: UserId::new(4),
            username: "manager".to_string(),
            name: "Staff Manager".to_string(),
            email: String::new(),
            is_superuser: false,
            permissions: std::collections::BTreeSet::new(),
        };

        assert!(is_own_account(&user, UserId::new(4)));
        assert!(!is_own_account(&user, UserId::new(5)));
    }
}

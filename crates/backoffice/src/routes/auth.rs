//! Login and logout.
//!
//! A successful login also runs the expiry scan, so administrators hear
//! about products nearing their expiry date at least once per login.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::State,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::forms::{FieldErrors, LoginForm};
use crate::middleware::{FlashMessage, OptionalUser, clear_current_user, flash, set_current_user};
use crate::services::{AuthError, AuthService, monitor};
use crate::state::AppState;

#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
struct LoginTemplate {
    username: String,
    errors: FieldErrors,
    messages: Vec<FlashMessage>,
}

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_page).post(login))
        .route("/logout", get(logout).post(logout))
}

/// Render the login page.
///
/// GET /login
#[instrument(skip_all)]
async fn login_page(session: Session, OptionalUser(user): OptionalUser) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }

    LoginTemplate {
        username: String::new(),
        errors: FieldErrors::new(),
        messages: flash::take(&session).await,
    }
    .into_response()
}

/// Check credentials, start the session and run the expiry scan.
///
/// POST /login
#[instrument(skip_all, fields(username = %form.username))]
async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let (username, password) = match form.validate() {
        Ok(credentials) => credentials,
        Err(errors) => return Ok(login_failed(&session, &form, errors).await),
    };

    let user = match AuthService::new(state.pool()).login(username, password).await {
        Ok(user) => user,
        Err(AuthError::InvalidCredentials) => {
            tracing::info!("Rejected login attempt");
            return Ok(login_failed(&session, &form, LoginForm::invalid_credentials()).await);
        }
        Err(e) => return Err(e.into()),
    };

    set_current_user(&session, &user).await?;
    set_sentry_user(user.id.as_i32(), &user.username);

    let today = chrono::Utc::now().date_naive();
    if let Err(e) = monitor::run_expiry_scan(state.pool(), state.email(), today).await {
        tracing::error!("Expiry scan failed: {e}");
    }

    Ok(Redirect::to("/").into_response())
}

async fn login_failed(session: &Session, form: &LoginForm, errors: FieldErrors) -> Response {
    LoginTemplate {
        username: form.username.clone(),
        errors,
        messages: flash::take(session).await,
    }
    .into_response()
}

/// End the session.
///
/// GET|POST /logout
#[instrument(skip_all)]
async fn logout(session: Session) -> impl IntoResponse {
    if let Err(e) = clear_current_user(&session).await {
        tracing::warn!("Failed to clear session: {e}");
    }
    clear_sentry_user();

    Redirect::to("/login")
}

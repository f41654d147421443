//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /login, POST /login             - Login (runs the expiry scan)
//! GET  /logout, POST /logout           - Logout
//! GET  /                               - Dashboard
//!
//! GET  /products                       - Product listing (?search=&page=)
//! GET  /products/add, POST             - Add product
//! GET  /products/{id}/edit, POST       - Edit product
//! GET  /products/{id}/update_stock, POST - Stock update (low-stock alert)
//! POST /products/{id}/delete           - Delete product and image
//! GET  /products/{id}/suppliers        - Suppliers of a product
//! GET  /products/export                - CSV export
//! GET  /products/import, POST          - CSV import
//!
//! GET  /categories                     - Category listing (?searchcategory=)
//! GET  /categories/add, POST           - Add category
//! GET  /categories/{id}/edit, POST     - Edit category
//! POST /categories/{id}/delete         - Delete category and its products
//!
//! GET  /suppliers                      - Supplier listing (?searchsupplier=)
//! GET  /suppliers/add, POST            - Add supplier
//! GET  /suppliers/{id}/edit, POST      - Edit supplier
//! POST /suppliers/{id}/delete          - Delete supplier and logo
//! GET  /suppliers/{id}/products        - Products of a supplier
//!
//! GET  /users                          - Staff listing (?searchuser=)
//! GET  /users/add, POST                - Add staff account
//! GET  /users/{id}/edit, POST          - Edit staff account
//! POST /users/{id}/delete              - Delete staff account
//! ```

use std::collections::BTreeSet;

use askama::Template;
use axum::Router;
use axum::response::{Html, IntoResponse, Redirect, Response};
use serde::Deserialize;
use tower_sessions::Session;

use stockroom_core::Permission;

use crate::components::Page;
use crate::error::AppError;
use crate::forms::UploadedFile;
use crate::middleware::{FlashMessage, flash};
use crate::models::CurrentUser;
use crate::services::MediaKind;
use crate::state::AppState;

pub mod auth;
pub mod categories;
pub mod csv;
pub mod dashboard;
pub mod products;
pub mod suppliers;
pub mod users;

/// Build the application router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(dashboard::router())
        .merge(csv::router())
        .merge(products::router())
        .merge(categories::router())
        .merge(suppliers::router())
        .merge(users::router())
}

/// The logged-in user as the layout needs it.
#[derive(Debug, Clone)]
pub struct UserView {
    pub name: String,
    pub username: String,
    pub is_superuser: bool,
    permissions: BTreeSet<Permission>,
}

impl UserView {
    /// Whether the user holds the permission with this codename.
    ///
    /// Usage in templates: `{% if ctx.user.can("add_product") %}`
    #[must_use]
    pub fn can(&self, codename: &str) -> bool {
        self.is_superuser
            || codename
                .parse::<Permission>()
                .is_ok_and(|p| self.permissions.contains(&p))
    }
}

impl From<&CurrentUser> for UserView {
    fn from(user: &CurrentUser) -> Self {
        Self {
            name: user.name.clone(),
            username: user.username.clone(),
            is_superuser: user.is_superuser,
            permissions: user.permissions.clone(),
        }
    }
}

/// Everything the base layout renders around a page.
#[derive(Debug, Clone)]
pub struct PageContext {
    pub user: UserView,
    pub messages: Vec<FlashMessage>,
    pub current_path: &'static str,
}

impl PageContext {
    /// Build the context, consuming pending flash messages.
    pub async fn new(session: &Session, user: &CurrentUser, current_path: &'static str) -> Self {
        Self {
            user: UserView::from(user),
            messages: flash::take(session).await,
            current_path,
        }
    }
}

/// Pagination links for a listing page.
#[derive(Debug, Clone)]
pub struct PagerView {
    pub number: i64,
    pub num_pages: i64,
    pub total: i64,
    pub previous: Option<i64>,
    pub next: Option<i64>,
    /// Query-string tail that keeps the search term, e.g. `&search=milk`.
    pub query_suffix: String,
}

impl PagerView {
    #[must_use]
    pub fn new<T>(page: &Page<T>, query_suffix: String) -> Self {
        Self {
            number: page.number(),
            num_pages: page.num_pages(),
            total: page.total(),
            previous: page.has_previous().then(|| page.previous_page_number()),
            next: page.has_next().then(|| page.next_page_number()),
            query_suffix,
        }
    }

    #[must_use]
    pub const fn has_other_pages(&self) -> bool {
        self.previous.is_some() || self.next.is_some()
    }
}

/// Query parameters shared by listing pages.
///
/// Each listing reads its search term from its own parameter name.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<String>,
    pub search: Option<String>,
    pub searchcategory: Option<String>,
    pub searchsupplier: Option<String>,
    pub searchuser: Option<String>,
}

impl ListQuery {
    #[must_use]
    pub fn page(&self) -> Option<&str> {
        self.page.as_deref()
    }
}

/// Render a page template, logging failures.
pub fn render(template: &impl Template) -> Response {
    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {}", e);
        "Internal Server Error".to_string()
    }))
    .into_response()
}

/// Flash "does not exist" for `entity` and go back to the dashboard.
///
/// # Errors
///
/// Returns `AppError` if the flash message cannot be stored.
pub async fn missing(session: &Session, entity: &str) -> Result<Response, AppError> {
    flash::warning(session, format!("sorry ! the entered {entity} does not exist")).await?;
    Ok(Redirect::to("/").into_response())
}

/// Flash a success notice and redirect.
///
/// # Errors
///
/// Returns `AppError` if the flash message cannot be stored.
pub async fn done(session: &Session, message: &str, to: &str) -> Result<Response, AppError> {
    flash::success(session, message).await?;
    Ok(Redirect::to(to).into_response())
}

/// Store an optional upload, returning its media path.
///
/// # Errors
///
/// Returns `AppError::Media` if the file cannot be written.
pub async fn store_upload(
    state: &AppState,
    kind: MediaKind,
    upload: Option<UploadedFile>,
) -> Result<Option<String>, AppError> {
    let Some(file) = upload else {
        return Ok(None);
    };
    let path = state.media().save(kind, &file.file_name, &file.bytes).await?;
    Ok(Some(path))
}

/// The stored file a freshly saved upload replaces, if any.
pub fn superseded<'a>(current: &'a str, stored: Option<&str>) -> Option<&'a str> {
    stored.filter(|path| *path != current).map(|_| current)
}

#[cfg(test)]
mod tests {
    use stockroom_core::UserId;

    use super::*;
    use crate::components::PageWindow;

    fn current(is_superuser: bool, permissions: &[Permission]) -> CurrentUser {
        CurrentUser {
            id: UserId::new(1),
            username: "clerk".to_string(),
            name: "Clerk Kent".to_string(),
            email: String::new(),
            is_superuser,
            permissions: permissions.iter().copied().collect(),
        }
    }

    #[test]
    fn test_user_view_can() {
        let view = UserView::from(&current(false, &[Permission::ViewProduct]));
        assert!(view.can("view_product"));
        assert!(!view.can("delete_product"));
        assert!(!view.can("not_a_codename"));

        let admin = UserView::from(&current(true, &[]));
        assert!(admin.can("delete_user"));
    }

    #[test]
    fn test_pager_view() {
        let page: Page<()> = Page::new(Vec::new(), PageWindow::resolve(Some("2"), 35), 35);
        let pager = PagerView::new(&page, "&search=milk".to_string());
        assert_eq!(pager.number, 2);
        assert_eq!(pager.num_pages, 4);
        assert_eq!(pager.previous, Some(1));
        assert_eq!(pager.next, Some(3));
        assert!(pager.has_other_pages());

        let single: Page<()> = Page::new(Vec::new(), PageWindow::resolve(None, 0), 0);
        assert!(!PagerView::new(&single, String::new()).has_other_pages());
    }

    #[test]
    fn test_superseded_only_after_a_new_upload() {
        assert_eq!(
            superseded("images/old.jpg", Some("images/new.jpg")),
            Some("images/old.jpg")
        );
        assert_eq!(superseded("images/old.jpg", None), None);
        assert_eq!(superseded("images/old.jpg", Some("images/old.jpg")), None);
    }
}

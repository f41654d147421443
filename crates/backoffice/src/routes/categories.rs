//! Category route handlers.

use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::Response,
    routing::{get, post},
};
use tower_sessions::Session;
use tracing::instrument;

use stockroom_core::CategoryId;

use crate::components::pagination::search_suffix;
use crate::db::{CategoryRepository, RepositoryError};
use crate::error::AppError;
use crate::filters;
use crate::forms::{CategoryForm, FieldErrors};
use crate::middleware::{RequirePermission, perm};
use crate::models::Category;
use crate::routes::{ListQuery, PageContext, PagerView, done, missing, render};
use crate::state::AppState;

#[derive(Template)]
#[template(path = "categories/list.html")]
struct CategoryListTemplate {
    ctx: PageContext,
    term: String,
    rows: Vec<Category>,
    pager: PagerView,
}

#[derive(Template)]
#[template(path = "categories/form.html")]
struct CategoryFormTemplate {
    ctx: PageContext,
    heading: &'static str,
    action: String,
    category_title: String,
    errors: FieldErrors,
}

/// Build the categories router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list))
        .route("/categories/add", get(add_page).post(add))
        .route("/categories/{id}/edit", get(edit_page).post(edit))
        .route("/categories/{id}/delete", post(delete))
}

/// Category listing with title search.
///
/// GET /categories
#[instrument(skip_all)]
async fn list(
    State(state): State<AppState>,
    session: Session,
    RequirePermission(user, ..): RequirePermission<perm::ViewCategory>,
    Query(query): Query<ListQuery>,
) -> Result<Response, AppError> {
    let term = query.searchcategory.clone().unwrap_or_default();
    let page = CategoryRepository::new(state.pool())
        .search_page(&term, query.page())
        .await?;
    let pager = PagerView::new(&page, search_suffix("searchcategory", &term));

    Ok(render(&CategoryListTemplate {
        ctx: PageContext::new(&session, &user, "/categories").await,
        term,
        rows: page.items,
        pager,
    }))
}

/// GET /categories/add
#[instrument(skip_all)]
async fn add_page(
    session: Session,
    RequirePermission(user, ..): RequirePermission<perm::AddCategory>,
) -> Response {
    render(&CategoryFormTemplate {
        ctx: PageContext::new(&session, &user, "/categories").await,
        heading: "Add category",
        action: "/categories/add".to_string(),
        category_title: String::new(),
        errors: FieldErrors::new(),
    })
}

/// POST /categories/add
#[instrument(skip_all)]
async fn add(
    State(state): State<AppState>,
    session: Session,
    RequirePermission(user, ..): RequirePermission<perm::AddCategory>,
    Form(form): Form<CategoryForm>,
) -> Result<Response, AppError> {
    let title = match form.validate() {
        Ok(title) => title,
        Err(errors) => {
            return Ok(render(&CategoryFormTemplate {
                ctx: PageContext::new(&session, &user, "/categories").await,
                heading: "Add category",
                action: "/categories/add".to_string(),
                category_title: form.category_title,
                errors,
            }));
        }
    };

    let category = CategoryRepository::new(state.pool()).create(&title).await?;

    tracing::info!(category_id = %category.id, "Category added");
    done(&session, "category added successfully !", "/categories").await
}

/// GET /categories/{id}/edit
#[instrument(skip_all, fields(category_id = %id))]
async fn edit_page(
    State(state): State<AppState>,
    session: Session,
    RequirePermission(user, ..): RequirePermission<perm::ChangeCategory>,
    Path(id): Path<CategoryId>,
) -> Result<Response, AppError> {
    let Some(category) = CategoryRepository::new(state.pool()).get_by_id(id).await? else {
        return missing(&session, "category").await;
    };

    Ok(render(&CategoryFormTemplate {
        ctx: PageContext::new(&session, &user, "/categories").await,
        heading: "Edit category",
        action: format!("/categories/{id}/edit"),
        category_title: category.title,
        errors: FieldErrors::new(),
    }))
}

/// POST /categories/{id}/edit
#[instrument(skip_all, fields(category_id = %id))]
async fn edit(
    State(state): State<AppState>,
    session: Session,
    RequirePermission(user, ..): RequirePermission<perm::ChangeCategory>,
    Path(id): Path<CategoryId>,
    Form(form): Form<CategoryForm>,
) -> Result<Response, AppError> {
    let repo = CategoryRepository::new(state.pool());
    if repo.get_by_id(id).await?.is_none() {
        return missing(&session, "category").await;
    }

    let title = match form.validate() {
        Ok(title) => title,
        Err(errors) => {
            return Ok(render(&CategoryFormTemplate {
                ctx: PageContext::new(&session, &user, "/categories").await,
                heading: "Edit category",
                action: format!("/categories/{id}/edit"),
                category_title: form.category_title,
                errors,
            }));
        }
    };

    match repo.update(id, &title).await {
        Ok(_) => {}
        Err(RepositoryError::NotFound) => return missing(&session, "category").await,
        Err(e) => return Err(e.into()),
    }

    tracing::info!(category_id = %id, "Category updated");
    done(&session, "category updated successfully !", "/categories").await
}

/// Delete a category together with its products.
///
/// POST /categories/{id}/delete
#[instrument(skip_all, fields(category_id = %id))]
async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequirePermission(..): RequirePermission<perm::DeleteCategory>,
    Path(id): Path<CategoryId>,
) -> Result<Response, AppError> {
    if !CategoryRepository::new(state.pool()).delete(id).await? {
        return missing(&session, "category").await;
    }

    tracing::info!(category_id = %id, "Category deleted");
    done(&session, "category deleted successfully !", "/categories").await
}

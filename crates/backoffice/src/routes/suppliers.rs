//! Supplier route handlers.

use askama::Template;
use axum::{
    Router,
    extract::{Multipart, Path, Query, State},
    response::Response,
    routing::{get, post},
};
use tower_sessions::Session;
use tracing::instrument;

use stockroom_core::SupplierId;

use crate::components::pagination::search_suffix;
use crate::db::{ProductRepository, RepositoryError, SupplierRepository};
use crate::error::AppError;
use crate::filters;
use crate::forms::{FieldErrors, MultipartForm, SupplierForm, SupplierInput};
use crate::middleware::{RequirePermission, perm};
use crate::models::{NewSupplier, SupplierListing};
use crate::routes::products::{ProductListTemplate, product_rows};
use crate::routes::{
    ListQuery, PageContext, PagerView, done, missing, render, store_upload, superseded,
};
use crate::services::MediaKind;
use crate::state::AppState;

/// A supplier row in a listing.
#[derive(Debug, Clone)]
pub struct SupplierRowView {
    pub id: SupplierId,
    pub name: String,
    pub logo: String,
    pub email: String,
    pub website: String,
    pub phone: String,
    pub product_count: i64,
}

impl From<SupplierListing> for SupplierRowView {
    fn from(listing: SupplierListing) -> Self {
        let supplier = listing.supplier;
        Self {
            id: supplier.id,
            name: supplier.name,
            logo: supplier.logo,
            email: supplier.email.into_inner(),
            website: supplier.website,
            phone: supplier.phone,
            product_count: listing.product_count,
        }
    }
}

/// Supplier listing, also used for the suppliers of one product.
#[derive(Template)]
#[template(path = "suppliers/list.html")]
pub struct SupplierListTemplate {
    pub ctx: PageContext,
    pub heading: String,
    pub action: String,
    pub term: String,
    pub rows: Vec<SupplierRowView>,
    pub pager: PagerView,
    /// Show the add button.
    pub toolbar: bool,
}

#[derive(Template)]
#[template(path = "suppliers/form.html")]
struct SupplierFormTemplate {
    ctx: PageContext,
    heading: &'static str,
    action: String,
    form: SupplierForm,
    errors: FieldErrors,
    /// Current logo when editing.
    logo: Option<String>,
}

/// Build the suppliers router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/suppliers", get(list))
        .route("/suppliers/add", get(add_page).post(add))
        .route("/suppliers/{id}/edit", get(edit_page).post(edit))
        .route("/suppliers/{id}/delete", post(delete))
        .route("/suppliers/{id}/products", get(products))
}

/// Supplier listing with name search.
///
/// GET /suppliers
#[instrument(skip_all)]
async fn list(
    State(state): State<AppState>,
    session: Session,
    RequirePermission(user, ..): RequirePermission<perm::ViewSupplier>,
    Query(query): Query<ListQuery>,
) -> Result<Response, AppError> {
    let term = query.searchsupplier.clone().unwrap_or_default();
    let page = SupplierRepository::new(state.pool())
        .search_page(&term, query.page())
        .await?;
    let pager = PagerView::new(&page, search_suffix("searchsupplier", &term));

    Ok(render(&SupplierListTemplate {
        ctx: PageContext::new(&session, &user, "/suppliers").await,
        heading: "Suppliers".to_string(),
        action: "/suppliers".to_string(),
        term,
        rows: page.map(SupplierRowView::from).items,
        pager,
        toolbar: true,
    }))
}

/// GET /suppliers/add
#[instrument(skip_all)]
async fn add_page(
    session: Session,
    RequirePermission(user, ..): RequirePermission<perm::AddSupplier>,
) -> Response {
    render(&SupplierFormTemplate {
        ctx: PageContext::new(&session, &user, "/suppliers").await,
        heading: "Add supplier",
        action: "/suppliers/add".to_string(),
        form: SupplierForm::default(),
        errors: FieldErrors::new(),
        logo: None,
    })
}

/// Create a supplier, storing the uploaded logo if any.
///
/// POST /suppliers/add
#[instrument(skip_all)]
async fn add(
    State(state): State<AppState>,
    session: Session,
    RequirePermission(user, ..): RequirePermission<perm::AddSupplier>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let mut submitted = MultipartForm::read(multipart).await?;
    let upload = submitted.take_file("logo");
    let form = SupplierForm::from_multipart(&submitted);

    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            return Ok(render(&SupplierFormTemplate {
                ctx: PageContext::new(&session, &user, "/suppliers").await,
                heading: "Add supplier",
                action: "/suppliers/add".to_string(),
                form,
                errors,
                logo: None,
            }));
        }
    };

    let logo = store_upload(&state, MediaKind::SupplierLogo, upload).await?;
    let supplier = SupplierRepository::new(state.pool())
        .create(&new_supplier(input, logo))
        .await?;

    tracing::info!(supplier_id = %supplier.id, "Supplier added");
    done(&session, "Supplier added successfully !", "/suppliers").await
}

/// GET /suppliers/{id}/edit
#[instrument(skip_all, fields(supplier_id = %id))]
async fn edit_page(
    State(state): State<AppState>,
    session: Session,
    RequirePermission(user, ..): RequirePermission<perm::ChangeSupplier>,
    Path(id): Path<SupplierId>,
) -> Result<Response, AppError> {
    let Some(supplier) = SupplierRepository::new(state.pool()).get_by_id(id).await? else {
        return missing(&session, "supplier").await;
    };

    Ok(render(&SupplierFormTemplate {
        ctx: PageContext::new(&session, &user, "/suppliers").await,
        heading: "Edit supplier",
        action: format!("/suppliers/{id}/edit"),
        form: SupplierForm::from_supplier(&supplier),
        errors: FieldErrors::new(),
        logo: Some(supplier.logo),
    }))
}

/// Update a supplier; a new upload replaces the stored logo.
///
/// POST /suppliers/{id}/edit
#[instrument(skip_all, fields(supplier_id = %id))]
async fn edit(
    State(state): State<AppState>,
    session: Session,
    RequirePermission(user, ..): RequirePermission<perm::ChangeSupplier>,
    Path(id): Path<SupplierId>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let repo = SupplierRepository::new(state.pool());
    let Some(supplier) = repo.get_by_id(id).await? else {
        return missing(&session, "supplier").await;
    };

    let mut submitted = MultipartForm::read(multipart).await?;
    let upload = submitted.take_file("logo");
    let form = SupplierForm::from_multipart(&submitted);

    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            return Ok(render(&SupplierFormTemplate {
                ctx: PageContext::new(&session, &user, "/suppliers").await,
                heading: "Edit supplier",
                action: format!("/suppliers/{id}/edit"),
                form,
                errors,
                logo: Some(supplier.logo),
            }));
        }
    };

    let logo = store_upload(&state, MediaKind::SupplierLogo, upload).await?;

    if let Err(e) = repo.update(id, &new_supplier(input, logo.clone())).await {
        if let Some(path) = &logo {
            state.media().remove_logged(path).await;
        }
        return match e {
            RepositoryError::NotFound => missing(&session, "supplier").await,
            e => Err(e.into()),
        };
    }
    if let Some(old) = superseded(&supplier.logo, logo.as_deref()) {
        state.media().remove_logged(old).await;
    }

    tracing::info!(supplier_id = %id, "Supplier updated");
    done(&session, "Supplier updated successfully !", "/suppliers").await
}

/// Delete a supplier and its stored logo. Linked products stay.
///
/// POST /suppliers/{id}/delete
#[instrument(skip_all, fields(supplier_id = %id))]
async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequirePermission(..): RequirePermission<perm::DeleteSupplier>,
    Path(id): Path<SupplierId>,
) -> Result<Response, AppError> {
    let repo = SupplierRepository::new(state.pool());
    let Some(supplier) = repo.get_by_id(id).await? else {
        return missing(&session, "supplier").await;
    };

    state.media().remove_logged(&supplier.logo).await;
    if !repo.delete(id).await? {
        return missing(&session, "supplier").await;
    }

    tracing::info!(supplier_id = %id, "Supplier deleted");
    done(&session, "Supplier deleted successfully !", "/suppliers").await
}

/// Products of one supplier, with title search.
///
/// GET /suppliers/{id}/products
#[instrument(skip_all, fields(supplier_id = %id))]
async fn products(
    State(state): State<AppState>,
    session: Session,
    RequirePermission(user, ..): RequirePermission<perm::ViewProduct>,
    Path(id): Path<SupplierId>,
    Query(query): Query<ListQuery>,
) -> Result<Response, AppError> {
    let Some(supplier) = SupplierRepository::new(state.pool()).get_by_id(id).await? else {
        return missing(&session, "supplier").await;
    };

    let term = query.search.clone().unwrap_or_default();
    let page = ProductRepository::new(state.pool())
        .for_supplier_page(id, &term, query.page())
        .await?;
    let pager = PagerView::new(&page, search_suffix("search", &term));

    Ok(render(&ProductListTemplate {
        ctx: PageContext::new(&session, &user, "/suppliers").await,
        heading: format!("Products from {}", supplier.name),
        action: format!("/suppliers/{id}/products"),
        term,
        rows: product_rows(page).items,
        pager,
        toolbar: false,
    }))
}

fn new_supplier(input: SupplierInput, logo: Option<String>) -> NewSupplier {
    NewSupplier {
        name: input.name,
        logo,
        email: input.email,
        website: input.website,
        phone: input.phone,
    }
}

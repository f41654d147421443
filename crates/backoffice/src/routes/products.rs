//! Product route handlers.
//!
//! Add and edit are posted as multipart because of the optional image
//! upload; the stock update is a plain form.

use askama::Template;
use axum::{
    Form, Router,
    extract::{Multipart, Path, Query, State},
    response::Response,
    routing::{get, post},
};
use tower_sessions::Session;
use tracing::instrument;

use stockroom_core::{CategoryId, ProductId, SupplierId};

use crate::components::Page;
use crate::components::pagination::search_suffix;
use crate::db::{CategoryRepository, ProductRepository, RepositoryError, SupplierRepository};
use crate::error::AppError;
use crate::filters;
use crate::forms::{FieldErrors, MultipartForm, ProductForm, StockForm};
use crate::middleware::{RequirePermission, perm};
use crate::models::{Category, Product, ProductListing, Supplier};
use crate::routes::suppliers::{SupplierListTemplate, SupplierRowView};
use crate::routes::{
    ListQuery, PageContext, PagerView, done, missing, render, store_upload, superseded,
};
use crate::services::{MediaKind, monitor};
use crate::state::AppState;

/// A product row in a listing.
#[derive(Debug, Clone)]
pub struct ProductRowView {
    pub id: ProductId,
    pub title: String,
    pub image: String,
    pub price: String,
    pub stock: i32,
    pub expire_date: String,
    pub days_to_expire: i64,
    pub category_title: String,
    pub supplier_count: i64,
}

impl ProductRowView {
    fn new(listing: ProductListing, today: chrono::NaiveDate) -> Self {
        let days_to_expire = listing.product.days_to_expire(today);
        let product = listing.product;
        Self {
            id: product.id,
            title: product.title,
            image: product.image,
            price: product.price.to_string(),
            stock: product.stock,
            expire_date: product.expire_date.format("%Y-%m-%d").to_string(),
            days_to_expire,
            category_title: listing.category_title,
            supplier_count: listing.supplier_count,
        }
    }
}

/// Product listing, also used for the products of one supplier.
#[derive(Template)]
#[template(path = "products/list.html")]
pub struct ProductListTemplate {
    pub ctx: PageContext,
    pub heading: String,
    pub action: String,
    pub term: String,
    pub rows: Vec<ProductRowView>,
    pub pager: PagerView,
    /// Show the add/import/export toolbar.
    pub toolbar: bool,
}

/// An option in the category select.
#[derive(Debug, Clone)]
pub struct CategoryChoice {
    pub id: CategoryId,
    pub title: String,
    pub selected: bool,
}

/// A checkbox in the supplier list.
#[derive(Debug, Clone)]
pub struct SupplierChoice {
    pub id: SupplierId,
    pub name: String,
    pub checked: bool,
}

#[derive(Template)]
#[template(path = "products/form.html")]
struct ProductFormTemplate {
    ctx: PageContext,
    heading: &'static str,
    action: String,
    form: ProductForm,
    errors: FieldErrors,
    categories: Vec<CategoryChoice>,
    suppliers: Vec<SupplierChoice>,
    /// Current image when editing.
    image: Option<String>,
}

#[derive(Template)]
#[template(path = "products/update_stock.html")]
struct StockTemplate {
    ctx: PageContext,
    product_id: ProductId,
    title: String,
    stock: String,
    errors: FieldErrors,
}

/// Build the products router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(list))
        .route("/products/add", get(add_page).post(add))
        .route("/products/{id}/edit", get(edit_page).post(edit))
        .route(
            "/products/{id}/update_stock",
            get(update_stock_page).post(update_stock),
        )
        .route("/products/{id}/delete", post(delete))
        .route("/products/{id}/suppliers", get(suppliers))
}

/// Product listing with title search.
///
/// GET /products
#[instrument(skip_all)]
async fn list(
    State(state): State<AppState>,
    session: Session,
    RequirePermission(user, ..): RequirePermission<perm::ViewProduct>,
    Query(query): Query<ListQuery>,
) -> Result<Response, AppError> {
    let term = query.search.clone().unwrap_or_default();
    let page = ProductRepository::new(state.pool())
        .search_page(&term, query.page())
        .await?;

    let pager = PagerView::new(&page, search_suffix("search", &term));

    Ok(render(&ProductListTemplate {
        ctx: PageContext::new(&session, &user, "/products").await,
        heading: "Products".to_string(),
        action: "/products".to_string(),
        term,
        rows: product_rows(page).items,
        pager,
        toolbar: true,
    }))
}

/// Listing rows with days to expiry counted from today.
pub(crate) fn product_rows(page: Page<ProductListing>) -> Page<ProductRowView> {
    let today = chrono::Utc::now().date_naive();
    page.map(|listing| ProductRowView::new(listing, today))
}

/// GET /products/add
#[instrument(skip_all)]
async fn add_page(
    State(state): State<AppState>,
    session: Session,
    RequirePermission(user, ..): RequirePermission<perm::AddProduct>,
) -> Result<Response, AppError> {
    let (categories, suppliers) = choices(&state).await?;
    let form = ProductForm::default();

    Ok(render(&ProductFormTemplate {
        ctx: PageContext::new(&session, &user, "/products").await,
        heading: "Add product",
        action: "/products/add".to_string(),
        categories: category_choices(&categories, &form),
        suppliers: supplier_choices(&suppliers, &form),
        form,
        errors: FieldErrors::new(),
        image: None,
    }))
}

/// Create a product, storing the uploaded image if any.
///
/// POST /products/add
#[instrument(skip_all)]
async fn add(
    State(state): State<AppState>,
    session: Session,
    RequirePermission(user, ..): RequirePermission<perm::AddProduct>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let mut submitted = MultipartForm::read(multipart).await?;
    let upload = submitted.take_file("image");
    let form = ProductForm::from_multipart(&submitted);

    let (categories, suppliers) = choices(&state).await?;
    let input = match form.validate(&ids(&categories, |c| c.id), &ids(&suppliers, |s| s.id)) {
        Ok(input) => input,
        Err(errors) => {
            return Ok(render(&ProductFormTemplate {
                ctx: PageContext::new(&session, &user, "/products").await,
                heading: "Add product",
                action: "/products/add".to_string(),
                categories: category_choices(&categories, &form),
                suppliers: supplier_choices(&suppliers, &form),
                form,
                errors,
                image: None,
            }));
        }
    };

    let image = store_upload(&state, MediaKind::ProductImage, upload).await?;
    let product = ProductRepository::new(state.pool())
        .create(&input.into_new_product(image))
        .await?;

    tracing::info!(product_id = %product.id, "Product added");
    done(&session, "Product added successfully !", "/products").await
}

/// GET /products/{id}/edit
#[instrument(skip_all, fields(product_id = %id))]
async fn edit_page(
    State(state): State<AppState>,
    session: Session,
    RequirePermission(user, ..): RequirePermission<perm::ChangeProduct>,
    Path(id): Path<ProductId>,
) -> Result<Response, AppError> {
    let repo = ProductRepository::new(state.pool());
    let Some(product) = repo.get_by_id(id).await? else {
        return missing(&session, "product").await;
    };
    let linked = repo.supplier_ids(id).await?;
    let (categories, suppliers) = choices(&state).await?;
    let form = ProductForm::from_product(&product, &linked);

    Ok(render(&ProductFormTemplate {
        ctx: PageContext::new(&session, &user, "/products").await,
        heading: "Edit product",
        action: format!("/products/{id}/edit"),
        categories: category_choices(&categories, &form),
        suppliers: supplier_choices(&suppliers, &form),
        form,
        errors: FieldErrors::new(),
        image: Some(product.image),
    }))
}

/// Update a product; a new upload replaces the stored image.
///
/// POST /products/{id}/edit
#[instrument(skip_all, fields(product_id = %id))]
async fn edit(
    State(state): State<AppState>,
    session: Session,
    RequirePermission(user, ..): RequirePermission<perm::ChangeProduct>,
    Path(id): Path<ProductId>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let repo = ProductRepository::new(state.pool());
    let Some(product) = repo.get_by_id(id).await? else {
        return missing(&session, "product").await;
    };

    let mut submitted = MultipartForm::read(multipart).await?;
    let upload = submitted.take_file("image");
    let form = ProductForm::from_multipart(&submitted);

    let (categories, suppliers) = choices(&state).await?;
    let input = match form.validate(&ids(&categories, |c| c.id), &ids(&suppliers, |s| s.id)) {
        Ok(input) => input,
        Err(errors) => {
            return Ok(render(&ProductFormTemplate {
                ctx: PageContext::new(&session, &user, "/products").await,
                heading: "Edit product",
                action: format!("/products/{id}/edit"),
                categories: category_choices(&categories, &form),
                suppliers: supplier_choices(&suppliers, &form),
                form,
                errors,
                image: Some(product.image),
            }));
        }
    };

    let image = store_upload(&state, MediaKind::ProductImage, upload).await?;

    if let Err(e) = repo.update(id, &input.into_new_product(image.clone())).await {
        if let Some(path) = &image {
            state.media().remove_logged(path).await;
        }
        return match e {
            RepositoryError::NotFound => missing(&session, "product").await,
            e => Err(e.into()),
        };
    }
    if let Some(old) = superseded(&product.image, image.as_deref()) {
        state.media().remove_logged(old).await;
    }

    tracing::info!(product_id = %id, "Product updated");
    done(&session, "Product updated successfully !", "/products").await
}

/// GET /products/{id}/update_stock
#[instrument(skip_all, fields(product_id = %id))]
async fn update_stock_page(
    State(state): State<AppState>,
    session: Session,
    RequirePermission(user, ..): RequirePermission<perm::UpdateStock>,
    Path(id): Path<ProductId>,
) -> Result<Response, AppError> {
    let Some(product) = ProductRepository::new(state.pool()).get_by_id(id).await? else {
        return missing(&session, "product").await;
    };

    Ok(render(&StockTemplate {
        ctx: PageContext::new(&session, &user, "/products").await,
        product_id: id,
        stock: product.stock.to_string(),
        title: product.title,
        errors: FieldErrors::new(),
    }))
}

/// Set the stock level and alert administrators when it is low.
///
/// POST /products/{id}/update_stock
#[instrument(skip_all, fields(product_id = %id))]
async fn update_stock(
    State(state): State<AppState>,
    session: Session,
    RequirePermission(user, ..): RequirePermission<perm::UpdateStock>,
    Path(id): Path<ProductId>,
    Form(form): Form<StockForm>,
) -> Result<Response, AppError> {
    let repo = ProductRepository::new(state.pool());
    let Some(product) = repo.get_by_id(id).await? else {
        return missing(&session, "product").await;
    };

    let stock = match form.validate() {
        Ok(stock) => stock,
        Err(errors) => {
            return Ok(render(&StockTemplate {
                ctx: PageContext::new(&session, &user, "/products").await,
                product_id: id,
                title: product.title,
                stock: form.stock,
                errors,
            }));
        }
    };

    let updated: Product = match repo.update_stock(id, stock).await {
        Ok(updated) => updated,
        Err(RepositoryError::NotFound) => return missing(&session, "product").await,
        Err(e) => return Err(e.into()),
    };

    if let Err(e) = monitor::check_low_stock(state.pool(), state.email(), &updated).await {
        tracing::error!(product_id = %id, "Low stock check failed: {e}");
    }

    done(&session, "Product stock updated successfully !", "/products").await
}

/// Delete a product and its stored image.
///
/// POST /products/{id}/delete
#[instrument(skip_all, fields(product_id = %id))]
async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequirePermission(..): RequirePermission<perm::DeleteProduct>,
    Path(id): Path<ProductId>,
) -> Result<Response, AppError> {
    let repo = ProductRepository::new(state.pool());
    let Some(product) = repo.get_by_id(id).await? else {
        return missing(&session, "product").await;
    };

    state.media().remove_logged(&product.image).await;
    if !repo.delete(id).await? {
        return missing(&session, "product").await;
    }

    tracing::info!(product_id = %id, "Product deleted");
    done(&session, "Product deleted successfully !", "/products").await
}

/// Suppliers of one product, with name search.
///
/// GET /products/{id}/suppliers
#[instrument(skip_all, fields(product_id = %id))]
async fn suppliers(
    State(state): State<AppState>,
    session: Session,
    RequirePermission(user, ..): RequirePermission<perm::ViewSupplier>,
    Path(id): Path<ProductId>,
    Query(query): Query<ListQuery>,
) -> Result<Response, AppError> {
    let Some(product) = ProductRepository::new(state.pool()).get_by_id(id).await? else {
        return missing(&session, "product").await;
    };

    let term = query.searchsupplier.clone().unwrap_or_default();
    let page = SupplierRepository::new(state.pool())
        .for_product_page(id, &term, query.page())
        .await?;
    let pager = PagerView::new(&page, search_suffix("searchsupplier", &term));

    Ok(render(&SupplierListTemplate {
        ctx: PageContext::new(&session, &user, "/products").await,
        heading: format!("Suppliers of {}", product.title),
        action: format!("/products/{id}/suppliers"),
        term,
        rows: page.map(SupplierRowView::from).items,
        pager,
        toolbar: false,
    }))
}

async fn choices(state: &AppState) -> Result<(Vec<Category>, Vec<Supplier>), AppError> {
    let categories = CategoryRepository::new(state.pool()).list_all().await?;
    let suppliers = SupplierRepository::new(state.pool()).list_all().await?;
    Ok((categories, suppliers))
}

fn ids<T, I>(items: &[T], id: impl Fn(&T) -> I) -> Vec<I> {
    items.iter().map(id).collect()
}

fn category_choices(categories: &[Category], form: &ProductForm) -> Vec<CategoryChoice> {
    categories
        .iter()
        .map(|c| CategoryChoice {
            id: c.id,
            title: c.title.clone(),
            selected: form.category.trim() == c.id.to_string(),
        })
        .collect()
}

fn supplier_choices(suppliers: &[Supplier], form: &ProductForm) -> Vec<SupplierChoice> {
    suppliers
        .iter()
        .map(|s| SupplierChoice {
            id: s.id,
            name: s.name.clone(),
            checked: form.has_supplier(&s.id),
        })
        .collect()
}

//! Product CSV export and import.

use askama::Template;
use axum::{
    Router,
    body::Body,
    extract::{Multipart, State},
    http::header,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use tower_sessions::Session;
use tracing::instrument;

use crate::db::products::export_rows;
use crate::error::AppError;
use crate::filters;
use crate::forms::{FieldErrors, MultipartForm};
use crate::middleware::{RequirePermission, flash, perm};
use crate::models::CurrentUser;
use crate::routes::{PageContext, done, render};
use crate::services::csv_exchange::{
    EXPORT_FILE_NAME, StoreImportTarget, check_file_name, export_lines, import_products,
};
use crate::state::AppState;

#[derive(Template)]
#[template(path = "products/import.html")]
struct ImportTemplate {
    ctx: PageContext,
    errors: FieldErrors,
}

/// Build the CSV router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products/export", get(export))
        .route("/products/import", get(import_page).post(import))
}

/// Stream every product as CSV.
///
/// GET /products/export
#[instrument(skip_all)]
async fn export(
    State(state): State<AppState>,
    RequirePermission(..): RequirePermission<perm::ViewProduct>,
) -> impl IntoResponse {
    let lines = export_lines(export_rows(state.pool().clone()));

    (
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{EXPORT_FILE_NAME}\""),
            ),
        ],
        Body::from_stream(lines),
    )
}

/// GET /products/import
#[instrument(skip_all)]
async fn import_page(
    session: Session,
    RequirePermission(user, ..): RequirePermission<perm::AddProduct>,
) -> Response {
    import_form(&session, &user, FieldErrors::new()).await
}

/// Create products from an uploaded CSV file.
///
/// POST /products/import
#[instrument(skip_all)]
async fn import(
    State(state): State<AppState>,
    session: Session,
    RequirePermission(user, ..): RequirePermission<perm::AddProduct>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let mut submitted = MultipartForm::read(multipart).await?;
    let Some(upload) = submitted.take_file("csv_file") else {
        let mut errors = FieldErrors::new();
        errors.add("csv_file", "csv file is required");
        return Ok(import_form(&session, &user, errors).await);
    };

    if let Err(e) = check_file_name(&upload.file_name) {
        flash::error(&session, e.to_string()).await?;
        return Ok(Redirect::to("/products/import").into_response());
    }

    let mut target = StoreImportTarget::new(state.pool());
    match import_products(&upload.bytes, &mut target).await {
        Ok(count) => {
            tracing::info!(count, file = %upload.file_name, "Products imported");
            done(
                &session,
                &format!("{count} products imported successfully!"),
                "/products",
            )
            .await
        }
        Err(failure) => {
            tracing::warn!(
                imported = failure.imported,
                file = %upload.file_name,
                "CSV import stopped: {}",
                failure.error
            );
            flash::error(&session, format!("Error importing CSV: {}", failure.error)).await?;
            Ok(import_form(&session, &user, FieldErrors::new()).await)
        }
    }
}

async fn import_form(session: &Session, user: &CurrentUser, errors: FieldErrors) -> Response {
    render(&ImportTemplate {
        ctx: PageContext::new(session, user, "/products").await,
        errors,
    })
}

//! Dashboard route handler.

use askama::Template;
use axum::{Router, extract::State, response::Response, routing::get};
use rust_decimal::Decimal;
use tower_sessions::Session;
use tracing::instrument;

use crate::db::DashboardRepository;
use crate::db::dashboard::{DashboardStats, LowStockProduct, TopSupplier};
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireUser;
use crate::routes::{PageContext, render};
use crate::state::AppState;

/// Rows shown in each dashboard table.
const DASHBOARD_LIST_SIZE: i64 = 5;

/// Dashboard numbers, formatted for display.
#[derive(Debug, Clone)]
pub struct StatsView {
    pub total_products: i64,
    pub in_stock: i64,
    pub low_stock: i64,
    pub out_of_stock: i64,
    pub average_price: String,
    pub average_products_per_supplier: String,
    pub new_suppliers: i64,
    pub suppliers_with_products: i64,
    pub suppliers_without_products: i64,
    pub total_categories: i64,
    pub total_suppliers: i64,
    pub total_users: i64,
}

impl From<DashboardStats> for StatsView {
    fn from(stats: DashboardStats) -> Self {
        Self {
            total_products: stats.total_products,
            in_stock: stats.in_stock,
            low_stock: stats.low_stock,
            out_of_stock: stats.out_of_stock,
            average_price: format_average(stats.average_price),
            average_products_per_supplier: format_average(stats.average_products_per_supplier),
            new_suppliers: stats.new_suppliers,
            suppliers_with_products: stats.suppliers_with_products,
            suppliers_without_products: stats.suppliers_without_products,
            total_categories: stats.total_categories,
            total_suppliers: stats.total_suppliers,
            total_users: stats.total_users,
        }
    }
}

/// Two decimal places, or a dash when there is nothing to average.
fn format_average(value: Option<Decimal>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.round_dp(2).to_string())
}

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate {
    ctx: PageContext,
    stats: StatsView,
    lowest_stock: Vec<LowStockProduct>,
    top_suppliers: Vec<TopSupplier>,
}

/// Build the dashboard router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(dashboard))
}

/// Dashboard page handler.
///
/// GET /
#[instrument(skip_all)]
async fn dashboard(
    State(state): State<AppState>,
    session: Session,
    RequireUser(user): RequireUser,
) -> Result<Response, AppError> {
    let repo = DashboardRepository::new(state.pool());
    let stats = repo.stats().await?;
    let lowest_stock = repo.lowest_stock(DASHBOARD_LIST_SIZE).await?;
    let top_suppliers = repo.top_suppliers(DASHBOARD_LIST_SIZE).await?;

    Ok(render(&DashboardTemplate {
        ctx: PageContext::new(&session, &user, "/").await,
        stats: stats.into(),
        lowest_stock,
        top_suppliers,
    }))
}

//! Aggregate queries for the dashboard.

use rust_decimal::Decimal;
use sqlx::PgPool;

use stockroom_core::{ProductId, SupplierId};

use super::RepositoryError;

/// Headline counts shown on the dashboard.
#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct DashboardStats {
    pub total_products: i64,
    /// Stock above 100.
    pub in_stock: i64,
    /// Stock below 100.
    pub low_stock: i64,
    pub out_of_stock: i64,
    /// Mean of the prices that parse as numbers and fit `Price::MAX_LENGTH`,
    /// so the result always decodes into a `Decimal`.
    pub average_price: Option<Decimal>,
    pub average_products_per_supplier: Option<Decimal>,
    /// Suppliers created in the last 30 days.
    pub new_suppliers: i64,
    pub suppliers_with_products: i64,
    pub suppliers_without_products: i64,
    pub total_categories: i64,
    pub total_suppliers: i64,
    /// Accounts that are not superusers.
    pub total_users: i64,
}

/// A product on the lowest-stock list.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LowStockProduct {
    pub id: ProductId,
    pub title: String,
    pub stock: i32,
}

/// A supplier on the most-products list.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TopSupplier {
    pub id: SupplierId,
    pub name: String,
    pub product_count: i64,
}

const STATS_QUERY: &str = r"
    WITH supplier_counts AS (
        SELECT s.id, s.created_at, COUNT(ps.product_id) AS product_count
        FROM stockroom.supplier s
        LEFT JOIN stockroom.product_supplier ps ON ps.supplier_id = s.id
        GROUP BY s.id, s.created_at
    )
    SELECT
        (SELECT COUNT(*) FROM stockroom.product) AS total_products,
        (SELECT COUNT(*) FROM stockroom.product WHERE stock > 100) AS in_stock,
        (SELECT COUNT(*) FROM stockroom.product WHERE stock < 100) AS low_stock,
        (SELECT COUNT(*) FROM stockroom.product WHERE stock = 0) AS out_of_stock,
        (SELECT ROUND(AVG(BTRIM(price)::NUMERIC), 4)
           FROM stockroom.product
          WHERE BTRIM(price) ~ '^[+-]?([0-9]+\.?[0-9]*|\.[0-9]+)$'
            AND LENGTH(BTRIM(price)) <= 20) AS average_price,
        (SELECT AVG(product_count)::NUMERIC FROM supplier_counts) AS average_products_per_supplier,
        (SELECT COUNT(*) FROM supplier_counts
          WHERE created_at >= NOW() - INTERVAL '30 days') AS new_suppliers,
        (SELECT COUNT(*) FROM supplier_counts WHERE product_count > 0) AS suppliers_with_products,
        (SELECT COUNT(*) FROM supplier_counts WHERE product_count = 0) AS suppliers_without_products,
        (SELECT COUNT(*) FROM stockroom.category) AS total_categories,
        (SELECT COUNT(*) FROM stockroom.supplier) AS total_suppliers,
        (SELECT COUNT(*) FROM stockroom.app_user WHERE NOT is_superuser) AS total_users
";

/// Repository for dashboard aggregates.
pub struct DashboardRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DashboardRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Compute the headline counts in a single round trip.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn stats(&self) -> Result<DashboardStats, RepositoryError> {
        let stats = sqlx::query_as::<_, DashboardStats>(STATS_QUERY)
            .fetch_one(self.pool)
            .await?;

        Ok(stats)
    }

    /// The `limit` products with the least stock.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lowest_stock(&self, limit: i64) -> Result<Vec<LowStockProduct>, RepositoryError> {
        let rows = sqlx::query_as::<_, LowStockProduct>(
            r"
            SELECT id, title, stock
            FROM stockroom.product
            ORDER BY stock, id
            LIMIT $1
            ",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// The `limit` suppliers linked to the most products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn top_suppliers(&self, limit: i64) -> Result<Vec<TopSupplier>, RepositoryError> {
        let rows = sqlx::query_as::<_, TopSupplier>(
            r"
            SELECT s.id, s.name, COUNT(ps.product_id) AS product_count
            FROM stockroom.supplier s
            LEFT JOIN stockroom.product_supplier ps ON ps.supplier_id = s.id
            GROUP BY s.id, s.name
            ORDER BY product_count DESC, s.id
            LIMIT $1
            ",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use stockroom_core::Price;

    use super::*;

    #[test]
    fn test_average_price_ignores_text_longer_than_a_price() {
        let guard = format!("LENGTH(BTRIM(price)) <= {}", Price::MAX_LENGTH);
        assert!(STATS_QUERY.contains(&guard));
    }

    #[test]
    fn test_longest_accepted_price_fits_a_decimal() {
        let widest = "9".repeat(Price::MAX_LENGTH);
        assert!(Price::from_stored(widest).amount().is_some());
        assert!(
            Price::from_stored("1000000000000000000000000000000".to_string())
                .amount()
                .is_none()
        );
    }
}

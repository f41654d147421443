//! Supplier repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use stockroom_core::{Email, ProductId, SupplierId};

use super::{RepositoryError, contains_pattern};
use crate::components::{Page, PageWindow};
use crate::models::{NewSupplier, Supplier, SupplierListing};

#[derive(Debug, sqlx::FromRow)]
struct SupplierRow {
    id: SupplierId,
    name: String,
    logo: String,
    email: Email,
    website: String,
    phone: String,
    created_at: DateTime<Utc>,
}

impl From<SupplierRow> for Supplier {
    fn from(row: SupplierRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            logo: row.logo,
            email: row.email,
            website: row.website,
            phone: row.phone,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SupplierListingRow {
    #[sqlx(flatten)]
    supplier: SupplierRow,
    product_count: i64,
}

impl From<SupplierListingRow> for SupplierListing {
    fn from(row: SupplierListingRow) -> Self {
        Self {
            supplier: row.supplier.into(),
            product_count: row.product_count,
        }
    }
}

const LISTING_COLUMNS: &str = r"
    s.id, s.name, s.logo, s.email, s.website, s.phone, s.created_at,
    (SELECT COUNT(*) FROM stockroom.product_supplier ps WHERE ps.supplier_id = s.id) AS product_count
";

/// Repository for supplier database operations.
pub struct SupplierRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SupplierRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of suppliers whose name contains `term`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn search_page(
        &self,
        term: &str,
        page: Option<&str>,
    ) -> Result<Page<SupplierListing>, RepositoryError> {
        let pattern = contains_pattern(term);

        let total: i64 = sqlx::query_scalar(
            r"SELECT COUNT(*) FROM stockroom.supplier WHERE name LIKE $1 ESCAPE '\'",
        )
        .bind(&pattern)
        .fetch_one(self.pool)
        .await?;

        let window = PageWindow::resolve(page, total);
        let sql = format!(
            r"
            SELECT {LISTING_COLUMNS}
            FROM stockroom.supplier s
            WHERE s.name LIKE $1 ESCAPE '\'
            ORDER BY s.id
            LIMIT $2 OFFSET $3
            "
        );
        let rows = sqlx::query_as::<_, SupplierListingRow>(&sql)
            .bind(&pattern)
            .bind(window.limit())
            .bind(window.offset())
            .fetch_all(self.pool)
            .await?;

        Ok(Page::new(
            rows.into_iter().map(SupplierListing::from).collect(),
            window,
            total,
        ))
    }

    /// One page of the suppliers linked to a product, filtered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn for_product_page(
        &self,
        product_id: ProductId,
        term: &str,
        page: Option<&str>,
    ) -> Result<Page<SupplierListing>, RepositoryError> {
        let pattern = contains_pattern(term);

        let total: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*)
            FROM stockroom.supplier s
            JOIN stockroom.product_supplier link ON link.supplier_id = s.id
            WHERE link.product_id = $1 AND s.name LIKE $2 ESCAPE '\'
            ",
        )
        .bind(product_id)
        .bind(&pattern)
        .fetch_one(self.pool)
        .await?;

        let window = PageWindow::resolve(page, total);
        let sql = format!(
            r"
            SELECT {LISTING_COLUMNS}
            FROM stockroom.supplier s
            JOIN stockroom.product_supplier link ON link.supplier_id = s.id
            WHERE link.product_id = $1 AND s.name LIKE $2 ESCAPE '\'
            ORDER BY s.id
            LIMIT $3 OFFSET $4
            "
        );
        let rows = sqlx::query_as::<_, SupplierListingRow>(&sql)
            .bind(product_id)
            .bind(&pattern)
            .bind(window.limit())
            .bind(window.offset())
            .fetch_all(self.pool)
            .await?;

        Ok(Page::new(
            rows.into_iter().map(SupplierListing::from).collect(),
            window,
            total,
        ))
    }

    /// All suppliers, for form checkboxes.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Supplier>, RepositoryError> {
        let rows = sqlx::query_as::<_, SupplierRow>(
            r"
            SELECT id, name, logo, email, website, phone, created_at
            FROM stockroom.supplier
            ORDER BY name, id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Supplier::from).collect())
    }

    /// Get a supplier by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: SupplierId) -> Result<Option<Supplier>, RepositoryError> {
        let row = sqlx::query_as::<_, SupplierRow>(
            r"
            SELECT id, name, logo, email, website, phone, created_at
            FROM stockroom.supplier
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Supplier::from))
    }

    /// The subset of `ids` that name existing suppliers.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn existing_ids(&self, ids: &[SupplierId]) -> Result<Vec<SupplierId>, RepositoryError> {
        let found = sqlx::query_scalar::<_, SupplierId>(
            "SELECT id FROM stockroom.supplier WHERE id = ANY($1) ORDER BY id",
        )
        .bind(ids)
        .fetch_all(self.pool)
        .await?;

        Ok(found)
    }

    /// Create a supplier. A missing logo falls back to the column default.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, supplier: &NewSupplier) -> Result<Supplier, RepositoryError> {
        let row = sqlx::query_as::<_, SupplierRow>(
            r"
            INSERT INTO stockroom.supplier (name, logo, email, website, phone)
            VALUES ($1, COALESCE($2, 'logos/default.jpg'), $3, $4, $5)
            RETURNING id, name, logo, email, website, phone, created_at
            ",
        )
        .bind(&supplier.name)
        .bind(supplier.logo.as_deref())
        .bind(&supplier.email)
        .bind(&supplier.website)
        .bind(&supplier.phone)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Update a supplier. The logo is only replaced when a new one is given.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the supplier does not exist.
    pub async fn update(
        &self,
        id: SupplierId,
        supplier: &NewSupplier,
    ) -> Result<Supplier, RepositoryError> {
        let row = sqlx::query_as::<_, SupplierRow>(
            r"
            UPDATE stockroom.supplier
            SET name = $2,
                logo = COALESCE($3, logo),
                email = $4,
                website = $5,
                phone = $6
            WHERE id = $1
            RETURNING id, name, logo, email, website, phone, created_at
            ",
        )
        .bind(id)
        .bind(&supplier.name)
        .bind(supplier.logo.as_deref())
        .bind(&supplier.email)
        .bind(&supplier.website)
        .bind(&supplier.phone)
        .fetch_optional(self.pool)
        .await?;

        row.map(Supplier::from).ok_or(RepositoryError::NotFound)
    }

    /// Delete a supplier and its product links.
    ///
    /// Returns `false` if no such supplier existed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, id: SupplierId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM stockroom.supplier WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

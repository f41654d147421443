//! Product repository.
//!
//! Products always belong to one category and link to any number of
//! suppliers through `product_supplier`. Writes that touch both tables run
//! in a transaction.

use async_stream::try_stream;
use chrono::{DateTime, NaiveDate, Utc};
use futures::{Stream, TryStreamExt};
use sqlx::PgPool;

use stockroom_core::{CategoryId, Price, ProductId, SupplierId};

use super::{RepositoryError, contains_pattern};
use crate::components::{Page, PageWindow};
use crate::models::{NewProduct, Product, ProductListing};

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    title: String,
    description: String,
    image: String,
    price: Price,
    stock: i32,
    category_id: CategoryId,
    expire_date: NaiveDate,
    created_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            image: row.image,
            price: row.price,
            stock: row.stock,
            category_id: row.category_id,
            expire_date: row.expire_date,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductListingRow {
    #[sqlx(flatten)]
    product: ProductRow,
    category_title: String,
    supplier_count: i64,
}

impl From<ProductListingRow> for ProductListing {
    fn from(row: ProductListingRow) -> Self {
        Self {
            product: row.product.into(),
            category_title: row.category_title,
            supplier_count: row.supplier_count,
        }
    }
}

const PRODUCT_COLUMNS: &str =
    "id, title, description, image, price, stock, category_id, expire_date, created_at";

const LISTING_COLUMNS: &str = r"
    p.id, p.title, p.description, p.image, p.price, p.stock, p.category_id,
    p.expire_date, p.created_at,
    c.title AS category_title,
    (SELECT COUNT(*) FROM stockroom.product_supplier ps WHERE ps.product_id = p.id) AS supplier_count
";

const EXPORT_QUERY: &str = r"
    SELECT p.id, p.title, p.description, p.image, p.price, p.stock, p.category_id,
           p.expire_date, p.created_at,
           c.title AS category_title,
           (SELECT COUNT(*) FROM stockroom.product_supplier ps WHERE ps.product_id = p.id) AS supplier_count
    FROM stockroom.product p
    JOIN stockroom.category c ON c.id = p.category_id
    ORDER BY p.id
";

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of products whose title contains `term`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn search_page(
        &self,
        term: &str,
        page: Option<&str>,
    ) -> Result<Page<ProductListing>, RepositoryError> {
        let pattern = contains_pattern(term);

        let total: i64 = sqlx::query_scalar(
            r"SELECT COUNT(*) FROM stockroom.product WHERE title LIKE $1 ESCAPE '\'",
        )
        .bind(&pattern)
        .fetch_one(self.pool)
        .await?;

        let window = PageWindow::resolve(page, total);
        let sql = format!(
            r"
            SELECT {LISTING_COLUMNS}
            FROM stockroom.product p
            JOIN stockroom.category c ON c.id = p.category_id
            WHERE p.title LIKE $1 ESCAPE '\'
            ORDER BY p.id
            LIMIT $2 OFFSET $3
            "
        );
        let rows = sqlx::query_as::<_, ProductListingRow>(&sql)
            .bind(&pattern)
            .bind(window.limit())
            .bind(window.offset())
            .fetch_all(self.pool)
            .await?;

        Ok(Page::new(
            rows.into_iter().map(ProductListing::from).collect(),
            window,
            total,
        ))
    }

    /// One page of the products a supplier supplies, filtered by title.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn for_supplier_page(
        &self,
        supplier_id: SupplierId,
        term: &str,
        page: Option<&str>,
    ) -> Result<Page<ProductListing>, RepositoryError> {
        let pattern = contains_pattern(term);

        let total: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*)
            FROM stockroom.product p
            JOIN stockroom.product_supplier link ON link.product_id = p.id
            WHERE link.supplier_id = $1 AND p.title LIKE $2 ESCAPE '\'
            ",
        )
        .bind(supplier_id)
        .bind(&pattern)
        .fetch_one(self.pool)
        .await?;

        let window = PageWindow::resolve(page, total);
        let sql = format!(
            r"
            SELECT {LISTING_COLUMNS}
            FROM stockroom.product p
            JOIN stockroom.category c ON c.id = p.category_id
            JOIN stockroom.product_supplier link ON link.product_id = p.id
            WHERE link.supplier_id = $1 AND p.title LIKE $2 ESCAPE '\'
            ORDER BY p.id
            LIMIT $3 OFFSET $4
            "
        );
        let rows = sqlx::query_as::<_, ProductListingRow>(&sql)
            .bind(supplier_id)
            .bind(&pattern)
            .bind(window.limit())
            .bind(window.offset())
            .fetch_all(self.pool)
            .await?;

        Ok(Page::new(
            rows.into_iter().map(ProductListing::from).collect(),
            window,
            total,
        ))
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM stockroom.product WHERE id = $1");
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Product::from))
    }

    /// IDs of the suppliers linked to a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn supplier_ids(&self, id: ProductId) -> Result<Vec<SupplierId>, RepositoryError> {
        let ids = sqlx::query_scalar::<_, SupplierId>(
            r"
            SELECT supplier_id
            FROM stockroom.product_supplier
            WHERE product_id = $1
            ORDER BY supplier_id
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(ids)
    }

    /// Products expiring on a day in `from..=to`, soonest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn expiring_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM stockroom.product
            WHERE expire_date BETWEEN $1 AND $2
            ORDER BY expire_date, id
            "
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(from)
            .bind(to)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Create a product and link its suppliers.
    ///
    /// A missing image falls back to the column default.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails; nothing
    /// is written in that case.
    pub async fn create(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r"
            INSERT INTO stockroom.product
                (title, description, image, price, stock, category_id, expire_date)
            VALUES ($1, $2, COALESCE($3, 'images/default.jpg'), $4, $5, $6, $7)
            RETURNING {PRODUCT_COLUMNS}
            "
        );
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(&product.title)
            .bind(&product.description)
            .bind(product.image.as_deref())
            .bind(&product.price)
            .bind(product.stock)
            .bind(product.category_id)
            .bind(product.expire_date)
            .fetch_one(&mut *tx)
            .await?;

        link_suppliers(&mut tx, row.id, &product.supplier_ids).await?;
        tx.commit().await?;

        Ok(row.into())
    }

    /// Update a product and replace its supplier links.
    ///
    /// The image is only replaced when a new one is given.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn update(
        &self,
        id: ProductId,
        product: &NewProduct,
    ) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r"
            UPDATE stockroom.product
            SET title = $2,
                description = $3,
                image = COALESCE($4, image),
                price = $5,
                stock = $6,
                category_id = $7,
                expire_date = $8
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        );
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .bind(&product.title)
            .bind(&product.description)
            .bind(product.image.as_deref())
            .bind(&product.price)
            .bind(product.stock)
            .bind(product.category_id)
            .bind(product.expire_date)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        sqlx::query("DELETE FROM stockroom.product_supplier WHERE product_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        link_suppliers(&mut tx, id, &product.supplier_ids).await?;
        tx.commit().await?;

        Ok(row.into())
    }

    /// Set the stock level of a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn update_stock(&self, id: ProductId, stock: i32) -> Result<Product, RepositoryError> {
        let sql = format!(
            "UPDATE stockroom.product SET stock = $2 WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .bind(stock)
            .fetch_optional(self.pool)
            .await?;

        row.map(Product::from).ok_or(RepositoryError::NotFound)
    }

    /// Delete a product and its supplier links.
    ///
    /// Returns `false` if no such product existed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM stockroom.product WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

async fn link_suppliers(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    product_id: ProductId,
    supplier_ids: &[SupplierId],
) -> Result<(), RepositoryError> {
    if supplier_ids.is_empty() {
        return Ok(());
    }

    sqlx::query(
        r"
        INSERT INTO stockroom.product_supplier (product_id, supplier_id)
        SELECT $1, UNNEST($2::INTEGER[])
        ON CONFLICT DO NOTHING
        ",
    )
    .bind(product_id)
    .bind(supplier_ids)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Stream every product with its category title and supplier count, by id.
///
/// Rows are read from a database cursor as the stream is polled, so the
/// export never holds the whole table in memory.
pub fn export_rows(
    pool: PgPool,
) -> impl Stream<Item = Result<ProductListing, RepositoryError>> + Send + 'static {
    try_stream! {
        let mut rows = sqlx::query_as::<_, ProductListingRow>(EXPORT_QUERY).fetch(&pool);
        while let Some(row) = rows.try_next().await? {
            yield ProductListing::from(row);
        }
    }
}

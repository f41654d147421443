//! Category repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use stockroom_core::CategoryId;

use super::{RepositoryError, contains_pattern};
use crate::components::{Page, PageWindow};
use crate::models::Category;

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: CategoryId,
    title: String,
    created_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            created_at: row.created_at,
        }
    }
}

/// Repository for category database operations.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of categories whose title contains `term`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn search_page(
        &self,
        term: &str,
        page: Option<&str>,
    ) -> Result<Page<Category>, RepositoryError> {
        let pattern = contains_pattern(term);

        let total: i64 = sqlx::query_scalar(
            r"SELECT COUNT(*) FROM stockroom.category WHERE title LIKE $1 ESCAPE '\'",
        )
        .bind(&pattern)
        .fetch_one(self.pool)
        .await?;

        let window = PageWindow::resolve(page, total);
        let rows = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT id, title, created_at
            FROM stockroom.category
            WHERE title LIKE $1 ESCAPE '\'
            ORDER BY id
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(&pattern)
        .bind(window.limit())
        .bind(window.offset())
        .fetch_all(self.pool)
        .await?;

        Ok(Page::new(
            rows.into_iter().map(Category::from).collect(),
            window,
            total,
        ))
    }

    /// All categories, for form select boxes.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, title, created_at FROM stockroom.category ORDER BY title, id",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    /// Get a category by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, title, created_at FROM stockroom.category WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Category::from))
    }

    /// First category (lowest id) whose title equals `title` exactly.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_title(&self, title: &str) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT id, title, created_at
            FROM stockroom.category
            WHERE title = $1
            ORDER BY id
            LIMIT 1
            ",
        )
        .bind(title)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Category::from))
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, title: &str) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            INSERT INTO stockroom.category (title)
            VALUES ($1)
            RETURNING id, title, created_at
            ",
        )
        .bind(title)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Rename a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category does not exist.
    pub async fn update(&self, id: CategoryId, title: &str) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            UPDATE stockroom.category
            SET title = $2
            WHERE id = $1
            RETURNING id, title, created_at
            ",
        )
        .bind(id)
        .bind(title)
        .fetch_optional(self.pool)
        .await?;

        row.map(Category::from).ok_or(RepositoryError::NotFound)
    }

    /// Delete a category and, by cascade, its products.
    ///
    /// Returns `false` if no such category existed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, id: CategoryId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM stockroom.category WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

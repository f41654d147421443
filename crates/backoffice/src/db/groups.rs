//! Permission group repository.

use sqlx::PgPool;

use stockroom_core::{GroupId, Permission};

use super::RepositoryError;
use crate::models::Group;

#[derive(Debug, sqlx::FromRow)]
struct GroupRow {
    id: GroupId,
    name: String,
}

impl From<GroupRow> for Group {
    fn from(row: GroupRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
        }
    }
}

/// Repository for permission groups.
pub struct GroupRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> GroupRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All groups by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Group>, RepositoryError> {
        let rows = sqlx::query_as::<_, GroupRow>(
            "SELECT id, name FROM stockroom.user_group ORDER BY name",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Group::from).collect())
    }

    /// Get a group by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: GroupId) -> Result<Option<Group>, RepositoryError> {
        let row = sqlx::query_as::<_, GroupRow>(
            "SELECT id, name FROM stockroom.user_group WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Group::from))
    }

    /// Get a group by its unique name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_name(&self, name: &str) -> Result<Option<Group>, RepositoryError> {
        let row = sqlx::query_as::<_, GroupRow>(
            "SELECT id, name FROM stockroom.user_group WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Group::from))
    }

    /// Create the group if needed and set its permissions to exactly `permissions`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails; the
    /// group is left unchanged in that case.
    pub async fn upsert_with_permissions(
        &self,
        name: &str,
        permissions: &[Permission],
    ) -> Result<Group, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, GroupRow>(
            r"
            INSERT INTO stockroom.user_group (name)
            VALUES ($1)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id, name
            ",
        )
        .bind(name)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM stockroom.group_permission WHERE group_id = $1")
            .bind(row.id)
            .execute(&mut *tx)
            .await?;

        let codenames: Vec<String> = permissions.iter().map(ToString::to_string).collect();
        sqlx::query(
            r"
            INSERT INTO stockroom.group_permission (group_id, codename)
            SELECT $1, UNNEST($2::TEXT[])
            ON CONFLICT DO NOTHING
            ",
        )
        .bind(row.id)
        .bind(&codenames)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row.into())
    }
}

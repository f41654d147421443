//! Staff account repository.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use stockroom_core::{GroupId, Permission, UserId};

use super::{RepositoryError, contains_pattern};
use crate::components::{Page, PageWindow};
use crate::models::{NewUser, User, UserChanges};

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: UserId,
    username: String,
    first_name: String,
    last_name: String,
    email: String,
    is_superuser: bool,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            is_superuser: row.is_superuser,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserWithHashRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

const USER_COLUMNS: &str = "id, username, first_name, last_name, email, is_superuser, created_at";

/// Row filter for the staff pages: superusers never match.
const STAFF_BY_ID: &str = "id = $1 AND NOT is_superuser";

/// Repository for staff account database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of non-superuser accounts whose first name contains `term`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn search_page(
        &self,
        term: &str,
        page: Option<&str>,
    ) -> Result<Page<User>, RepositoryError> {
        let pattern = contains_pattern(term);

        let total: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*)
            FROM stockroom.app_user
            WHERE NOT is_superuser AND first_name LIKE $1 ESCAPE '\'
            ",
        )
        .bind(&pattern)
        .fetch_one(self.pool)
        .await?;

        let window = PageWindow::resolve(page, total);
        let sql = format!(
            r"
            SELECT {USER_COLUMNS}
            FROM stockroom.app_user
            WHERE NOT is_superuser AND first_name LIKE $1 ESCAPE '\'
            ORDER BY id
            LIMIT $2 OFFSET $3
            "
        );
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&pattern)
            .bind(window.limit())
            .bind(window.offset())
            .fetch_all(self.pool)
            .await?;

        Ok(Page::new(
            rows.into_iter().map(User::from).collect(),
            window,
            total,
        ))
    }

    /// Get an account by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM stockroom.app_user WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(User::from))
    }

    /// Get a non-superuser account by ID.
    ///
    /// Superusers are managed from the CLI only, so the staff pages look
    /// accounts up through this method and never see them.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_staff_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM stockroom.app_user WHERE {STAFF_BY_ID}");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(User::from))
    }

    /// Get an account and its password hash by username, for login.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        username: &str,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let sql = format!(
            "SELECT {USER_COLUMNS}, password_hash FROM stockroom.app_user WHERE username = $1"
        );
        let row = sqlx::query_as::<_, UserWithHashRow>(&sql)
            .bind(username)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(|r| (r.user.into(), r.password_hash)))
    }

    /// Create an account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username is taken.
    pub async fn create(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let sql = format!(
            r"
            INSERT INTO stockroom.app_user
                (username, first_name, last_name, email, password_hash, is_superuser)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&user.username)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.is_superuser)
            .fetch_one(self.pool)
            .await
            .map_err(|e| RepositoryError::from_insert(e, "username"))?;

        Ok(row.into())
    }

    /// Update a non-superuser account's profile fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such staff account exists, or
    /// `RepositoryError::Conflict` if the new username is taken.
    pub async fn update_staff(
        &self,
        id: UserId,
        changes: &UserChanges,
    ) -> Result<User, RepositoryError> {
        let sql = format!(
            r"
            UPDATE stockroom.app_user
            SET username = $2, first_name = $3, last_name = $4, email = $5
            WHERE {STAFF_BY_ID}
            RETURNING {USER_COLUMNS}
            "
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .bind(&changes.username)
            .bind(&changes.first_name)
            .bind(&changes.last_name)
            .bind(&changes.email)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| RepositoryError::from_insert(e, "username"))?;

        row.map(User::from).ok_or(RepositoryError::NotFound)
    }

    /// Delete a non-superuser account.
    ///
    /// Returns `false` if no such staff account existed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete_staff(&self, id: UserId) -> Result<bool, RepositoryError> {
        let sql = format!("DELETE FROM stockroom.app_user WHERE {STAFF_BY_ID}");
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Make `group_id` the account's only group.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if either statement fails.
    pub async fn set_group(&self, id: UserId, group_id: GroupId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM stockroom.user_group_membership WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "INSERT INTO stockroom.user_group_membership (user_id, group_id) VALUES ($1, $2)",
        )
        .bind(id)
        .bind(group_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// The account's group, if it has one (lowest id when several).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn group_of(&self, id: UserId) -> Result<Option<GroupId>, RepositoryError> {
        let group = sqlx::query_scalar::<_, GroupId>(
            r"
            SELECT group_id
            FROM stockroom.user_group_membership
            WHERE user_id = $1
            ORDER BY group_id
            LIMIT 1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(group)
    }

    /// Union of the permissions granted by the account's groups.
    ///
    /// Unknown codenames are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn permissions(&self, id: UserId) -> Result<BTreeSet<Permission>, RepositoryError> {
        let codenames = sqlx::query_scalar::<_, String>(
            r"
            SELECT DISTINCT gp.codename
            FROM stockroom.group_permission gp
            JOIN stockroom.user_group_membership m ON m.group_id = gp.group_id
            WHERE m.user_id = $1
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(codenames
            .into_iter()
            .filter_map(|codename| match codename.parse::<Permission>() {
                Ok(permission) => Some(permission),
                Err(e) => {
                    tracing::warn!(user_id = %id, "Skipping stored permission: {e}");
                    None
                }
            })
            .collect())
    }

    /// Email addresses of every superuser that has one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn administrator_emails(&self) -> Result<Vec<String>, RepositoryError> {
        let emails = sqlx::query_scalar::<_, String>(
            r"
            SELECT email
            FROM stockroom.app_user
            WHERE is_superuser AND email <> ''
            ORDER BY id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(emails)
    }
}

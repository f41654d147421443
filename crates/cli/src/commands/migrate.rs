//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! stockroom migrate
//! ```
//!
//! Migrations live in `crates/backoffice/migrations/` and are embedded in
//! the back office library at build time.

use thiserror::Error;

use stockroom_backoffice::db;

use super::ConnectError;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run the back office migrations.
///
/// # Errors
///
/// Returns `MigrationError` if the database is unreachable or a migration
/// fails.
pub async fn run() -> Result<(), MigrationError> {
    let pool = super::connect().await?;

    tracing::info!("Running migrations...");
    db::run_migrations(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}

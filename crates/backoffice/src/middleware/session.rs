//! Session middleware configuration.
//!
//! `PostgreSQL`-backed sessions using tower-sessions, expiring after 24
//! hours of inactivity.

use sqlx::PgPool;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::BackofficeConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "stockroom_session";

/// Session expiry time in seconds (24 hours).
const SESSION_EXPIRY_SECONDS: i64 = 24 * 60 * 60;

/// Create the session layer with `PostgreSQL` store.
///
/// # Panics
///
/// Panics if the schema name or table name is invalid (should never happen
/// with hardcoded "stockroom" and "session" values).
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &BackofficeConfig,
) -> SessionManagerLayer<PostgresStore> {
    // The session table is created by migration in the stockroom schema.
    let store = PostgresStore::new(pool.clone())
        .with_schema_name("stockroom")
        .expect("valid schema name")
        .with_table_name("session")
        .expect("valid table name");

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_https())
        // Lax so the login redirect keeps the cookie
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

//! Product category.

use chrono::{DateTime, Utc};

use stockroom_core::CategoryId;

/// Longest category title accepted.
pub const MAX_TITLE_LENGTH: usize = 100;

/// A product category. Deleting one deletes its products.
#[derive(Debug, Clone)]
pub struct Category {
    pub id: CategoryId,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

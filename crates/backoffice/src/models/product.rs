//! Product domain types.

use chrono::{DateTime, NaiveDate, Utc};

use stockroom_core::{CategoryId, Price, ProductId, SupplierId};

/// Image reference stored for products created without an upload.
pub const DEFAULT_IMAGE: &str = "images/default.jpg";

/// A stocked product.
#[derive(Debug, Clone)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub description: String,
    /// Media-relative path of the product image.
    pub image: String,
    pub price: Price,
    pub stock: i32,
    pub category_id: CategoryId,
    pub expire_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Whole days from `today` until the expiry date (negative once expired).
    #[must_use]
    pub fn days_to_expire(&self, today: NaiveDate) -> i64 {
        (self.expire_date - today).num_days()
    }
}

/// A product row as shown in listings and the CSV export.
#[derive(Debug, Clone)]
pub struct ProductListing {
    pub product: Product,
    pub category_title: String,
    pub supplier_count: i64,
}

/// Validated input for creating or updating a product.
///
/// `image` is `None` when no new file was uploaded.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    pub price: Price,
    pub stock: i32,
    pub category_id: CategoryId,
    pub expire_date: NaiveDate,
    pub supplier_ids: Vec<SupplierId>,
}

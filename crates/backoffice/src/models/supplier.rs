//! Supplier domain types.

use chrono::{DateTime, Utc};

use stockroom_core::{Email, SupplierId};

/// Logo reference stored for suppliers created without an upload.
pub const DEFAULT_LOGO: &str = "logos/default.jpg";

/// A supplier of one or more products.
#[derive(Debug, Clone)]
pub struct Supplier {
    pub id: SupplierId,
    pub name: String,
    /// Media-relative path of the logo image.
    pub logo: String,
    pub email: Email,
    pub website: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
}

/// A supplier together with the number of products it supplies.
#[derive(Debug, Clone)]
pub struct SupplierListing {
    pub supplier: Supplier,
    pub product_count: i64,
}

/// Validated input for creating or updating a supplier.
///
/// `logo` is `None` when no new file was uploaded.
#[derive(Debug, Clone)]
pub struct NewSupplier {
    pub name: String,
    pub logo: Option<String>,
    pub email: Email,
    pub website: String,
    pub phone: String,
}

//! Domain types for Stockroom.

pub mod email;
pub mod id;
pub mod permission;
pub mod price;

pub use email::{Email, EmailError};
pub use id::*;
pub use permission::{Permission, PermissionParseError};
pub use price::{Price, PriceError};

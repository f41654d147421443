//! Domain models for the back office.
//!
//! Row types live next to their repositories in `db`; these are the
//! validated shapes handlers and services work with.

pub mod category;
pub mod product;
pub mod session;
pub mod supplier;
pub mod user;

pub use category::Category;
pub use product::{DEFAULT_IMAGE, NewProduct, Product, ProductListing};
pub use session::{CurrentUser, session_keys};
pub use supplier::{DEFAULT_LOGO, NewSupplier, Supplier, SupplierListing};
pub use user::{Group, NewUser, User, UserChanges};

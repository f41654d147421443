//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Argon2 password login and account creation
//! - `csv_exchange` - product CSV export and import
//! - `email` - email delivery via SMTP
//! - `media` - uploaded image files
//! - `monitor` - expiry and low-stock checks
//! - `notifier` - alert emails to administrators

pub mod auth;
pub mod csv_exchange;
pub mod email;
pub mod media;
pub mod monitor;
pub mod notifier;

pub use auth::{AuthError, AuthService};
pub use email::{EmailService, Mailer};
pub use media::{MediaKind, MediaStore};

//! Stockroom Core - shared domain types.
//!
//! Used by:
//! - `backoffice` - the server-rendered inventory back office
//! - `cli` - migrations, user management and seeding
//!
//! The core crate holds only types: no I/O, no database access, no HTTP.
//! `sqlx` encode/decode impls are available behind the `postgres` feature.
//!
//! # Modules
//!
//! - [`types`] - ids, email addresses, prices and permission codenames

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

//! Stockroom back office library.
//!
//! Server-rendered inventory management: products, categories, suppliers
//! and staff accounts, with CSV exchange and email alerts for expiring and
//! low-stock products. Exposed as a library so the binary, the CLI and the
//! integration tests share one implementation.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod components;
pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod forms;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

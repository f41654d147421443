//! Reusable view components.

pub mod pagination;

pub use pagination::{PAGE_SIZE, Page, PageWindow};

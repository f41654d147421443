//! Form parsing and validation.
//!
//! Each form takes the raw submitted strings and either produces validated
//! domain input or a [`FieldErrors`] map that the page re-renders next to
//! the submitted values.

use std::collections::BTreeMap;

pub mod category;
pub mod login;
pub mod multipart;
pub mod product;
pub mod stock;
pub mod supplier;
pub mod user;

pub use category::CategoryForm;
pub use login::LoginForm;
pub use multipart::{MultipartForm, UploadedFile};
pub use product::{ProductForm, ProductInput};
pub use stock::StockForm;
pub use supplier::{SupplierForm, SupplierInput};
pub use user::{UserForm, UserFormMode, UserInput};

/// Validation messages keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error; the first one recorded for a field wins.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    /// The message for a field, for templates.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `Ok(value)` when nothing was recorded.
    ///
    /// # Errors
    ///
    /// Returns `self` when any field has an error.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

/// The trimmed value, or an error on `field` if it is blank.
pub(crate) fn required<'a>(
    errors: &mut FieldErrors,
    field: &'static str,
    value: &'a str,
    message: &str,
) -> Option<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        errors.add(field, message);
        None
    } else {
        Some(value)
    }
}

/// Flag values longer than `max` characters.
pub(crate) fn max_length(errors: &mut FieldErrors, field: &'static str, value: &str, max: usize) {
    let length = value.chars().count();
    if length > max {
        errors.add(
            field,
            format!("Ensure this value has at most {max} characters (it has {length})."),
        );
    }
}

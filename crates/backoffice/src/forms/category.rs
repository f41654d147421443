//! Category form.

use serde::Deserialize;

use super::{FieldErrors, max_length, required};
use crate::models::category::MAX_TITLE_LENGTH;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryForm {
    #[serde(default)]
    pub category_title: String,
}

impl CategoryForm {
    /// The validated title.
    ///
    /// # Errors
    ///
    /// Returns field errors for a blank or overlong title.
    pub fn validate(&self) -> Result<String, FieldErrors> {
        let mut errors = FieldErrors::new();
        let title = required(&mut errors, "category_title", &self.category_title, "title is required");
        if let Some(title) = title {
            max_length(&mut errors, "category_title", title, MAX_TITLE_LENGTH);
        }
        errors.into_result(title.unwrap_or_default().to_string())
    }
}

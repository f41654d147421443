//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// URL of a stored media file.
///
/// Usage in templates: `{{ product.image|media_url }}`
#[askama::filter_fn]
pub fn media_url(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(media_path(&value.to_string()))
}

fn media_path(relative: &str) -> String {
    format!("/media/{}", relative.trim_start_matches('/'))
}

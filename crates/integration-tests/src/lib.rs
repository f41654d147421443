//! Integration tests for the Stockroom back office.
//!
//! # Running Tests
//!
//! ```bash
//! # Library-level tests need nothing running
//! cargo test -p stockroom-integration-tests
//!
//! # HTTP tests need a migrated database, a running server and a superuser
//! stockroom migrate
//! stockroom user create -u admin -e admin@example.com --superuser
//! STOCKROOM_TEST_USERNAME=admin STOCKROOM_TEST_PASSWORD=... \
//!     cargo test -p stockroom-integration-tests -- --ignored
//! ```
//!
//! # Environment
//!
//! - `STOCKROOM_BASE_URL` - server address (default `http://localhost:3000`)
//! - `STOCKROOM_TEST_USERNAME` / `STOCKROOM_TEST_PASSWORD` - a superuser login
//! - `STOCKROOM_DATABASE_URL` - the migrated database, for the repository tests

#![cfg_attr(not(test), forbid(unsafe_code))]

use reqwest::{Client, redirect};

/// Base URL of the running back office.
#[must_use]
pub fn base_url() -> String {
    std::env::var("STOCKROOM_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// A client that keeps the session cookie and does not follow redirects,
/// so tests can assert on `Location`.
///
/// # Errors
///
/// Returns the builder error if the TLS backend cannot be initialized.
pub fn session_client() -> reqwest::Result<Client> {
    Client::builder()
        .cookie_store(true)
        .redirect(redirect::Policy::none())
        .build()
}

/// Log in with the test superuser from the environment.
///
/// # Errors
///
/// Returns an error if the credentials are unset, the request fails, or
/// the server does not redirect to the dashboard.
pub async fn logged_in_client() -> Result<Client, Box<dyn std::error::Error>> {
    let username = std::env::var("STOCKROOM_TEST_USERNAME")?;
    let password = std::env::var("STOCKROOM_TEST_PASSWORD")?;

    let client = session_client()?;
    let resp = client
        .post(format!("{}/login", base_url()))
        .form(&[("username", username), ("password", password)])
        .send()
        .await?;

    if location(&resp).as_deref() != Some("/") {
        return Err(format!("login failed with status {}", resp.status()).into());
    }
    Ok(client)
}

/// The `Location` header of a redirect, if any.
#[must_use]
pub fn location(resp: &reqwest::Response) -> Option<String> {
    resp.headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// A suffix that keeps names created by separate test runs apart.
#[must_use]
pub fn unique_suffix() -> String {
    chrono::Utc::now().timestamp_micros().to_string()
}

/// The first `/{resource}/{id}/edit` link in a listing page.
#[must_use]
pub fn first_edit_id(body: &str, resource: &str) -> Option<i64> {
    let prefix = format!("/{resource}/");
    body.match_indices(&prefix).find_map(|(start, _)| {
        let rest = body.get(start + prefix.len()..)?;
        let (id, tail) = rest.split_once('/')?;
        if tail.starts_with("edit") {
            id.parse().ok()
        } else {
            None
        }
    })
}

/// The first stored media URL (`/media/...`) in a page.
#[must_use]
pub fn first_media_url(body: &str) -> Option<String> {
    let (_, rest) = body.split_once("src=\"/media/")?;
    let (path, _) = rest.split_once('"')?;
    Some(format!("/media/{path}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
      <td><img class="thumb" src="/media/images/1700_milk.png" alt=""></td>
      <td><a href="/products/42/suppliers">2</a></td>
      <td><a href="/products/42/edit">Edit</a></td>
    "#;

    #[test]
    fn test_first_edit_id_skips_other_links() {
        assert_eq!(first_edit_id(LISTING, "products"), Some(42));
        assert_eq!(first_edit_id(LISTING, "suppliers"), None);
        assert_eq!(first_edit_id("<p>No products</p>", "products"), None);
    }

    #[test]
    fn test_first_media_url() {
        assert_eq!(
            first_media_url(LISTING).as_deref(),
            Some("/media/images/1700_milk.png")
        );
        assert_eq!(first_media_url("<p></p>"), None);
    }
}

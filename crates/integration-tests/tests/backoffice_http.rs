//! HTTP tests against a running back office.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database
//! - The server running (cargo run -p stockroom-backoffice)
//! - A superuser whose credentials are in `STOCKROOM_TEST_USERNAME` and
//!   `STOCKROOM_TEST_PASSWORD`

use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use stockroom_integration_tests::{
    base_url, first_edit_id, first_media_url, location, logged_in_client, session_client,
    unique_suffix,
};

const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n";

async fn get_text(client: &Client, path: &str) -> String {
    client
        .get(format!("{}{path}", base_url()))
        .send()
        .await
        .expect("Request failed")
        .text()
        .await
        .expect("Failed to read response")
}

async fn create_category(client: &Client, title: &str) -> i64 {
    let resp = client
        .post(format!("{}/categories/add", base_url()))
        .form(&[("category_title", title)])
        .send()
        .await
        .expect("Failed to add category");
    assert_eq!(location(&resp).as_deref(), Some("/categories"));

    let body = get_text(client, &format!("/categories?searchcategory={title}")).await;
    first_edit_id(&body, "categories").expect("Category not listed")
}

async fn create_supplier(client: &Client, name: &str, logo: Option<&str>) -> i64 {
    let mut form = Form::new()
        .text("name", name.to_string())
        .text("email", format!("{name}@example.com"))
        .text("website", "https://example.com")
        .text("phone", "555-0100");
    if let Some(file_name) = logo {
        form = form.part("logo", Part::bytes(PNG_BYTES.to_vec()).file_name(file_name.to_string()));
    }

    let resp = client
        .post(format!("{}/suppliers/add", base_url()))
        .multipart(form)
        .send()
        .await
        .expect("Failed to add supplier");
    assert_eq!(location(&resp).as_deref(), Some("/suppliers"));

    let body = get_text(client, &format!("/suppliers?searchsupplier={name}")).await;
    first_edit_id(&body, "suppliers").expect("Supplier not listed")
}

async fn create_product(
    client: &Client,
    title: &str,
    category: i64,
    suppliers: &[i64],
    image: Option<&str>,
) -> i64 {
    let mut form = Form::new()
        .text("title", title.to_string())
        .text("description", "Created by the HTTP tests")
        .text("price", "4.50")
        .text("stock", "12")
        .text("expire_date", "2030-01-01")
        .text("category", category.to_string());
    for supplier in suppliers {
        form = form.text("suppliers", supplier.to_string());
    }
    if let Some(file_name) = image {
        form = form.part("image", Part::bytes(PNG_BYTES.to_vec()).file_name(file_name.to_string()));
    }

    let resp = client
        .post(format!("{}/products/add", base_url()))
        .multipart(form)
        .send()
        .await
        .expect("Failed to add product");
    assert_eq!(location(&resp).as_deref(), Some("/products"));

    let body = get_text(client, &format!("/products?search={title}")).await;
    first_edit_id(&body, "products").expect("Product not listed")
}

async fn status_of(client: &Client, path: &str) -> StatusCode {
    client
        .get(format!("{}{path}", base_url()))
        .send()
        .await
        .expect("Request failed")
        .status()
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
#[ignore = "Requires running back office server"]
async fn test_health_is_public() {
    let client = session_client().expect("Failed to create HTTP client");
    let resp = client
        .get(format!("{}/health", base_url()))
        .send()
        .await
        .expect("Failed to get /health");

    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running back office server"]
async fn test_anonymous_pages_redirect_to_login() {
    let client = session_client().expect("Failed to create HTTP client");

    for path in ["/", "/products", "/categories", "/suppliers", "/users"] {
        let resp = client
            .get(format!("{}{path}", base_url()))
            .send()
            .await
            .expect("Request failed");

        assert!(resp.status().is_redirection(), "{path} did not redirect");
        assert_eq!(location(&resp).as_deref(), Some("/login"), "{path}");
    }
}

#[tokio::test]
#[ignore = "Requires running back office server"]
async fn test_wrong_password_rerenders_login() {
    let client = session_client().expect("Failed to create HTTP client");
    let resp = client
        .post(format!("{}/login", base_url()))
        .form(&[("username", "nobody"), ("password", "not-the-password")])
        .send()
        .await
        .expect("Failed to post login");

    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("Failed to read response");
    assert!(body.contains("username or password incorrect"));
}

#[tokio::test]
#[ignore = "Requires running back office server and test superuser"]
async fn test_logout_ends_session() {
    let client = logged_in_client().await.expect("Login failed");

    let resp = client
        .post(format!("{}/logout", base_url()))
        .send()
        .await
        .expect("Failed to log out");
    assert_eq!(location(&resp).as_deref(), Some("/login"));

    let resp = client
        .get(format!("{}/", base_url()))
        .send()
        .await
        .expect("Failed to get dashboard");
    assert_eq!(location(&resp).as_deref(), Some("/login"));
}

// ============================================================================
// Pages
// ============================================================================

#[tokio::test]
#[ignore = "Requires running back office server and test superuser"]
async fn test_dashboard_renders_stats() {
    let client = logged_in_client().await.expect("Login failed");
    let resp = client
        .get(format!("{}/", base_url()))
        .send()
        .await
        .expect("Failed to get dashboard");

    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("Failed to read response");
    assert!(body.contains("Average price"));
}

#[tokio::test]
#[ignore = "Requires running back office server and test superuser"]
async fn test_listings_accept_search_terms() {
    let client = logged_in_client().await.expect("Login failed");

    for path in [
        "/products?search=milk&page=1",
        "/categories?searchcategory=dairy",
        "/suppliers?searchsupplier=north",
        "/users?searchuser=sam",
    ] {
        let resp = client
            .get(format!("{}{path}", base_url()))
            .send()
            .await
            .expect("Request failed");
        assert_eq!(resp.status(), StatusCode::OK, "{path}");
    }
}

#[tokio::test]
#[ignore = "Requires running back office server and test superuser"]
async fn test_unknown_product_redirects_home() {
    let client = logged_in_client().await.expect("Login failed");
    let resp = client
        .get(format!("{}/products/999999999/edit", base_url()))
        .send()
        .await
        .expect("Failed to get product");

    assert_eq!(location(&resp).as_deref(), Some("/"));
}

#[tokio::test]
#[ignore = "Requires running back office server and test superuser"]
async fn test_product_delete_removes_image_and_record() {
    let client = logged_in_client().await.expect("Login failed");
    let suffix = unique_suffix();
    let category = create_category(&client, &format!("Shelf{suffix}")).await;
    let title = format!("Jam{suffix}");
    let id = create_product(&client, &title, category, &[], Some("jam.png")).await;

    let listing = get_text(&client, &format!("/products?search={title}")).await;
    let image = first_media_url(&listing).expect("Product image not listed");
    assert!(image.ends_with("_jam.png"), "{image}");
    assert_eq!(status_of(&client, &image).await, StatusCode::OK);

    let resp = client
        .post(format!("{}/products/{id}/delete", base_url()))
        .send()
        .await
        .expect("Failed to delete product");
    assert_eq!(location(&resp).as_deref(), Some("/products"));

    assert_eq!(status_of(&client, &image).await, StatusCode::NOT_FOUND);
    let resp = client
        .get(format!("{}/products/{id}/edit", base_url()))
        .send()
        .await
        .expect("Failed to get product");
    assert_eq!(location(&resp).as_deref(), Some("/"));
}

#[tokio::test]
#[ignore = "Requires running back office server and test superuser"]
async fn test_supplier_delete_removes_logo_and_record() {
    let client = logged_in_client().await.expect("Login failed");
    let name = format!("acme{}", unique_suffix());
    let id = create_supplier(&client, &name, Some("acme.png")).await;

    let listing = get_text(&client, &format!("/suppliers?searchsupplier={name}")).await;
    let logo = first_media_url(&listing).expect("Supplier logo not listed");
    assert!(logo.ends_with("_acme.png"), "{logo}");
    assert_eq!(status_of(&client, &logo).await, StatusCode::OK);

    let resp = client
        .post(format!("{}/suppliers/{id}/delete", base_url()))
        .send()
        .await
        .expect("Failed to delete supplier");
    assert_eq!(location(&resp).as_deref(), Some("/suppliers"));

    assert_eq!(status_of(&client, &logo).await, StatusCode::NOT_FOUND);
    let resp = client
        .get(format!("{}/suppliers/{id}/edit", base_url()))
        .send()
        .await
        .expect("Failed to get supplier");
    assert_eq!(location(&resp).as_deref(), Some("/"));
}

#[tokio::test]
#[ignore = "Requires running back office server and test superuser"]
async fn test_replacing_product_image_removes_the_old_file() {
    let client = logged_in_client().await.expect("Login failed");
    let suffix = unique_suffix();
    let category = create_category(&client, &format!("Pantry{suffix}")).await;
    let title = format!("Honey{suffix}");
    let id = create_product(&client, &title, category, &[], Some("old.png")).await;
    let old = first_media_url(&get_text(&client, &format!("/products?search={title}")).await)
        .expect("Product image not listed");

    let form = Form::new()
        .text("title", title.clone())
        .text("description", "Created by the HTTP tests")
        .text("price", "5.00")
        .text("stock", "3")
        .text("expire_date", "2030-01-01")
        .text("category", category.to_string())
        .part("image", Part::bytes(PNG_BYTES.to_vec()).file_name("new.png"));
    let resp = client
        .post(format!("{}/products/{id}/edit", base_url()))
        .multipart(form)
        .send()
        .await
        .expect("Failed to edit product");
    assert_eq!(location(&resp).as_deref(), Some("/products"));

    let new = first_media_url(&get_text(&client, &format!("/products?search={title}")).await)
        .expect("Product image not listed");
    assert!(new.ends_with("_new.png"), "{new}");
    assert_eq!(status_of(&client, &new).await, StatusCode::OK);
    assert_eq!(status_of(&client, &old).await, StatusCode::NOT_FOUND);
}

// ============================================================================
// CSV exchange
// ============================================================================

#[tokio::test]
#[ignore = "Requires running back office server and test superuser"]
async fn test_export_is_a_csv_attachment() {
    let client = logged_in_client().await.expect("Login failed");
    let resp = client
        .get(format!("{}/products/export", base_url()))
        .send()
        .await
        .expect("Failed to export");

    assert_eq!(resp.status(), StatusCode::OK);
    let disposition = resp
        .headers()
        .get(reqwest::header::CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    assert_eq!(
        disposition.as_deref(),
        Some("attachment; filename=\"products.csv\"")
    );

    let body = resp.text().await.expect("Failed to read export");
    assert!(body.starts_with("ID,Title,Description,Price,Stock,Expire Date,Category,#Suppliers"));
}

#[tokio::test]
#[ignore = "Requires running back office server and test superuser"]
async fn test_import_rejects_non_csv_file_name() {
    let client = logged_in_client().await.expect("Login failed");
    let part = reqwest::multipart::Part::bytes(b"a,b,c,d,e,f\n".to_vec()).file_name("products.txt");
    let form = reqwest::multipart::Form::new().part("csv_file", part);

    let resp = client
        .post(format!("{}/products/import", base_url()))
        .multipart(form)
        .send()
        .await
        .expect("Failed to post import");

    assert_eq!(location(&resp).as_deref(), Some("/products/import"));
}

#[tokio::test]
#[ignore = "Requires running back office server and test superuser"]
async fn test_export_counts_linked_suppliers() {
    let client = logged_in_client().await.expect("Login failed");
    let suffix = unique_suffix();
    let category = create_category(&client, &format!("Dairy{suffix}")).await;
    let first = create_supplier(&client, &format!("north{suffix}"), None).await;
    let second = create_supplier(&client, &format!("south{suffix}"), None).await;
    let id = create_product(&client, &format!("Butter{suffix}"), category, &[first, second], None).await;

    let export = get_text(&client, "/products/export").await;
    let row = export
        .lines()
        .find(|line| line.starts_with(&format!("{id},")))
        .expect("Product missing from export");

    assert_eq!(row.rsplit(',').next(), Some("2"), "{row}");
}

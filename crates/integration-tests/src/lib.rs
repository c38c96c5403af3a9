//! Integration tests for the RocketShoes cart.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p rocketshoes-integration-tests
//! ```
//!
//! No external services are needed: the catalog API is served by `wiremock`
//! and the storage slot lives in a temporary directory.
//!
//! # Test Categories
//!
//! - `catalog_client` - HTTP client status and body handling
//! - `cart_flow` - Store operations end to end over HTTP and a file slot

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use rocketshoes_storefront::config::CatalogConfig;
use rocketshoes_storefront::{CatalogClient, FileCartStore, FileSlot};
use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A mocked catalog plus a store writing to a temporary file.
pub struct TestContext {
    pub server: MockServer,
    pub dir: TempDir,
}

impl TestContext {
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
            dir: tempfile::tempdir().unwrap(),
        }
    }

    /// Path of the cart file.
    #[must_use]
    pub fn cart_path(&self) -> std::path::PathBuf {
        self.dir.path().join("cart.json")
    }

    /// A catalog client pointed at the mock server.
    #[must_use]
    pub fn catalog(&self) -> CatalogClient {
        let config = CatalogConfig::new(&self.server.uri()).unwrap();
        CatalogClient::new(&config).unwrap()
    }

    /// A fresh store over the mock catalog and the cart file.
    ///
    /// Building a second store over the same context simulates a restart.
    #[must_use]
    pub fn store(&self) -> FileCartStore {
        FileCartStore::new(self.catalog(), FileSlot::new(self.cart_path()))
    }

    /// Raw JSON currently in the cart file.
    #[must_use]
    pub fn stored_json(&self) -> Option<Value> {
        let raw = std::fs::read_to_string(self.cart_path()).ok()?;
        Some(serde_json::from_str(&raw).unwrap())
    }

    /// Serve `product_json(id)` at `/products/{id}`.
    pub async fn mount_product(&self, id: i32) {
        Mock::given(method("GET"))
            .and(path(format!("/products/{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(product_json(id)))
            .mount(&self.server)
            .await;
    }

    /// Serve `{ id, amount }` at `/stock/{id}`.
    pub async fn mount_stock(&self, id: i32, amount: i64) {
        Mock::given(method("GET"))
            .and(path(format!("/stock/{id}")))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "id": id, "amount": amount })),
            )
            .mount(&self.server)
            .await;
    }

    /// Drop all mounted routes (e.g. to change stock mid-test).
    pub async fn reset(&self) {
        self.server.reset().await;
    }
}

/// A catalog product record.
#[must_use]
pub fn product_json(id: i32) -> Value {
    json!({
        "id": id,
        "title": format!("Rocket Runner {id}"),
        "price": 179.9,
        "image": format!("https://cdn.rocketshoes.example/{id}.jpg"),
    })
}

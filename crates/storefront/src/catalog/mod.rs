//! Remote catalog access: product records and stock levels.
//!
//! # Architecture
//!
//! - [`CatalogClient`] talks to the REST catalog with `reqwest`
//! - The catalog is the source of truth for stock - NO caching, every
//!   quantity change re-reads `/stock/{id}`
//! - The cart store only depends on the [`Catalog`] trait, so tests can drive
//!   it with an in-process fake
//!
//! # Endpoints
//!
//! - `GET /products/{id}` - product record, copied into new line items
//! - `GET /stock/{id}` - `{ "id": 1, "amount": 3 }`, available quantity at read time

mod client;

use std::future::Future;

pub use client::CatalogClient;

use rocketshoes_core::{Product, ProductId, Stock};
use thiserror::Error;

/// Errors that can occur when talking to the catalog API.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// API returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response body was not the expected JSON.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Read access to the remote catalog.
pub trait Catalog: Send + Sync {
    /// Fetch the catalog record for a product.
    fn product(&self, id: ProductId) -> impl Future<Output = Result<Product, CatalogError>> + Send;

    /// Fetch the currently available stock for a product.
    fn stock(&self, id: ProductId) -> impl Future<Output = Result<Stock, CatalogError>> + Send;
}

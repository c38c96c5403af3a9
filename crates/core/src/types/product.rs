//! Catalog records returned by the remote API.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{Price, ProductId};

/// A product as returned by `GET /products/{id}`.
///
/// Only the fields the cart renders are typed. Anything else the catalog
/// sends is kept in `extra` and written back out unchanged, so a line item
/// carries the full catalog record it was created from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub price: Price,
    pub image: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Available stock for a product, as returned by `GET /stock/{id}`.
///
/// Never cached: read fresh before every quantity change. Some catalog
/// backends omit the `id`, so it is optional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ProductId>,
    pub amount: i64,
}

impl Stock {
    /// Whether `requested` units can be satisfied.
    #[must_use]
    pub const fn covers(&self, requested: i64) -> bool {
        requested <= self.amount
    }
}

//! Cart operation errors with Sentry integration.
//!
//! Every cart operation returns `Result<Outcome, CartError>`. Nothing is
//! converted to a user message here; the presentation layer picks the
//! message through [`crate::notice::notices_for`].

use rocketshoes_core::ProductId;
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::storage::StorageError;

/// Error returned by a cart operation. State is untouched whenever one is returned.
#[derive(Debug, Error)]
pub enum CartError {
    /// The product has no line in the cart.
    #[error("Product {0} is not in the cart")]
    NotInCart(ProductId),

    /// Requested quantity exceeds available stock.
    #[error("Requested {requested} of product {product_id}, only {available} in stock")]
    StockExceeded {
        product_id: ProductId,
        requested: i64,
        available: i64,
    },

    /// Fetching the product record failed.
    #[error("Product lookup failed: {0}")]
    ProductLookup(#[source] CatalogError),

    /// Fetching the stock record failed.
    #[error("Stock lookup failed: {0}")]
    StockLookup(#[source] CatalogError),

    /// Persisting the cart failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Adding a product already in the cart failed while raising its quantity.
    #[error("Quantity increase failed: {0}")]
    Increment(#[source] Box<CartError>),
}

/// Coarse error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartErrorKind {
    /// Remove/update on a product that is not in the cart.
    NotInCart,
    /// Requested quantity greater than available stock.
    StockExceeded,
    /// Network, parse or storage failure.
    Transport,
}

impl CartError {
    #[must_use]
    pub fn kind(&self) -> CartErrorKind {
        match self.root_cause() {
            Self::NotInCart(_) => CartErrorKind::NotInCart,
            Self::StockExceeded { .. } => CartErrorKind::StockExceeded,
            _ => CartErrorKind::Transport,
        }
    }

    /// The underlying error, with any `Increment` wrapping removed.
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::Increment(inner) => inner.root_cause(),
            other => other,
        }
    }

    /// Whether this error indicates a fault worth reporting (as opposed to
    /// an expected user-level rejection).
    #[must_use]
    pub fn is_fault(&self) -> bool {
        matches!(self.kind(), CartErrorKind::Transport)
    }
}

/// Report a cart error to Sentry if it is a fault, and log it.
///
/// Expected rejections (not in cart, out of stock) are logged at `info` only.
pub fn report(operation: &str, err: &CartError) {
    if err.is_fault() {
        let event_id = sentry::capture_error(err);
        tracing::error!(
            operation,
            error = %err,
            sentry_event_id = %event_id,
            "Cart operation failed"
        );
    } else {
        tracing::info!(operation, error = %err, "Cart operation rejected");
    }
}

/// Add a breadcrumb for cart actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of cart
/// actions leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "add", Some(&[("product_id", "1")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

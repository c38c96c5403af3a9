//! Display data for rendering a cart.
//!
//! Presentation code renders these instead of touching prices directly, so
//! every front end formats money the same way.

use rocketshoes_core::{Cart, LineItem};

/// Line item display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItemView {
    pub id: i32,
    pub title: String,
    pub image: String,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
}

/// Cart display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    /// Number of distinct products (the header badge count).
    pub item_count: usize,
    /// Number of units across all lines.
    pub unit_count: u64,
}

impl CartView {
    /// Create an empty cart view.
    #[must_use]
    pub fn empty() -> Self {
        Self::from(&Cart::new())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart.iter().map(CartItemView::from).collect(),
            subtotal: cart.total().to_string(),
            item_count: cart.len(),
            unit_count: cart.unit_count(),
        }
    }
}

impl From<&LineItem> for CartItemView {
    fn from(line: &LineItem) -> Self {
        Self {
            id: line.id.as_i32(),
            title: line.title.clone(),
            image: line.image.clone(),
            quantity: line.amount,
            price: line.price.to_string(),
            line_price: line.subtotal().to_string(),
        }
    }
}

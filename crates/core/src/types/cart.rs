//! The cart: an ordered list of line items, one per product.
//!
//! All transformations are non-destructive. They return a new [`Cart`] so the
//! store can persist the candidate before it replaces the committed state.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{Price, Product, ProductId};

/// One product entry in the cart.
///
/// Serialized flat, as the catalog record plus an `amount` key:
/// `{"id":1,"title":"...","price":179.9,"image":"...","amount":2}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: ProductId,
    pub title: String,
    pub price: Price,
    pub image: String,
    pub amount: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LineItem {
    /// Build a line item from a catalog record.
    ///
    /// The cart's `amount` replaces any `amount` key the record carries.
    #[must_use]
    pub fn from_product(product: Product, amount: u32) -> Self {
        let mut extra = product.extra;
        extra.remove("amount");

        Self {
            id: product.id,
            title: product.title,
            price: product.price,
            image: product.image,
            amount,
            extra,
        }
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.price.times(self.amount)
    }
}

/// Ordered cart contents. Order is insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a cart from stored items.
    ///
    /// Later duplicates of a product are dropped so the one-line-per-product
    /// rule holds even for hand-edited storage.
    #[must_use]
    pub fn from_items(items: Vec<LineItem>) -> Self {
        let mut cart = Self::new();
        for item in items {
            if !cart.contains(item.id) {
                cart.items.push(item);
            }
        }
        cart
    }

    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LineItem> {
        self.items.iter()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Sum of all quantities.
    #[must_use]
    pub fn unit_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.amount)).sum()
    }

    /// Sum of all line subtotals.
    #[must_use]
    pub fn total(&self) -> Price {
        self.items.iter().map(LineItem::subtotal).sum()
    }

    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&LineItem> {
        self.items.iter().find(|item| item.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.get(id).is_some()
    }

    /// Cart with `item` appended, or `None` if its product is already present.
    #[must_use]
    pub fn with_item(&self, item: LineItem) -> Option<Self> {
        if self.contains(item.id) {
            return None;
        }
        let mut items = self.items.clone();
        items.push(item);
        Some(Self { items })
    }

    /// Cart without the line for `id`, or `None` if there is no such line.
    #[must_use]
    pub fn without(&self, id: ProductId) -> Option<Self> {
        if !self.contains(id) {
            return None;
        }
        let items = self
            .items
            .iter()
            .filter(|item| item.id != id)
            .cloned()
            .collect();
        Some(Self { items })
    }

    /// Cart with the line for `id` set to `amount`, in place, or `None` if
    /// there is no such line.
    #[must_use]
    pub fn with_amount(&self, id: ProductId, amount: u32) -> Option<Self> {
        let mut items = self.items.clone();
        let item = items.iter_mut().find(|item| item.id == id)?;
        item.amount = amount;
        Some(Self { items })
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a LineItem;
    type IntoIter = std::slice::Iter<'a, LineItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

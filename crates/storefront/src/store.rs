//! The cart store.
//!
//! Holds the cart in memory, mirrors it to a storage slot after every
//! mutation, and checks quantity changes against remote stock first.
//!
//! # Consistency
//!
//! Each operation snapshots the cart, awaits the catalog, builds the new cart
//! from its snapshot, writes it to the slot and only then publishes it. A
//! failed step leaves both the slot and the in-memory cart as they were.
//!
//! Operations are not serialized against each other. Two overlapping calls
//! each work from their own snapshot and the last one to commit wins, in
//! memory and on disk alike.

use std::sync::Arc;

use rocketshoes_core::{Cart, LineItem, ProductId};
use tokio::sync::watch;
use tracing::{debug, instrument};

use crate::catalog::{Catalog, CatalogClient, CatalogError};
use crate::config::CartConfig;
use crate::error::{CartError, add_breadcrumb};
use crate::storage::{FileSlot, StorageSlot, encode_cart, restore_cart};

/// Result of an operation that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The cart changed and was persisted.
    Committed,
    /// Nothing changed and nothing should be reported (quantity below one).
    Ignored,
}

/// Cart store wired to the HTTP catalog and a file slot.
pub type FileCartStore = CartStore<CatalogClient, FileSlot>;

/// Shared cart state and the operations that change it.
///
/// Cheaply cloneable via `Arc`; build once at startup and hand clones to
/// every consumer.
pub struct CartStore<C, S> {
    inner: Arc<CartStoreInner<C, S>>,
}

struct CartStoreInner<C, S> {
    catalog: C,
    slot: S,
    state: watch::Sender<Cart>,
}

impl<C, S> Clone for CartStore<C, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl FileCartStore {
    /// Build a store from configuration.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the HTTP client cannot be built.
    pub fn from_config(config: &CartConfig) -> Result<Self, CatalogError> {
        let catalog = CatalogClient::new(&config.api)?;
        let slot = FileSlot::new(config.storage_path.clone());
        Ok(Self::new(catalog, slot))
    }
}

impl<C: Catalog, S: StorageSlot> CartStore<C, S> {
    /// Create a store, loading the cart from `slot`.
    ///
    /// A missing or unparseable slot yields an empty cart.
    pub fn new(catalog: C, slot: S) -> Self {
        let cart = restore_cart(&slot);
        debug!(items = cart.len(), "Cart restored");
        let (state, _) = watch::channel(cart);

        Self {
            inner: Arc::new(CartStoreInner {
                catalog,
                slot,
                state,
            }),
        }
    }

    /// Snapshot of the current cart.
    #[must_use]
    pub fn cart(&self) -> Cart {
        self.inner.state.borrow().clone()
    }

    /// Receiver that observes every committed cart.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Cart> {
        self.inner.state.subscribe()
    }

    /// The storage slot backing this store.
    #[must_use]
    pub fn slot(&self) -> &S {
        &self.inner.slot
    }

    /// Add one unit of a product.
    ///
    /// A product not yet in the cart is fetched from the catalog and appended
    /// with quantity 1. A product already in the cart goes through
    /// [`set_quantity`](Self::set_quantity) with its quantity plus one, so
    /// the stock check applies.
    ///
    /// # Errors
    ///
    /// - `CartError::ProductLookup` if the catalog read fails
    /// - `CartError::Increment` wrapping any error of
    ///   [`set_quantity`](Self::set_quantity) for products already in the cart
    /// - `CartError::Storage` if persisting fails
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn add(&self, id: ProductId) -> Result<Outcome, CartError> {
        add_breadcrumb("cart", "add", Some(&[("product_id", id.to_string().as_str())]));

        let product = self
            .inner
            .catalog
            .product(id)
            .await
            .map_err(CartError::ProductLookup)?;

        let current = self.cart();
        let Some(next) = current.with_item(LineItem::from_product(product, 1)) else {
            let amount = current
                .get(id)
                .map_or(1, |line| i64::from(line.amount) + 1);
            return self
                .set_quantity(id, amount)
                .await
                .map_err(|e| CartError::Increment(Box::new(e)));
        };

        self.commit(next)?;
        debug!("Product added to cart");
        Ok(Outcome::Committed)
    }

    /// Remove a product's line from the cart.
    ///
    /// # Errors
    ///
    /// - `CartError::NotInCart` if the product has no line
    /// - `CartError::Storage` if persisting fails
    #[instrument(skip(self), fields(product_id = %id))]
    pub fn remove(&self, id: ProductId) -> Result<Outcome, CartError> {
        add_breadcrumb("cart", "remove", Some(&[("product_id", id.to_string().as_str())]));

        let next = self.cart().without(id).ok_or(CartError::NotInCart(id))?;
        self.commit(next)?;
        debug!("Product removed from cart");
        Ok(Outcome::Committed)
    }

    /// Set a product's quantity after checking current stock.
    ///
    /// Stock is always fetched first. Quantities below one are accepted
    /// silently and change nothing ([`Outcome::Ignored`]).
    ///
    /// # Errors
    ///
    /// - `CartError::StockLookup` if the stock read fails
    /// - `CartError::StockExceeded` if `amount` is above available stock
    /// - `CartError::NotInCart` if the product has no line
    /// - `CartError::Storage` if persisting fails
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn set_quantity(&self, id: ProductId, amount: i64) -> Result<Outcome, CartError> {
        add_breadcrumb(
            "cart",
            "set_quantity",
            Some(&[
                ("product_id", id.to_string().as_str()),
                ("amount", amount.to_string().as_str()),
            ]),
        );

        let stock = self
            .inner
            .catalog
            .stock(id)
            .await
            .map_err(CartError::StockLookup)?;

        let exceeded = || CartError::StockExceeded {
            product_id: id,
            requested: amount,
            available: stock.amount,
        };

        if !stock.covers(amount) {
            return Err(exceeded());
        }

        if amount < 1 {
            debug!(amount, "Quantity below one ignored");
            return Ok(Outcome::Ignored);
        }

        let amount = u32::try_from(amount).map_err(|_| exceeded())?;
        let next = self
            .cart()
            .with_amount(id, amount)
            .ok_or(CartError::NotInCart(id))?;

        self.commit(next)?;
        debug!(amount, "Quantity updated");
        Ok(Outcome::Committed)
    }

    /// Persist `next`, then publish it. Nothing is published if the write fails.
    fn commit(&self, next: Cart) -> Result<(), CartError> {
        let encoded = encode_cart(&next)?;
        self.inner.slot.save(&encoded)?;
        self.inner.state.send_replace(next);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use rocketshoes_core::{Price, Product, Stock};
    use serde_json::Map;

    use super::*;
    use crate::notice::{Notice, Operation, notices_for};
    use crate::storage::MemorySlot;

    /// In-process catalog with a fixed product list and adjustable stock.
    #[derive(Default)]
    struct FakeCatalog {
        stock: Mutex<HashMap<i32, i64>>,
        stock_reads: AtomicUsize,
        offline: bool,
    }

    impl FakeCatalog {
        fn with_stock(levels: &[(i32, i64)]) -> Self {
            Self {
                stock: Mutex::new(levels.iter().copied().collect()),
                ..Self::default()
            }
        }

        fn offline() -> Self {
            Self {
                offline: true,
                ..Self::default()
            }
        }

        fn set_stock(&self, id: i32, amount: i64) {
            self.stock.lock().unwrap().insert(id, amount);
        }
    }

    fn product(id: i32) -> Product {
        Product {
            id: ProductId::new(id),
            title: format!("Shoe {id}"),
            price: Price::from_cents(10_000 + i64::from(id)),
            image: format!("https://cdn.example/{id}.jpg"),
            extra: Map::new(),
        }
    }

    impl Catalog for FakeCatalog {
        async fn product(&self, id: ProductId) -> Result<Product, CatalogError> {
            if self.offline {
                return Err(CatalogError::NotFound(format!("products/{id}")));
            }
            Ok(product(id.as_i32()))
        }

        async fn stock(&self, id: ProductId) -> Result<Stock, CatalogError> {
            self.stock_reads.fetch_add(1, Ordering::SeqCst);
            if self.offline {
                return Err(CatalogError::Parse("offline".to_string()));
            }
            let amount = self
                .stock
                .lock()
                .unwrap()
                .get(&id.as_i32())
                .copied()
                .ok_or_else(|| CatalogError::NotFound(format!("stock/{id}")))?;
            Ok(Stock {
                id: Some(id),
                amount,
            })
        }
    }

    fn store(catalog: FakeCatalog) -> CartStore<FakeCatalog, MemorySlot> {
        CartStore::new(catalog, MemorySlot::new())
    }

    fn amounts(cart: &Cart) -> Vec<(i32, u32)> {
        cart.iter().map(|l| (l.id.as_i32(), l.amount)).collect()
    }

    fn stored(store: &CartStore<FakeCatalog, MemorySlot>) -> Cart {
        serde_json::from_str(&store.slot().contents().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_add_new_product_appends_one_line() {
        let store = store(FakeCatalog::with_stock(&[(1, 5)]));

        let outcome = store.add(ProductId::new(1)).await.unwrap();

        assert_eq!(outcome, Outcome::Committed);
        assert_eq!(amounts(&store.cart()), vec![(1, 1)]);
        assert_eq!(stored(&store), store.cart());
    }

    #[tokio::test]
    async fn test_add_new_product_does_not_check_stock() {
        let store = store(FakeCatalog::with_stock(&[]));

        store.add(ProductId::new(1)).await.unwrap();
        assert_eq!(store.inner.catalog.stock_reads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_add_existing_product_increments() {
        let store = store(FakeCatalog::with_stock(&[(1, 5), (2, 5)]));
        store.add(ProductId::new(1)).await.unwrap();
        store.add(ProductId::new(2)).await.unwrap();

        store.add(ProductId::new(1)).await.unwrap();

        assert_eq!(amounts(&store.cart()), vec![(1, 2), (2, 1)]);
    }

    #[tokio::test]
    async fn test_add_existing_product_respects_stock() {
        let store = store(FakeCatalog::with_stock(&[(1, 1)]));
        store.add(ProductId::new(1)).await.unwrap();

        let err = store.add(ProductId::new(1)).await.unwrap_err();

        assert!(matches!(
            err.root_cause(),
            CartError::StockExceeded {
                requested: 2,
                available: 1,
                ..
            }
        ));
        assert_eq!(amounts(&store.cart()), vec![(1, 1)]);
    }

    #[tokio::test]
    async fn test_add_existing_product_write_failure_is_update_failure() {
        let store = CartStore::new(
            FakeCatalog::with_stock(&[(1, 5)]),
            MemorySlot::read_only(Some(
                r#"[{"id":1,"title":"Shoe","price":10,"image":"1.jpg","amount":1}]"#.to_string(),
            )),
        );

        let err = store.add(ProductId::new(1)).await.unwrap_err();

        assert!(matches!(err, CartError::Increment(_)));
        assert!(matches!(err.root_cause(), CartError::Storage(_)));
        assert_eq!(notices_for(Operation::Add, &err), vec![Notice::UpdateFailed]);
        assert_eq!(amounts(&store.cart()), vec![(1, 1)]);
    }

    #[tokio::test]
    async fn test_add_catalog_failure_leaves_cart_untouched() {
        let store = store(FakeCatalog::offline());

        let err = store.add(ProductId::new(1)).await.unwrap_err();

        assert!(matches!(err, CartError::ProductLookup(_)));
        assert!(store.cart().is_empty());
        assert!(store.slot().contents().is_none());
    }

    #[tokio::test]
    async fn test_remove_present_product() {
        let store = store(FakeCatalog::with_stock(&[]));
        for id in [1, 2, 3] {
            store.add(ProductId::new(id)).await.unwrap();
        }

        store.remove(ProductId::new(2)).unwrap();

        assert_eq!(amounts(&store.cart()), vec![(1, 1), (3, 1)]);
        assert_eq!(stored(&store), store.cart());
    }

    #[tokio::test]
    async fn test_remove_absent_product_changes_nothing() {
        let store = store(FakeCatalog::with_stock(&[]));
        store.add(ProductId::new(1)).await.unwrap();
        let before = store.slot().contents();

        let err = store.remove(ProductId::new(7)).unwrap_err();

        assert!(matches!(err, CartError::NotInCart(id) if id == ProductId::new(7)));
        assert_eq!(store.slot().contents(), before);
        assert_eq!(amounts(&store.cart()), vec![(1, 1)]);
    }

    #[tokio::test]
    async fn test_set_quantity_within_stock() {
        let store = store(FakeCatalog::with_stock(&[(1, 10)]));
        store.add(ProductId::new(1)).await.unwrap();

        let outcome = store.set_quantity(ProductId::new(1), 7).await.unwrap();

        assert_eq!(outcome, Outcome::Committed);
        assert_eq!(amounts(&store.cart()), vec![(1, 7)]);
        assert_eq!(amounts(&stored(&store)), vec![(1, 7)]);
    }

    #[tokio::test]
    async fn test_set_quantity_above_stock_is_rejected() {
        let store = store(FakeCatalog::with_stock(&[(1, 3)]));
        store.add(ProductId::new(1)).await.unwrap();

        let err = store.set_quantity(ProductId::new(1), 5).await.unwrap_err();

        assert!(matches!(err, CartError::StockExceeded { available: 3, .. }));
        assert_eq!(amounts(&store.cart()), vec![(1, 1)]);
    }

    #[tokio::test]
    async fn test_set_quantity_below_one_is_silently_ignored() {
        let store = store(FakeCatalog::with_stock(&[(1, 3)]));
        store.add(ProductId::new(1)).await.unwrap();
        let before = store.slot().contents();

        for amount in [0, -4] {
            let outcome = store.set_quantity(ProductId::new(1), amount).await.unwrap();
            assert_eq!(outcome, Outcome::Ignored);
        }

        assert_eq!(amounts(&store.cart()), vec![(1, 1)]);
        assert_eq!(store.slot().contents(), before);
    }

    #[tokio::test]
    async fn test_set_quantity_reads_stock_every_time() {
        let store = store(FakeCatalog::with_stock(&[(1, 3)]));
        store.add(ProductId::new(1)).await.unwrap();

        store.set_quantity(ProductId::new(1), 3).await.unwrap();
        store.inner.catalog.set_stock(1, 10);
        store.set_quantity(ProductId::new(1), 9).await.unwrap();

        assert_eq!(store.inner.catalog.stock_reads.load(Ordering::SeqCst), 2);
        assert_eq!(amounts(&store.cart()), vec![(1, 9)]);
    }

    #[tokio::test]
    async fn test_set_quantity_absent_product() {
        let store = store(FakeCatalog::with_stock(&[(4, 10)]));

        let err = store.set_quantity(ProductId::new(4), 2).await.unwrap_err();

        assert!(matches!(err, CartError::NotInCart(_)));
        assert!(store.slot().contents().is_none());
    }

    #[tokio::test]
    async fn test_set_quantity_stock_failure() {
        let store = CartStore::new(
            FakeCatalog::offline(),
            MemorySlot::with_contents(r#"[{"id":1,"title":"Shoe","price":10,"image":"1.jpg","amount":1}]"#),
        );

        let err = store.set_quantity(ProductId::new(1), 2).await.unwrap_err();

        assert!(matches!(err, CartError::StockLookup(_)));
        assert_eq!(amounts(&store.cart()), vec![(1, 1)]);
    }

    #[tokio::test]
    async fn test_failed_write_keeps_memory_state() {
        let store = CartStore::new(
            FakeCatalog::with_stock(&[(1, 5)]),
            MemorySlot::read_only(None),
        );

        let err = store.add(ProductId::new(1)).await.unwrap_err();

        assert!(matches!(err, CartError::Storage(_)));
        assert!(store.cart().is_empty());
    }

    #[tokio::test]
    async fn test_restores_from_slot() {
        let slot = MemorySlot::with_contents(
            r#"[{"id":2,"title":"Boot","price":89.9,"image":"2.jpg","amount":3}]"#,
        );
        let store = CartStore::new(FakeCatalog::with_stock(&[]), slot);

        assert_eq!(amounts(&store.cart()), vec![(2, 3)]);
    }

    #[tokio::test]
    async fn test_garbage_slot_starts_empty() {
        let store = CartStore::new(
            FakeCatalog::with_stock(&[]),
            MemorySlot::with_contents("definitely not json"),
        );
        assert!(store.cart().is_empty());
    }

    #[tokio::test]
    async fn test_subscribers_see_commits() {
        let store = store(FakeCatalog::with_stock(&[(1, 5)]));
        let mut rx = store.subscribe();

        store.add(ProductId::new(1)).await.unwrap();

        assert!(rx.has_changed().unwrap());
        assert_eq!(amounts(&rx.borrow_and_update()), vec![(1, 1)]);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = store(FakeCatalog::with_stock(&[]));
        let other = store.clone();

        other.add(ProductId::new(1)).await.unwrap();

        assert_eq!(amounts(&store.cart()), vec![(1, 1)]);
    }
}

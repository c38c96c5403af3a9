//! RocketShoes storefront cart library.
//!
//! This crate provides the client-side cart: a store that keeps line items in
//! memory, mirrors them to a storage slot and validates quantity changes
//! against the remote catalog's stock.
//!
//! # Modules
//!
//! - [`store`] - `CartStore` and its add / remove / set-quantity operations
//! - [`catalog`] - Catalog API client (`/products/{id}`, `/stock/{id}`)
//! - [`storage`] - Durable storage slot for the serialized cart
//! - [`notice`] - User-facing notices for failed operations
//! - [`view`] - Display data for rendering a cart
//! - [`config`] - Environment configuration
//! - [`error`] - Operation errors and Sentry reporting

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod error;
pub mod notice;
pub mod storage;
pub mod store;
pub mod view;

pub use catalog::{Catalog, CatalogClient, CatalogError};
pub use config::CartConfig;
pub use error::{CartError, CartErrorKind};
pub use notice::{Notice, Operation, notices_for};
pub use storage::{FileSlot, MemorySlot, StorageError, StorageSlot};
pub use store::{CartStore, FileCartStore, Outcome};
pub use view::CartView;

//! Cart commands.
//!
//! Runs one store operation, turns a failure into notices and renders the
//! resulting cart as plain text.

use std::fmt::Write;

use rocketshoes_core::ProductId;
use rocketshoes_storefront::error::report;
use rocketshoes_storefront::{
    Catalog, CartError, CartStore, CartView, Notice, Operation, Outcome, StorageSlot, notices_for,
};

/// A single cart action requested on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartCommand {
    Show,
    Add(ProductId),
    Remove(ProductId),
    SetQuantity(ProductId, i64),
}

/// What to show the user after a command.
#[derive(Debug)]
pub struct Report {
    pub notices: Vec<Notice>,
    pub cart: CartView,
}

/// Run `command` against `store`.
pub async fn run<C: Catalog, S: StorageSlot>(
    store: &CartStore<C, S>,
    command: CartCommand,
) -> Report {
    let result: Option<(Operation, Result<Outcome, CartError>)> = match command {
        CartCommand::Show => None,
        CartCommand::Add(id) => Some((Operation::Add, store.add(id).await)),
        CartCommand::Remove(id) => Some((Operation::Remove, store.remove(id))),
        CartCommand::SetQuantity(id, amount) => {
            Some((Operation::SetQuantity, store.set_quantity(id, amount).await))
        }
    };

    let notices = match result {
        Some((operation, Err(err))) => {
            report(operation.as_str(), &err);
            notices_for(operation, &err)
        }
        Some((operation, Ok(outcome))) => {
            tracing::debug!(%operation, ?outcome, "Cart command finished");
            Vec::new()
        }
        None => Vec::new(),
    };

    Report {
        notices,
        cart: CartView::from(&store.cart()),
    }
}

/// Render a cart as a text table.
#[must_use]
pub fn render(cart: &CartView) -> String {
    if cart.is_empty() {
        return "Your cart is empty.\n".to_string();
    }

    let mut out = String::new();
    writeln!(
        out,
        "{:>4}  {:<32} {:>10} {:>4} {:>11}",
        "ID", "PRODUCT", "PRICE", "QTY", "SUBTOTAL"
    )
    .ok();
    for item in &cart.items {
        writeln!(
            out,
            "{:>4}  {:<32} {:>10} {:>4} {:>11}",
            item.id,
            truncate(&item.title, 32),
            item.price,
            item.quantity,
            item.line_price
        )
        .ok();
    }
    writeln!(
        out,
        "{} item(s), {} unit(s). Total: {}",
        cart.item_count, cart.unit_count, cart.subtotal
    )
    .ok();
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut t: String = s.chars().take(max.saturating_sub(1)).collect();
    t.push('…');
    t
}

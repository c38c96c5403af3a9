//! User-facing notices for failed cart operations.
//!
//! There are no success notices. A failed operation maps to one or more
//! notices depending on which operation the user asked for and what went wrong.

use std::fmt;

use crate::error::CartError;

/// The cart operation a user invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Remove,
    SetQuantity,
}

impl Operation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::SetQuantity => "set_quantity",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transient error message shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    AddFailed,
    StockExceeded,
    RemoveFailed,
    UpdateFailed,
}

impl Notice {
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::AddFailed => "Error adding product",
            Self::StockExceeded => "Requested quantity is out of stock",
            Self::RemoveFailed => "Error removing product",
            Self::UpdateFailed => "Error changing product quantity",
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Notices to show for `err` raised by `operation`.
///
/// `add` on a product already in the cart runs the quantity update, so every
/// error of that update surfaces exactly as an update's would. A failure of
/// the add itself shows both the add notice and the stock notice.
#[must_use]
pub fn notices_for(operation: Operation, err: &CartError) -> Vec<Notice> {
    match (operation, err) {
        (Operation::Add, CartError::Increment(inner)) => {
            notices_for(Operation::SetQuantity, inner)
        }
        (_, CartError::StockExceeded { .. }) => vec![Notice::StockExceeded],
        (Operation::Add, _) => vec![Notice::AddFailed, Notice::StockExceeded],
        (Operation::Remove, _) => vec![Notice::RemoveFailed],
        (Operation::SetQuantity, _) => vec![Notice::UpdateFailed],
    }
}

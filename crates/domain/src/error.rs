//! Domain error types.

use thiserror::Error;

use crate::value_objects::ProductId;

/// Errors raised while constructing an order.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderError {
    /// An order must contain at least one item.
    #[error("Order has no items")]
    NoItems,

    /// Item quantities must be positive.
    #[error("Item {product_id} has zero quantity")]
    ZeroQuantity { product_id: ProductId },
}

/// Errors raised by cart operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    /// Requested quantity exceeds the currently available stock.
    ///
    /// This check is best-effort at add/update time; the reconciler remains
    /// authoritative when the order later commits stock.
    #[error("Insufficient stock for {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// Cart quantities must be positive; use `remove` to drop a line.
    #[error("Quantity for {product_id} must be positive")]
    ZeroQuantity { product_id: ProductId },
}

//! Engine error types.

use domain::{Order, ProductId};
use stores::{ProductRecord, StoreError};
use thiserror::Error;

use crate::validator::Shortfall;

/// A single product whose reconciliation write failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    pub product_id: ProductId,
    pub reason: String,
}

impl std::fmt::Display for ItemFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.product_id, self.reason)
    }
}

/// Errors that can occur during engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A stock commit was rejected before persistence; the status edit did
    /// not happen. Carries one itemized shortfall per failing product.
    #[error("Insufficient stock for {} product(s)", .0.len())]
    InsufficientStock(Vec<Shortfall>),

    /// Some per-item stock writes failed after the status edit was already
    /// persisted. The order and inventory records carried here were
    /// refetched so callers can resynchronize displayed state; the
    /// persisted status is left as-is pending a manual retry.
    #[error("Stock reconciliation incomplete: {} applied, {} failed", applied.len(), failed.len())]
    PartialReconciliation {
        order: Box<Order>,
        inventory: Vec<ProductRecord>,
        applied: Vec<ProductId>,
        failed: Vec<ItemFailure>,
    },

    /// The payment callback's signature did not match. Fatal to the
    /// checkout attempt; the order stays unpaid.
    #[error("Payment callback signature mismatch")]
    SignatureInvalid,

    /// The callback names a gateway order this system never created.
    #[error("Unknown gateway order: {0}")]
    UnknownGatewayOrder(String),

    /// Checkout was attempted with an empty cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// The payment gateway could not create a remote order.
    #[error("Payment gateway error: {0}")]
    GatewayUnavailable(String),

    /// Store error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

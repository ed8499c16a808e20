//! Store error taxonomy.
//!
//! Every external call resolves to a tagged outcome; callers match on the
//! variant instead of probing payload shapes.

use common::OrderId;
use domain::{OrderError, OrderStatus, ProductId};
use thiserror::Error;

/// Errors that can occur when interacting with the order or inventory store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The order does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The product does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// Cancellation was attempted on an order that is no longer pending.
    #[error("Cannot cancel order in {status} status")]
    CancelNotAllowed { status: OrderStatus },

    /// The order payload failed validation at creation time.
    #[error("Invalid order: {0}")]
    InvalidOrder(#[from] OrderError),

    /// A persisted row could not be interpreted.
    #[error("Invalid stored data: {0}")]
    Invalid(String),

    /// A stock write was rejected by the store.
    #[error("Stock write rejected for {product_id}: {reason}")]
    WriteRejected {
        product_id: ProductId,
        reason: String,
    },

    /// An external call exceeded its deadline.
    #[error("Store call timed out")]
    Timeout,

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

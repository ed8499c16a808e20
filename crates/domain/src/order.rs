//! The order model.

use chrono::{DateTime, Utc};
use common::{BuyerId, OrderId};
use serde::{Deserialize, Serialize};

use crate::error::OrderError;
use crate::status::{OrderStatus, PaymentMethod, PaymentStatus, StatusSnapshot};
use crate::value_objects::{Address, Money, OrderItem};

/// An order as held by the order store.
///
/// Items, the address snapshot, and `total_amount` are frozen at creation.
/// Only `status`, `payment_status`, and `updated_at` change afterwards;
/// cancellation is a status value, never a deletion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub buyer_id: BuyerId,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub total_amount: Money,
    pub placed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub shipping_address: Address,
    items: Vec<OrderItem>,
}

impl Order {
    /// Creates a new pending, unpaid order from validated parts.
    ///
    /// Fails if the item list is empty or contains a zero quantity. The
    /// total is computed here and never recomputed.
    pub fn place(
        id: OrderId,
        buyer_id: BuyerId,
        shipping_address: Address,
        payment_method: PaymentMethod,
        items: Vec<OrderItem>,
        placed_at: DateTime<Utc>,
    ) -> Result<Self, OrderError> {
        if items.is_empty() {
            return Err(OrderError::NoItems);
        }
        if let Some(item) = items.iter().find(|i| i.quantity == 0) {
            return Err(OrderError::ZeroQuantity {
                product_id: item.product_id.clone(),
            });
        }

        let total_amount = items.iter().map(OrderItem::line_total).sum();

        Ok(Self {
            id,
            buyer_id,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Unpaid,
            payment_method,
            total_amount,
            placed_at,
            updated_at: placed_at,
            shipping_address,
            items,
        })
    }

    /// Reassembles an order from stored fields, without re-validation.
    ///
    /// Intended for store backends reading persisted rows.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: OrderId,
        buyer_id: BuyerId,
        status: OrderStatus,
        payment_status: PaymentStatus,
        payment_method: PaymentMethod,
        total_amount: Money,
        placed_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        shipping_address: Address,
        items: Vec<OrderItem>,
    ) -> Self {
        Self {
            id,
            buyer_id,
            status,
            payment_status,
            payment_method,
            total_amount,
            placed_at,
            updated_at,
            shipping_address,
            items,
        }
    }

    /// Returns the order's items.
    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    /// Returns the current `(status, payment_status)` snapshot.
    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot::new(self.status, self.payment_status)
    }

    /// Returns true if the order currently holds committed stock.
    pub fn stock_committed(&self) -> bool {
        self.snapshot().stock_committed()
    }
}

//! Order store contract.

use async_trait::async_trait;
use common::{BuyerId, OrderId};
use domain::{Address, Order, OrderItem, OrderStatus, PaymentMethod, PaymentStatus};

use crate::error::Result;

/// Input for order creation.
///
/// Items carry their price snapshots already; the store computes nothing
/// beyond the order total.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub buyer_id: BuyerId,
    pub shipping_address: Address,
    pub payment_method: PaymentMethod,
    pub items: Vec<OrderItem>,
}

/// Contract for the order store.
///
/// Orders are never deleted; cancellation is a status value. Item lists and
/// address snapshots are immutable once created, which is why no update
/// operation touches them.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Fetches an order by ID, including its items.
    async fn get_order(&self, order_id: OrderId) -> Result<Order>;

    /// Creates a new pending, unpaid order.
    async fn create_order(&self, new_order: NewOrder) -> Result<Order>;

    /// Persists a new fulfillment status and returns the updated order.
    async fn update_status(&self, order_id: OrderId, status: OrderStatus) -> Result<Order>;

    /// Persists a new payment status and returns the updated order.
    async fn update_payment_status(
        &self,
        order_id: OrderId,
        payment_status: PaymentStatus,
    ) -> Result<Order>;

    /// Cancels a pending order on the buyer's behalf.
    ///
    /// Rejected with `CancelNotAllowed` unless the order is still pending.
    async fn cancel_order(&self, order_id: OrderId) -> Result<Order>;
}

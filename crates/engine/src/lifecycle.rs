//! Order lifecycle service.
//!
//! The only two code paths that mutate an order's status or payment status
//! run through here, so stock side-effects are triggered exactly once per
//! edit rather than recomputed on every order change.

use std::time::Duration;

use common::OrderId;
use domain::{Order, OrderStatus, PaymentStatus, StatusSnapshot, StockDirection, classify};
use stores::{InventoryStore, OrderStore, ProductRecord};

use crate::error::{EngineError, Result};
use crate::reconciler::StockReconciler;
use crate::validator::check_stock;

/// A proposed edit to one of the two mutable order fields.
#[derive(Debug, Clone, Copy)]
enum Edit {
    Status(OrderStatus),
    Payment(PaymentStatus),
}

impl Edit {
    fn applied_to(self, prev: StatusSnapshot) -> StatusSnapshot {
        match self {
            Edit::Status(status) => StatusSnapshot::new(status, prev.payment_status),
            Edit::Payment(payment) => StatusSnapshot::new(prev.status, payment),
        }
    }
}

/// Drives status and payment edits through classification, validation,
/// persistence, and reconciliation.
///
/// Seller-side status moves are deliberately unrestricted — the detector
/// absorbs backwards moves the same as forward ones. Buyer-side
/// cancellation goes through [`OrderLifecycle::cancel`], which the store
/// limits to pending orders.
pub struct OrderLifecycle<O, I> {
    orders: O,
    inventory: I,
    reconciler: StockReconciler<I>,
}

impl<O, I> OrderLifecycle<O, I>
where
    O: OrderStore,
    I: InventoryStore + Clone,
{
    /// Creates a lifecycle service over the given stores.
    pub fn new(orders: O, inventory: I, call_timeout: Duration) -> Self {
        let reconciler = StockReconciler::new(inventory.clone(), call_timeout);
        Self {
            orders,
            inventory,
            reconciler,
        }
    }

    /// Edits an order's fulfillment status.
    ///
    /// A commit-classified edit is validated first and rejected with
    /// itemized shortfalls before anything is persisted. After persistence
    /// the stock delta is applied; a partial reconciliation failure leaves
    /// the persisted status in place and surfaces the refetched state.
    #[tracing::instrument(skip(self))]
    pub async fn set_status(&self, order_id: OrderId, status: OrderStatus) -> Result<Order> {
        self.apply_edit(order_id, Edit::Status(status)).await
    }

    /// Edits an order's payment status, with the same pipeline as
    /// [`OrderLifecycle::set_status`].
    #[tracing::instrument(skip(self))]
    pub async fn set_payment_status(
        &self,
        order_id: OrderId,
        payment_status: PaymentStatus,
    ) -> Result<Order> {
        self.apply_edit(order_id, Edit::Payment(payment_status)).await
    }

    /// Cancels a pending order on the buyer's behalf.
    ///
    /// The store rejects cancellation of non-pending orders; a pending
    /// order is never stock-committed, so this normally releases nothing,
    /// but the transition is still classified in case the store's rules
    /// ever widen.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, order_id: OrderId) -> Result<Order> {
        let order = self.orders.get_order(order_id).await?;
        let prev = order.snapshot();

        let cancelled = self.orders.cancel_order(order_id).await?;
        let transition = classify(prev, cancelled.snapshot());
        self.settle(cancelled, transition.direction()).await
    }

    async fn apply_edit(&self, order_id: OrderId, edit: Edit) -> Result<Order> {
        let order = self.orders.get_order(order_id).await?;
        let prev = order.snapshot();
        let curr = edit.applied_to(prev);
        let transition = classify(prev, curr);

        // Reject a commit the inventory cannot cover before persisting
        // anything; the status edit must not survive a failed validation.
        if transition.direction() == Some(StockDirection::Commit) {
            check_stock(&self.inventory, order.items(), StockDirection::Commit).await?;
        }

        let updated = match edit {
            Edit::Status(status) => self.orders.update_status(order_id, status).await?,
            Edit::Payment(payment) => {
                self.orders.update_payment_status(order_id, payment).await?
            }
        };

        tracing::info!(%order_id, from = %prev, to = %curr, "order edit persisted");
        self.settle(updated, transition.direction()).await
    }

    /// Applies the stock side-effect for a classified transition, exactly
    /// once per edit.
    async fn settle(&self, order: Order, direction: Option<StockDirection>) -> Result<Order> {
        let Some(direction) = direction else {
            return Ok(order);
        };

        match direction {
            StockDirection::Commit => metrics::counter!("stock_commits_total").increment(1),
            StockDirection::Release => metrics::counter!("stock_releases_total").increment(1),
        }

        let outcome = self.reconciler.reconcile(order.items(), direction).await;
        if outcome.is_complete() {
            tracing::info!(order_id = %order.id, %direction, applied = outcome.applied_count(),
                "stock reconciled");
            return Ok(order);
        }

        // Resynchronize: the status edit stays persisted, but callers get a
        // refreshed view of both the order and the affected inventory.
        tracing::warn!(order_id = %order.id, %direction, failed = outcome.failed.len(),
            "partial reconciliation failure");
        let refreshed = match self.orders.get_order(order.id).await {
            Ok(refreshed) => refreshed,
            Err(_) => order,
        };
        let mut inventory = Vec::new();
        for item in refreshed.items() {
            if let Ok(product) = self.inventory.get_product(&item.product_id).await {
                inventory.push(product);
            }
        }

        Err(EngineError::PartialReconciliation {
            order: Box::new(refreshed),
            inventory,
            applied: outcome.applied,
            failed: outcome.failed,
        })
    }
}

/// Convenience accessor for seller inventory dashboards.
pub async fn seller_inventory<I: InventoryStore>(
    inventory: &I,
    seller_id: common::SellerId,
) -> Result<Vec<ProductRecord>> {
    Ok(inventory.products_by_seller(seller_id).await?)
}

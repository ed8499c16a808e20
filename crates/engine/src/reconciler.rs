//! Stock reconciliation.
//!
//! Applies a validated inventory delta one product at a time. Items are
//! independent: one product's write failing never rolls back another's
//! already-applied write. Re-running a reconcile for the same transition
//! double-applies the delta, so callers invoke it exactly once per
//! classified commit or release.

use std::time::Duration;

use domain::{OrderItem, StockDirection};
use futures_util::future::join_all;
use stores::{InventoryStore, StoreError};

use crate::error::ItemFailure;

/// Aggregate result of a reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Products whose stock write was applied.
    pub applied: Vec<domain::ProductId>,

    /// Products whose stock write failed, with the reason.
    pub failed: Vec<ItemFailure>,
}

impl ReconcileOutcome {
    /// Returns true if every item's write was applied.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Returns the number of applied writes.
    pub fn applied_count(&self) -> usize {
        self.applied.len()
    }
}

/// Applies stock deltas to the inventory store.
#[derive(Debug, Clone)]
pub struct StockReconciler<I> {
    inventory: I,
    call_timeout: Duration,
}

impl<I: InventoryStore> StockReconciler<I> {
    /// Creates a reconciler with a per-item call deadline.
    pub fn new(inventory: I, call_timeout: Duration) -> Self {
        Self {
            inventory,
            call_timeout,
        }
    }

    /// Applies the delta for every item, fanned out concurrently.
    ///
    /// Each item reads the current stock, computes the new absolute value
    /// (clamped at zero), and writes it back. A write that exceeds the
    /// deadline counts as failed for that item only.
    #[tracing::instrument(skip(self, items), fields(item_count = items.len(), %direction))]
    pub async fn reconcile(
        &self,
        items: &[OrderItem],
        direction: StockDirection,
    ) -> ReconcileOutcome {
        let results = join_all(
            items
                .iter()
                .map(|item| self.apply_item(item, direction)),
        )
        .await;

        let mut outcome = ReconcileOutcome::default();
        for (item, result) in items.iter().zip(results) {
            match result {
                Ok(()) => outcome.applied.push(item.product_id.clone()),
                Err(e) => {
                    tracing::warn!(product_id = %item.product_id, error = %e, "stock write failed");
                    outcome.failed.push(ItemFailure {
                        product_id: item.product_id.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        metrics::counter!("reconcile_items_applied_total")
            .increment(outcome.applied.len() as u64);
        metrics::counter!("reconcile_items_failed_total").increment(outcome.failed.len() as u64);

        outcome
    }

    async fn apply_item(
        &self,
        item: &OrderItem,
        direction: StockDirection,
    ) -> Result<(), StoreError> {
        let write = async {
            let product = self.inventory.get_product(&item.product_id).await?;
            let new_stock = match direction {
                StockDirection::Commit => product.available_stock.saturating_sub(item.quantity),
                StockDirection::Release => product.available_stock.saturating_add(item.quantity),
            };
            self.inventory.set_stock(&item.product_id, new_stock).await
        };

        match tokio::time::timeout(self.call_timeout, write).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout),
        }
    }
}

//! Stock validation for commit transitions.

use domain::{OrderItem, ProductId, StockDirection};
use stores::{InventoryStore, StoreError};

use crate::error::{EngineError, Result};

/// One product that cannot cover its required quantity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortfall {
    pub product_id: ProductId,
    pub name: String,
    pub required: u32,
    pub available: u32,
    pub shortfall: u32,
}

impl std::fmt::Display for Shortfall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}): required {}, available {}, short {}",
            self.name, self.product_id, self.required, self.available, self.shortfall
        )
    }
}

/// Checks current inventory against an order's quantities for the given
/// direction.
///
/// Releases always pass: restoring stock cannot be blocked by a shortage.
/// Commits read a point-in-time stock snapshot per product and fail iff at
/// least one item's required quantity exceeds its availability, with one
/// itemized [`Shortfall`] per failing line. A product missing from the
/// inventory store counts as available 0.
///
/// The snapshot is not a lock: a pass here does not guarantee the
/// subsequent reconciliation succeeds.
pub async fn check_stock<I: InventoryStore>(
    inventory: &I,
    items: &[OrderItem],
    direction: StockDirection,
) -> Result<()> {
    if direction == StockDirection::Release {
        return Ok(());
    }

    let mut shortfalls = Vec::new();
    for item in items {
        let (name, available) = match inventory.get_product(&item.product_id).await {
            Ok(product) => (product.name, product.available_stock),
            Err(StoreError::ProductNotFound(_)) => (item.product_name.clone(), 0),
            Err(e) => return Err(e.into()),
        };

        if available < item.quantity {
            shortfalls.push(Shortfall {
                product_id: item.product_id.clone(),
                name,
                required: item.quantity,
                available,
                shortfall: item.quantity - available,
            });
        }
    }

    if shortfalls.is_empty() {
        Ok(())
    } else {
        Err(EngineError::InsufficientStock(shortfalls))
    }
}

//! The buyer's cart.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CartError;
use crate::value_objects::ProductId;

/// One line of a cart, for iteration and display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A per-buyer mapping from product to desired quantity.
///
/// The cart enforces a best-effort stock guard at add/update time only; the
/// reconciler is authoritative when an order later commits stock. A cart is
/// emptied only after a successful checkout finalization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: BTreeMap<ProductId, u32>,
}

impl Cart {
    /// Creates an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `quantity` of a product, on top of any existing line.
    ///
    /// `available` is the stock figure known to the caller at this moment;
    /// the combined quantity may not exceed it.
    pub fn add(
        &mut self,
        product_id: ProductId,
        quantity: u32,
        available: u32,
    ) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::ZeroQuantity { product_id });
        }
        let combined = self.quantity_of(&product_id) + quantity;
        if combined > available {
            return Err(CartError::InsufficientStock {
                product_id,
                requested: combined,
                available,
            });
        }
        self.lines.insert(product_id, combined);
        Ok(())
    }

    /// Sets the quantity of a product outright; zero removes the line.
    pub fn set_quantity(
        &mut self,
        product_id: ProductId,
        quantity: u32,
        available: u32,
    ) -> Result<(), CartError> {
        if quantity == 0 {
            self.lines.remove(&product_id);
            return Ok(());
        }
        if quantity > available {
            return Err(CartError::InsufficientStock {
                product_id,
                requested: quantity,
                available,
            });
        }
        self.lines.insert(product_id, quantity);
        Ok(())
    }

    /// Removes a product line entirely.
    pub fn remove(&mut self, product_id: &ProductId) {
        self.lines.remove(product_id);
    }

    /// Empties the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Returns the quantity carried for a product (zero if absent).
    pub fn quantity_of(&self, product_id: &ProductId) -> u32 {
        self.lines.get(product_id).copied().unwrap_or(0)
    }

    /// Returns true if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Returns the number of lines in the cart.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Iterates the cart's lines in product-id order.
    pub fn lines(&self) -> impl Iterator<Item = CartLine> + '_ {
        self.lines.iter().map(|(product_id, quantity)| CartLine {
            product_id: product_id.clone(),
            quantity: *quantity,
        })
    }
}

//! Inventory store contract.

use async_trait::async_trait;
use common::SellerId;
use domain::{Money, ProductId};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A product as held by the inventory store, reduced to the fields this
/// subsystem reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub product_id: ProductId,
    pub seller_id: SellerId,
    pub name: String,
    pub sku: String,
    pub price: Money,
    pub available_stock: u32,
}

/// Contract for the inventory store.
///
/// `available_stock` is an absolute non-negative integer and `set_stock` is
/// the only mutation this subsystem performs: every writer computes the new
/// absolute value from its own read. The store itself is the single source
/// of truth between concurrent writers.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Fetches a single product.
    async fn get_product(&self, product_id: &ProductId) -> Result<ProductRecord>;

    /// Lists a seller's products, for the inventory dashboard.
    async fn products_by_seller(&self, seller_id: SellerId) -> Result<Vec<ProductRecord>>;

    /// Writes an absolute stock value for a product.
    async fn set_stock(&self, product_id: &ProductId, available_stock: u32) -> Result<()>;
}

//! In-memory store backends for testing.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use common::{OrderId, SellerId};
use domain::{Order, OrderStatus, PaymentStatus, ProductId};

use crate::error::{Result, StoreError};
use crate::inventory_store::{InventoryStore, ProductRecord};
use crate::order_store::{NewOrder, OrderStore};

#[derive(Debug, Default)]
struct OrderStoreState {
    orders: HashMap<OrderId, Order>,
    fail_on_create: bool,
    fail_on_update: bool,
}

/// In-memory order store for testing.
///
/// Provides the same interface as the PostgreSQL implementation, plus
/// failure-injection switches.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderStore {
    state: Arc<RwLock<OrderStoreState>>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the store to fail order creation.
    pub fn set_fail_on_create(&self, fail: bool) {
        self.state.write().unwrap().fail_on_create = fail;
    }

    /// Configures the store to fail status and payment-status updates.
    pub fn set_fail_on_update(&self, fail: bool) {
        self.state.write().unwrap().fail_on_update = fail;
    }

    /// Returns the number of stored orders.
    pub fn order_count(&self) -> usize {
        self.state.read().unwrap().orders.len()
    }
}

impl InMemoryOrderStore {
    fn mutate(
        &self,
        order_id: OrderId,
        f: impl FnOnce(&mut Order) -> Result<()>,
    ) -> Result<Order> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_update {
            return Err(StoreError::Timeout);
        }
        let order = state
            .orders
            .get_mut(&order_id)
            .ok_or(StoreError::OrderNotFound(order_id))?;
        f(order)?;
        order.updated_at = Utc::now();
        Ok(order.clone())
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn get_order(&self, order_id: OrderId) -> Result<Order> {
        let state = self.state.read().unwrap();
        state
            .orders
            .get(&order_id)
            .cloned()
            .ok_or(StoreError::OrderNotFound(order_id))
    }

    async fn create_order(&self, new_order: NewOrder) -> Result<Order> {
        let order = Order::place(
            OrderId::new(),
            new_order.buyer_id,
            new_order.shipping_address,
            new_order.payment_method,
            new_order.items,
            Utc::now(),
        )?;

        let mut state = self.state.write().unwrap();
        if state.fail_on_create {
            return Err(StoreError::Timeout);
        }
        state.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn update_status(&self, order_id: OrderId, status: OrderStatus) -> Result<Order> {
        self.mutate(order_id, |order| {
            order.status = status;
            Ok(())
        })
    }

    async fn update_payment_status(
        &self,
        order_id: OrderId,
        payment_status: PaymentStatus,
    ) -> Result<Order> {
        self.mutate(order_id, |order| {
            order.payment_status = payment_status;
            Ok(())
        })
    }

    async fn cancel_order(&self, order_id: OrderId) -> Result<Order> {
        self.mutate(order_id, |order| {
            if !order.status.can_buyer_cancel() {
                return Err(StoreError::CancelNotAllowed {
                    status: order.status,
                });
            }
            order.status = OrderStatus::Cancelled;
            Ok(())
        })
    }
}

#[derive(Debug, Default)]
struct InventoryState {
    products: HashMap<ProductId, ProductRecord>,
    fail_writes: HashSet<ProductId>,
}

/// In-memory inventory store for testing.
///
/// Stock writes can be made to fail per product, which is how partial
/// reconciliation failures are exercised.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInventoryStore {
    state: Arc<RwLock<InventoryState>>,
}

impl InMemoryInventoryStore {
    /// Creates a new empty in-memory inventory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a product record.
    pub fn insert_product(&self, record: ProductRecord) {
        let mut state = self.state.write().unwrap();
        state.products.insert(record.product_id.clone(), record);
    }

    /// Returns the current stock for a product, if it exists.
    pub fn stock_of(&self, product_id: &ProductId) -> Option<u32> {
        let state = self.state.read().unwrap();
        state.products.get(product_id).map(|p| p.available_stock)
    }

    /// Configures stock writes for one product to be rejected.
    pub fn set_fail_on_write(&self, product_id: ProductId, fail: bool) {
        let mut state = self.state.write().unwrap();
        if fail {
            state.fail_writes.insert(product_id);
        } else {
            state.fail_writes.remove(&product_id);
        }
    }
}

#[async_trait]
impl InventoryStore for InMemoryInventoryStore {
    async fn get_product(&self, product_id: &ProductId) -> Result<ProductRecord> {
        let state = self.state.read().unwrap();
        state
            .products
            .get(product_id)
            .cloned()
            .ok_or_else(|| StoreError::ProductNotFound(product_id.clone()))
    }

    async fn products_by_seller(&self, seller_id: SellerId) -> Result<Vec<ProductRecord>> {
        let state = self.state.read().unwrap();
        let mut products: Vec<ProductRecord> = state
            .products
            .values()
            .filter(|p| p.seller_id == seller_id)
            .cloned()
            .collect();
        products.sort_by(|a, b| a.product_id.as_str().cmp(b.product_id.as_str()));
        Ok(products)
    }

    async fn set_stock(&self, product_id: &ProductId, available_stock: u32) -> Result<()> {
        let mut state = self.state.write().unwrap();
        if state.fail_writes.contains(product_id) {
            return Err(StoreError::WriteRejected {
                product_id: product_id.clone(),
                reason: "injected write failure".to_string(),
            });
        }
        let product = state
            .products
            .get_mut(product_id)
            .ok_or_else(|| StoreError::ProductNotFound(product_id.clone()))?;
        product.available_stock = available_stock;
        Ok(())
    }
}

//! PostgreSQL store backends.

use async_trait::async_trait;
use chrono::Utc;
use common::{BuyerId, OrderId, SellerId};
use domain::{
    Address, Money, Order, OrderItem, OrderStatus, PaymentMethod, PaymentStatus, ProductId,
};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::inventory_store::{InventoryStore, ProductRecord};
use crate::order_store::{NewOrder, OrderStore};

/// PostgreSQL-backed order store implementation.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Creates a new PostgreSQL order store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_order(row: &PgRow, items: Vec<OrderItem>) -> Result<Order> {
        let status_str: String = row.try_get("status")?;
        let status = OrderStatus::parse(&status_str)
            .ok_or_else(|| StoreError::Invalid(format!("unknown order status: {status_str}")))?;

        let payment_str: String = row.try_get("payment_status")?;
        let payment_status = PaymentStatus::parse(&payment_str).ok_or_else(|| {
            StoreError::Invalid(format!("unknown payment status: {payment_str}"))
        })?;

        let method_str: String = row.try_get("payment_method")?;
        let payment_method = PaymentMethod::parse(&method_str).ok_or_else(|| {
            StoreError::Invalid(format!("unknown payment method: {method_str}"))
        })?;

        let address_json: serde_json::Value = row.try_get("shipping_address")?;
        let shipping_address: Address = serde_json::from_value(address_json)?;

        Ok(Order::from_parts(
            OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            BuyerId::from_uuid(row.try_get::<Uuid, _>("buyer_id")?),
            status,
            payment_status,
            payment_method,
            Money::from_cents(row.try_get("total_cents")?),
            row.try_get("placed_at")?,
            row.try_get("updated_at")?,
            shipping_address,
            items,
        ))
    }

    fn row_to_item(row: PgRow) -> Result<OrderItem> {
        let quantity: i32 = row.try_get("quantity")?;
        let quantity = u32::try_from(quantity)
            .map_err(|_| StoreError::Invalid(format!("negative quantity: {quantity}")))?;

        Ok(OrderItem::new(
            row.try_get::<String, _>("product_id")?,
            row.try_get::<String, _>("product_name")?,
            quantity,
            Money::from_cents(row.try_get("price_cents")?),
        ))
    }

    async fn fetch_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>> {
        let rows = sqlx::query(
            r#"
            SELECT product_id, product_name, quantity, price_cents
            FROM order_items
            WHERE order_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_item).collect()
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn get_order(&self, order_id: OrderId) -> Result<Order> {
        let row = sqlx::query(
            r#"
            SELECT id, buyer_id, status, payment_status, payment_method,
                   total_cents, placed_at, updated_at, shipping_address
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::OrderNotFound(order_id))?;

        let items = self.fetch_items(order_id).await?;
        Self::row_to_order(&row, items)
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

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, buyer_id, status, payment_status, payment_method,
                                total_cents, placed_at, updated_at, shipping_address)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.buyer_id.as_uuid())
        .bind(order.status.as_str())
        .bind(order.payment_status.as_str())
        .bind(order.payment_method.as_str())
        .bind(order.total_amount.cents())
        .bind(order.placed_at)
        .bind(order.updated_at)
        .bind(serde_json::to_value(&order.shipping_address)?)
        .execute(&mut *tx)
        .await?;

        for (position, item) in order.items().iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, position, product_id, product_name,
                                         quantity, price_cents)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(order.id.as_uuid())
            .bind(position as i32)
            .bind(item.product_id.as_str())
            .bind(&item.product_name)
            .bind(item.quantity as i32)
            .bind(item.price_at_purchase.cents())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(order)
    }

    async fn update_status(&self, order_id: OrderId, status: OrderStatus) -> Result<Order> {
        let result = sqlx::query(
            r#"
            UPDATE orders SET status = $2, updated_at = $3 WHERE id = $1
            "#,
        )
        .bind(order_id.as_uuid())
        .bind(status.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::OrderNotFound(order_id));
        }
        self.get_order(order_id).await
    }

    async fn update_payment_status(
        &self,
        order_id: OrderId,
        payment_status: PaymentStatus,
    ) -> Result<Order> {
        let result = sqlx::query(
            r#"
            UPDATE orders SET payment_status = $2, updated_at = $3 WHERE id = $1
            "#,
        )
        .bind(order_id.as_uuid())
        .bind(payment_status.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::OrderNotFound(order_id));
        }
        self.get_order(order_id).await
    }

    async fn cancel_order(&self, order_id: OrderId) -> Result<Order> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT status FROM orders WHERE id = $1 FOR UPDATE")
            .bind(order_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StoreError::OrderNotFound(order_id))?;

        let status_str: String = row.try_get("status")?;
        let status = OrderStatus::parse(&status_str)
            .ok_or_else(|| StoreError::Invalid(format!("unknown order status: {status_str}")))?;

        if !status.can_buyer_cancel() {
            return Err(StoreError::CancelNotAllowed { status });
        }

        sqlx::query("UPDATE orders SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(order_id.as_uuid())
            .bind(OrderStatus::Cancelled.as_str())
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        self.get_order(order_id).await
    }
}

/// PostgreSQL-backed inventory store implementation.
#[derive(Clone)]
pub struct PostgresInventoryStore {
    pool: PgPool,
}

impl PostgresInventoryStore {
    /// Creates a new PostgreSQL inventory store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn row_to_product(row: PgRow) -> Result<ProductRecord> {
        let stock: i32 = row.try_get("available_stock")?;
        let available_stock = u32::try_from(stock)
            .map_err(|_| StoreError::Invalid(format!("negative stock: {stock}")))?;

        Ok(ProductRecord {
            product_id: ProductId::new(row.try_get::<String, _>("id")?),
            seller_id: SellerId::from_uuid(row.try_get::<Uuid, _>("seller_id")?),
            name: row.try_get("name")?,
            sku: row.try_get("sku")?,
            price: Money::from_cents(row.try_get("price_cents")?),
            available_stock,
        })
    }
}

#[async_trait]
impl InventoryStore for PostgresInventoryStore {
    async fn get_product(&self, product_id: &ProductId) -> Result<ProductRecord> {
        let row = sqlx::query(
            r#"
            SELECT id, seller_id, name, sku, price_cents, available_stock
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(product_id.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::ProductNotFound(product_id.clone()))?;

        Self::row_to_product(row)
    }

    async fn products_by_seller(&self, seller_id: SellerId) -> Result<Vec<ProductRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, seller_id, name, sku, price_cents, available_stock
            FROM products
            WHERE seller_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(seller_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_product).collect()
    }

    async fn set_stock(&self, product_id: &ProductId, available_stock: u32) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE products SET available_stock = $2 WHERE id = $1
            "#,
        )
        .bind(product_id.as_str())
        .bind(available_stock as i32)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::ProductNotFound(product_id.clone()));
        }
        Ok(())
    }
}

//! PostgreSQL store integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency. Each test
//! works on its own orders, sellers, and uniquely-named products, so they
//! are safe to run in parallel. Run with:
//!
//! ```bash
//! cargo test -p stores --test postgres_integration
//! ```

use std::sync::Arc;

use chrono::Utc;
use common::{BuyerId, SellerId};
use domain::{Address, Money, OrderItem, OrderStatus, PaymentMethod, PaymentStatus, ProductId};
use sqlx::PgPool;
use stores::{
    InventoryStore, NewOrder, OrderStore, PostgresInventoryStore, PostgresOrderStore, StoreError,
};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use uuid::Uuid;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            // Create a temporary pool just to apply the schema
            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            PostgresOrderStore::new(temp_pool.clone())
                .run_migrations()
                .await
                .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get fresh stores with their own pool over the shared container
async fn get_test_stores() -> (PostgresOrderStore, PostgresInventoryStore) {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    (
        PostgresOrderStore::new(pool.clone()),
        PostgresInventoryStore::new(pool),
    )
}

fn address() -> Address {
    Address {
        recipient: "A. Buyer".to_string(),
        line1: "1 Main St".to_string(),
        line2: Some("Apt 2".to_string()),
        city: "Springfield".to_string(),
        postal_code: "12345".to_string(),
        country: "US".to_string(),
    }
}

/// Product ids are unique per call so parallel tests never collide.
fn unique_product_id(prefix: &str) -> ProductId {
    ProductId::new(format!("{prefix}-{}", Uuid::new_v4()))
}

async fn seed_product(
    inventory: &PostgresInventoryStore,
    product_id: &ProductId,
    seller_id: SellerId,
    price_cents: i64,
    stock: i32,
) {
    sqlx::query(
        r#"
        INSERT INTO products (id, seller_id, name, sku, price_cents, available_stock)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(product_id.as_str())
    .bind(seller_id.as_uuid())
    .bind(format!("Product {product_id}"))
    .bind(format!("SKU-{product_id}"))
    .bind(price_cents)
    .bind(stock)
    .execute(inventory.pool())
    .await
    .unwrap();
}

fn new_order(items: Vec<OrderItem>) -> NewOrder {
    NewOrder {
        buyer_id: BuyerId::new(),
        shipping_address: address(),
        payment_method: PaymentMethod::Gateway,
        items,
    }
}

#[tokio::test]
async fn create_and_fetch_order_roundtrip() {
    let (orders, _) = get_test_stores().await;

    let created = orders
        .create_order(new_order(vec![
            OrderItem::new("P1", "Vase", 2, Money::from_cents(1500)),
            OrderItem::new("P2", "Print", 1, Money::from_cents(500)),
        ]))
        .await
        .unwrap();

    assert_eq!(created.status, OrderStatus::Pending);
    assert_eq!(created.payment_status, PaymentStatus::Unpaid);
    assert_eq!(created.total_amount.cents(), 3500);

    // Everything survives the row mapping: items in position order, the
    // JSONB address snapshot, timestamps, and the money columns.
    let fetched = orders.get_order(created.id).await.unwrap();
    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.buyer_id, created.buyer_id);
    assert_eq!(fetched.payment_method, PaymentMethod::Gateway);
    assert_eq!(fetched.shipping_address, address());
    assert_eq!(fetched.total_amount.cents(), 3500);
    assert_eq!(fetched.items().len(), 2);
    assert_eq!(fetched.items()[0].product_id, ProductId::new("P1"));
    assert_eq!(fetched.items()[0].quantity, 2);
    assert_eq!(fetched.items()[0].price_at_purchase.cents(), 1500);
    assert_eq!(fetched.items()[1].product_id, ProductId::new("P2"));
}

#[tokio::test]
async fn status_and_payment_updates_persist() {
    let (orders, _) = get_test_stores().await;
    let order = orders
        .create_order(new_order(vec![OrderItem::new(
            "P1",
            "Vase",
            1,
            Money::from_cents(1000),
        )]))
        .await
        .unwrap();

    let updated = orders
        .update_status(order.id, OrderStatus::Confirmed)
        .await
        .unwrap();
    assert_eq!(updated.status, OrderStatus::Confirmed);
    assert!(updated.updated_at >= order.updated_at);

    let updated = orders
        .update_payment_status(order.id, PaymentStatus::Paid)
        .await
        .unwrap();
    assert_eq!(updated.payment_status, PaymentStatus::Paid);
    assert_eq!(updated.status, OrderStatus::Confirmed);

    // Items are untouched by either update.
    assert_eq!(updated.items(), order.items());
}

#[tokio::test]
async fn missing_order_is_not_found() {
    let (orders, _) = get_test_stores().await;

    let result = orders.get_order(common::OrderId::new()).await;
    assert!(matches!(result, Err(StoreError::OrderNotFound(_))));

    let result = orders
        .update_status(common::OrderId::new(), OrderStatus::Confirmed)
        .await;
    assert!(matches!(result, Err(StoreError::OrderNotFound(_))));
}

#[tokio::test]
async fn cancel_is_limited_to_pending_orders() {
    let (orders, _) = get_test_stores().await;
    let order = orders
        .create_order(new_order(vec![OrderItem::new(
            "P1",
            "Vase",
            1,
            Money::from_cents(1000),
        )]))
        .await
        .unwrap();

    let cancelled = orders.cancel_order(order.id).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);

    // A second order moved past pending rejects cancellation and keeps its
    // status.
    let order = orders
        .create_order(new_order(vec![OrderItem::new(
            "P1",
            "Vase",
            1,
            Money::from_cents(1000),
        )]))
        .await
        .unwrap();
    orders
        .update_status(order.id, OrderStatus::Shipped)
        .await
        .unwrap();

    let result = orders.cancel_order(order.id).await;
    assert!(matches!(
        result,
        Err(StoreError::CancelNotAllowed {
            status: OrderStatus::Shipped
        })
    ));
    let order = orders.get_order(order.id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Shipped);
}

#[tokio::test]
async fn unknown_status_row_is_rejected() {
    let (orders, _) = get_test_stores().await;
    let order = orders
        .create_order(new_order(vec![OrderItem::new(
            "P1",
            "Vase",
            1,
            Money::from_cents(1000),
        )]))
        .await
        .unwrap();

    // A row written by something that bypassed the store.
    sqlx::query("UPDATE orders SET status = 'archived', updated_at = $2 WHERE id = $1")
        .bind(order.id.as_uuid())
        .bind(Utc::now())
        .execute(orders.pool())
        .await
        .unwrap();

    let result = orders.get_order(order.id).await;
    assert!(matches!(result, Err(StoreError::Invalid(_))));
}

#[tokio::test]
async fn inventory_get_and_set_stock() {
    let (_, inventory) = get_test_stores().await;
    let seller = SellerId::new();
    let product_id = unique_product_id("VASE");
    seed_product(&inventory, &product_id, seller, 1500, 5).await;

    let record = inventory.get_product(&product_id).await.unwrap();
    assert_eq!(record.seller_id, seller);
    assert_eq!(record.price.cents(), 1500);
    assert_eq!(record.available_stock, 5);

    inventory.set_stock(&product_id, 3).await.unwrap();
    let record = inventory.get_product(&product_id).await.unwrap();
    assert_eq!(record.available_stock, 3);
}

#[tokio::test]
async fn inventory_missing_product_is_not_found() {
    let (_, inventory) = get_test_stores().await;
    let product_id = unique_product_id("GONE");

    let result = inventory.get_product(&product_id).await;
    assert!(matches!(result, Err(StoreError::ProductNotFound(_))));

    let result = inventory.set_stock(&product_id, 1).await;
    assert!(matches!(result, Err(StoreError::ProductNotFound(_))));
}

#[tokio::test]
async fn products_by_seller_filters_and_sorts() {
    let (_, inventory) = get_test_stores().await;
    let seller = SellerId::new();
    let other_seller = SellerId::new();

    // Prefixes force the expected lexicographic order within this seller.
    let first = unique_product_id("A");
    let second = unique_product_id("B");
    let foreign = unique_product_id("C");
    seed_product(&inventory, &second, seller, 1000, 2).await;
    seed_product(&inventory, &first, seller, 1000, 1).await;
    seed_product(&inventory, &foreign, other_seller, 1000, 3).await;

    let products = inventory.products_by_seller(seller).await.unwrap();
    assert_eq!(products.len(), 2);
    assert_eq!(products[0].product_id, first);
    assert_eq!(products[1].product_id, second);
}

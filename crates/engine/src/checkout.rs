//! Checkout orchestration and payment capture.

use common::BuyerId;
use domain::{Address, Cart, Order, OrderItem, PaymentMethod, PaymentStatus};
use stores::{InventoryStore, NewOrder, OrderStore};

use crate::config::EngineConfig;
use crate::error::Result;
use crate::gateway::{CallbackVerifier, GatewayHandle, PaymentCallback, PaymentGateway};
use crate::lifecycle::OrderLifecycle;

/// The result of a checkout attempt.
#[derive(Debug, Clone)]
pub enum CheckoutOutcome {
    /// Cash-on-delivery order placed; the cart was cleared.
    Placed { order: Order },

    /// Gateway order created; the client drives the payment UI with the
    /// handle, and the cart survives until the payment is verified.
    AwaitingPayment {
        order: Order,
        handle: GatewayHandle,
    },
}

/// Turns a cart into an order and finalizes gateway payments from signed
/// callbacks.
///
/// Failure at any step leaves the system in the last successfully-committed
/// state: an order that exists but whose gateway handle could not be
/// created simply stays pending and unpaid, the same residual state as an
/// abandoned payment.
pub struct CheckoutOrchestrator<O, I, G> {
    inventory: I,
    orders: O,
    gateway: G,
    lifecycle: OrderLifecycle<O, I>,
    verifier: CallbackVerifier,
    currency: String,
}

impl<O, I, G> CheckoutOrchestrator<O, I, G>
where
    O: OrderStore + Clone,
    I: InventoryStore + Clone,
    G: PaymentGateway,
{
    /// Creates an orchestrator over the given stores and gateway.
    pub fn new(orders: O, inventory: I, gateway: G, config: &EngineConfig) -> Self {
        let lifecycle = OrderLifecycle::new(orders.clone(), inventory.clone(), config.call_timeout);
        Self {
            inventory,
            orders,
            gateway,
            lifecycle,
            verifier: CallbackVerifier::new(config.gateway_secret.clone()),
            currency: config.currency.clone(),
        }
    }

    /// Returns the callback verifier (shared with gateway test doubles).
    pub fn verifier(&self) -> &CallbackVerifier {
        &self.verifier
    }

    /// Creates an order from the cart.
    ///
    /// Item prices and names are snapshotted from the current product
    /// records. Cash orders complete immediately and clear the cart; no
    /// stock commit happens here — that occurs later, when the order moves
    /// into a stock-affecting status with a verified payment.
    #[tracing::instrument(skip(self, cart, shipping_address), fields(lines = cart.len()))]
    pub async fn checkout(
        &self,
        buyer_id: BuyerId,
        cart: &mut Cart,
        shipping_address: Address,
        payment_method: PaymentMethod,
    ) -> Result<CheckoutOutcome> {
        metrics::counter!("checkout_attempts_total").increment(1);

        if cart.is_empty() {
            return Err(crate::error::EngineError::EmptyCart);
        }

        let mut items = Vec::with_capacity(cart.len());
        for line in cart.lines() {
            let product = self.inventory.get_product(&line.product_id).await?;
            items.push(OrderItem::new(
                line.product_id,
                product.name,
                line.quantity,
                product.price,
            ));
        }

        let order = self
            .orders
            .create_order(NewOrder {
                buyer_id,
                shipping_address,
                payment_method,
                items,
            })
            .await?;
        tracing::info!(order_id = %order.id, %payment_method, total = %order.total_amount,
            "order created");

        match payment_method {
            PaymentMethod::CashOnDelivery => {
                cart.clear();
                metrics::counter!("checkout_placed_total").increment(1);
                Ok(CheckoutOutcome::Placed { order })
            }
            PaymentMethod::Gateway => {
                let handle = self
                    .gateway
                    .create_gateway_order(order.id, order.total_amount, &self.currency)
                    .await?;
                Ok(CheckoutOutcome::AwaitingPayment { order, handle })
            }
        }
    }

    /// Finalizes a gateway payment from the client's success callback.
    ///
    /// Signature verification is the sole authority for marking the order
    /// paid; a mismatch rejects the attempt and leaves the order unpaid.
    /// The order is resolved from the callback's gateway order id, so a
    /// verified callback can only pay the order it was created for. On
    /// success the payment mark runs through the lifecycle pipeline, so an
    /// already-confirmed order commits its stock here; if that commit ends
    /// in a partial reconciliation failure the payment mark has already
    /// been persisted, so the cart is still cleared before the failure is
    /// surfaced.
    #[tracing::instrument(skip(self, cart, callback), fields(gateway_order_id = %callback.gateway_order_id))]
    pub async fn finalize_payment(
        &self,
        cart: &mut Cart,
        callback: &PaymentCallback,
    ) -> Result<Order> {
        self.verifier.verify(callback)?;
        let order_id = self
            .gateway
            .lookup_gateway_order(&callback.gateway_order_id)
            .await?;

        let order = match self
            .lifecycle
            .set_payment_status(order_id, PaymentStatus::Paid)
            .await
        {
            Ok(order) => order,
            Err(err @ crate::error::EngineError::PartialReconciliation { .. }) => {
                // The payment was captured and persisted; the purchase
                // completed even though some stock writes need a retry.
                cart.clear();
                return Err(err);
            }
            Err(err) => return Err(err),
        };

        cart.clear();
        metrics::counter!("payments_captured_total").increment(1);
        tracing::info!(%order_id, payment_id = %callback.payment_id, "payment captured");
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::SellerId;
    use domain::{Money, OrderStatus, ProductId};
    use stores::{InMemoryInventoryStore, InMemoryOrderStore, ProductRecord};

    use crate::error::EngineError;
    use crate::gateway::InMemoryPaymentGateway;

    struct Setup {
        orders: InMemoryOrderStore,
        inventory: InMemoryInventoryStore,
        gateway: InMemoryPaymentGateway,
        orchestrator: CheckoutOrchestrator<
            InMemoryOrderStore,
            InMemoryInventoryStore,
            InMemoryPaymentGateway,
        >,
    }

    fn setup() -> Setup {
        let orders = InMemoryOrderStore::new();
        let inventory = InMemoryInventoryStore::new();
        let gateway = InMemoryPaymentGateway::new();
        let orchestrator = CheckoutOrchestrator::new(
            orders.clone(),
            inventory.clone(),
            gateway.clone(),
            &EngineConfig::default(),
        );
        Setup {
            orders,
            inventory,
            gateway,
            orchestrator,
        }
    }

    fn address() -> Address {
        Address {
            recipient: "A. Buyer".to_string(),
            line1: "1 Main St".to_string(),
            line2: None,
            city: "Springfield".to_string(),
            postal_code: "12345".to_string(),
            country: "US".to_string(),
        }
    }

    fn seed(inventory: &InMemoryInventoryStore, id: &str, price_cents: i64, stock: u32) {
        inventory.insert_product(ProductRecord {
            product_id: ProductId::new(id),
            seller_id: SellerId::new(),
            name: format!("Product {id}"),
            sku: format!("SKU-{id}"),
            price: Money::from_cents(price_cents),
            available_stock: stock,
        });
    }

    fn cart_with(inventory: &InMemoryInventoryStore, id: &str, quantity: u32) -> Cart {
        let mut cart = Cart::new();
        let available = inventory.stock_of(&ProductId::new(id)).unwrap_or(0);
        cart.add(ProductId::new(id), quantity, available).unwrap();
        cart
    }

    #[tokio::test]
    async fn test_cash_checkout_places_order_without_gateway() {
        let s = setup();
        seed(&s.inventory, "P1", 1500, 5);
        let mut cart = cart_with(&s.inventory, "P1", 2);

        let outcome = s
            .orchestrator
            .checkout(
                BuyerId::new(),
                &mut cart,
                address(),
                PaymentMethod::CashOnDelivery,
            )
            .await
            .unwrap();

        let order = match outcome {
            CheckoutOutcome::Placed { order } => order,
            other => panic!("expected Placed, got {other:?}"),
        };
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_status, PaymentStatus::Unpaid);
        assert_eq!(order.total_amount.cents(), 3000);
        // Cash never touches the gateway; the cart is cleared; stock is
        // untouched at checkout time.
        assert_eq!(s.gateway.gateway_order_count(), 0);
        assert!(cart.is_empty());
        assert_eq!(s.inventory.stock_of(&ProductId::new("P1")), Some(5));
    }

    #[tokio::test]
    async fn test_gateway_checkout_returns_handle_and_keeps_cart() {
        let s = setup();
        seed(&s.inventory, "P1", 1500, 5);
        let mut cart = cart_with(&s.inventory, "P1", 1);

        let outcome = s
            .orchestrator
            .checkout(BuyerId::new(), &mut cart, address(), PaymentMethod::Gateway)
            .await
            .unwrap();

        let (order, handle) = match outcome {
            CheckoutOutcome::AwaitingPayment { order, handle } => (order, handle),
            other => panic!("expected AwaitingPayment, got {other:?}"),
        };
        assert_eq!(order.payment_status, PaymentStatus::Unpaid);
        assert_eq!(handle.amount, order.total_amount);
        assert_eq!(handle.currency, "USD");
        assert_eq!(s.gateway.gateway_order_count(), 1);
        // Cart survives until the payment is verified.
        assert!(!cart.is_empty());
    }

    #[tokio::test]
    async fn test_finalize_with_valid_signature_marks_paid() {
        let s = setup();
        seed(&s.inventory, "P1", 1500, 5);
        let mut cart = cart_with(&s.inventory, "P1", 1);

        let outcome = s
            .orchestrator
            .checkout(BuyerId::new(), &mut cart, address(), PaymentMethod::Gateway)
            .await
            .unwrap();
        let (order, handle) = match outcome {
            CheckoutOutcome::AwaitingPayment { order, handle } => (order, handle),
            other => panic!("expected AwaitingPayment, got {other:?}"),
        };

        let callback = s
            .gateway
            .complete_payment(s.orchestrator.verifier(), &handle.gateway_order_id);
        let finalized = s
            .orchestrator
            .finalize_payment(&mut cart, &callback)
            .await
            .unwrap();

        assert_eq!(finalized.id, order.id);
        assert_eq!(finalized.payment_status, PaymentStatus::Paid);
        assert!(cart.is_empty());
        // Payment alone does not commit stock for a pending order.
        assert_eq!(s.inventory.stock_of(&ProductId::new("P1")), Some(5));
    }

    #[tokio::test]
    async fn test_tampered_callback_is_rejected() {
        let s = setup();
        seed(&s.inventory, "P1", 1500, 5);
        let mut cart = cart_with(&s.inventory, "P1", 1);

        let outcome = s
            .orchestrator
            .checkout(BuyerId::new(), &mut cart, address(), PaymentMethod::Gateway)
            .await
            .unwrap();
        let (order, handle) = match outcome {
            CheckoutOutcome::AwaitingPayment { order, handle } => (order, handle),
            other => panic!("expected AwaitingPayment, got {other:?}"),
        };

        // Swap the payment id but keep the original signature.
        let mut callback = s
            .gateway
            .complete_payment(s.orchestrator.verifier(), &handle.gateway_order_id);
        callback.payment_id = "PAY-9999".to_string();

        let err = s
            .orchestrator
            .finalize_payment(&mut cart, &callback)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::SignatureInvalid));

        // The order stays unpaid and the cart is intact.
        let order = s.orders.get_order(order.id).await.unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Unpaid);
        assert!(!cart.is_empty());
    }

    #[tokio::test]
    async fn test_callback_pays_only_its_own_order() {
        let s = setup();
        seed(&s.inventory, "P1", 1500, 5);
        seed(&s.inventory, "P2", 990000, 5);

        // Two buyers, two gateway orders: a cheap one and an expensive one.
        let mut cart_a = cart_with(&s.inventory, "P1", 1);
        let outcome = s
            .orchestrator
            .checkout(BuyerId::new(), &mut cart_a, address(), PaymentMethod::Gateway)
            .await
            .unwrap();
        let (order_a, handle_a) = match outcome {
            CheckoutOutcome::AwaitingPayment { order, handle } => (order, handle),
            other => panic!("expected AwaitingPayment, got {other:?}"),
        };

        let mut cart_b = cart_with(&s.inventory, "P2", 1);
        let outcome = s
            .orchestrator
            .checkout(BuyerId::new(), &mut cart_b, address(), PaymentMethod::Gateway)
            .await
            .unwrap();
        let order_b = match outcome {
            CheckoutOutcome::AwaitingPayment { order, .. } => order,
            other => panic!("expected AwaitingPayment, got {other:?}"),
        };

        // Paying the cheap order finalizes the cheap order, whatever cart
        // the callback arrives with.
        let callback = s
            .gateway
            .complete_payment(s.orchestrator.verifier(), &handle_a.gateway_order_id);
        let finalized = s
            .orchestrator
            .finalize_payment(&mut cart_b, &callback)
            .await
            .unwrap();
        assert_eq!(finalized.id, order_a.id);

        let order_a = s.orders.get_order(order_a.id).await.unwrap();
        assert_eq!(order_a.payment_status, PaymentStatus::Paid);
        let order_b = s.orders.get_order(order_b.id).await.unwrap();
        assert_eq!(order_b.payment_status, PaymentStatus::Unpaid);
    }

    #[tokio::test]
    async fn test_callback_for_unknown_gateway_order_is_rejected() {
        let s = setup();
        seed(&s.inventory, "P1", 1500, 5);
        let mut cart = cart_with(&s.inventory, "P1", 1);

        let outcome = s
            .orchestrator
            .checkout(BuyerId::new(), &mut cart, address(), PaymentMethod::Gateway)
            .await
            .unwrap();
        let order = match outcome {
            CheckoutOutcome::AwaitingPayment { order, .. } => order,
            other => panic!("expected AwaitingPayment, got {other:?}"),
        };

        // Correctly signed, but for a gateway order this system never
        // created.
        let callback = s
            .gateway
            .complete_payment(s.orchestrator.verifier(), "GW-9999");
        let err = s
            .orchestrator
            .finalize_payment(&mut cart, &callback)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownGatewayOrder(_)));

        let order = s.orders.get_order(order.id).await.unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Unpaid);
        assert!(!cart.is_empty());
    }

    #[tokio::test]
    async fn test_partial_failure_after_capture_still_clears_cart() {
        let s = setup();
        seed(&s.inventory, "P1", 1500, 5);
        seed(&s.inventory, "P2", 2000, 5);
        let mut cart = Cart::new();
        cart.add(ProductId::new("P1"), 1, 5).unwrap();
        cart.add(ProductId::new("P2"), 1, 5).unwrap();

        let outcome = s
            .orchestrator
            .checkout(BuyerId::new(), &mut cart, address(), PaymentMethod::Gateway)
            .await
            .unwrap();
        let (order, handle) = match outcome {
            CheckoutOutcome::AwaitingPayment { order, handle } => (order, handle),
            other => panic!("expected AwaitingPayment, got {other:?}"),
        };

        // Seller confirms while unpaid, so the later payment capture is
        // the stock commit. One product's write is made to fail.
        let lifecycle = OrderLifecycle::new(
            s.orders.clone(),
            s.inventory.clone(),
            std::time::Duration::from_secs(5),
        );
        lifecycle
            .set_status(order.id, OrderStatus::Confirmed)
            .await
            .unwrap();
        s.inventory.set_fail_on_write(ProductId::new("P2"), true);

        let callback = s
            .gateway
            .complete_payment(s.orchestrator.verifier(), &handle.gateway_order_id);
        let err = s
            .orchestrator
            .finalize_payment(&mut cart, &callback)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::PartialReconciliation { .. }));

        // The payment mark stood, so the purchase completed and the cart
        // is cleared despite the surfaced failure.
        let order = s.orders.get_order(order.id).await.unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Paid);
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_abandoned_payment_leaves_order_pending_unpaid() {
        let s = setup();
        seed(&s.inventory, "P1", 1500, 5);
        let mut cart = cart_with(&s.inventory, "P1", 1);

        let outcome = s
            .orchestrator
            .checkout(BuyerId::new(), &mut cart, address(), PaymentMethod::Gateway)
            .await
            .unwrap();
        let order = match outcome {
            CheckoutOutcome::AwaitingPayment { order, .. } => order,
            other => panic!("expected AwaitingPayment, got {other:?}"),
        };

        // The buyer closes the payment UI: nothing else happens.
        let order = s.orders.get_order(order.id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_status, PaymentStatus::Unpaid);
    }

    #[tokio::test]
    async fn test_empty_cart_is_rejected() {
        let s = setup();
        let mut cart = Cart::new();

        let err = s
            .orchestrator
            .checkout(
                BuyerId::new(),
                &mut cart,
                address(),
                PaymentMethod::CashOnDelivery,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::EmptyCart));
        assert_eq!(s.orders.order_count(), 0);
    }

    #[tokio::test]
    async fn test_gateway_failure_leaves_order_in_last_committed_state() {
        let s = setup();
        seed(&s.inventory, "P1", 1500, 5);
        s.gateway.set_fail_on_create(true);
        let mut cart = cart_with(&s.inventory, "P1", 1);

        let err = s
            .orchestrator
            .checkout(BuyerId::new(), &mut cart, address(), PaymentMethod::Gateway)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::GatewayUnavailable(_)));

        // The order was the last committed step and survives, unpaid.
        assert_eq!(s.orders.order_count(), 1);
        assert!(!cart.is_empty());
    }

    #[tokio::test]
    async fn test_checkout_snapshots_current_prices() {
        let s = setup();
        seed(&s.inventory, "P1", 1500, 5);
        let mut cart = cart_with(&s.inventory, "P1", 2);

        let outcome = s
            .orchestrator
            .checkout(
                BuyerId::new(),
                &mut cart,
                address(),
                PaymentMethod::CashOnDelivery,
            )
            .await
            .unwrap();
        let order = match outcome {
            CheckoutOutcome::Placed { order } => order,
            other => panic!("expected Placed, got {other:?}"),
        };

        // A later price change does not touch the snapshot.
        seed(&s.inventory, "P1", 9900, 5);
        let fetched = s.orders.get_order(order.id).await.unwrap();
        assert_eq!(fetched.items()[0].price_at_purchase.cents(), 1500);
        assert_eq!(fetched.total_amount.cents(), 3000);
    }
}

//! Payment gateway adapter and callback verification.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::OrderId;
use domain::Money;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{EngineError, Result};

type HmacSha256 = Hmac<Sha256>;

/// The payment-intent handle returned by the gateway, used to drive the
/// client-side payment UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayHandle {
    /// The remote order ID assigned by the gateway.
    pub gateway_order_id: String,
    /// Amount the gateway will collect.
    pub amount: Money,
    /// ISO currency code.
    pub currency: String,
}

/// The success callback the gateway's client flow delivers after payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentCallback {
    pub gateway_order_id: String,
    pub payment_id: String,
    /// Hex-encoded HMAC-SHA256 over `"{gateway_order_id}|{payment_id}"`.
    pub signature: String,
}

/// Trait for the payment gateway's server-side API.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates a remote payment order for the given amount and returns the
    /// client-usable handle.
    async fn create_gateway_order(
        &self,
        order_id: OrderId,
        amount: Money,
        currency: &str,
    ) -> Result<GatewayHandle>;

    /// Resolves the local order a gateway order was created for.
    ///
    /// Payment capture derives the order from the callback's
    /// `gateway_order_id` through this lookup; a signed callback can only
    /// ever pay the order its gateway order was created for.
    async fn lookup_gateway_order(&self, gateway_order_id: &str) -> Result<OrderId>;
}

/// Verifies gateway callbacks against the server-held secret.
///
/// This is the sole authority for accepting a payment: a callback whose
/// signature does not match the expected HMAC is rejected regardless of
/// what else it claims.
#[derive(Clone)]
pub struct CallbackVerifier {
    secret: String,
}

impl CallbackVerifier {
    /// Creates a verifier for the given shared secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Computes the expected hex signature for a callback payload.
    ///
    /// Exposed so gateway test doubles can produce valid callbacks.
    pub fn sign(&self, gateway_order_id: &str, payment_id: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(format!("{gateway_order_id}|{payment_id}").as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Verifies a callback's signature with a constant-time comparison.
    pub fn verify(&self, callback: &PaymentCallback) -> Result<()> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|_| EngineError::SignatureInvalid)?;
        mac.update(format!("{}|{}", callback.gateway_order_id, callback.payment_id).as_bytes());

        let sig_bytes =
            hex::decode(&callback.signature).map_err(|_| EngineError::SignatureInvalid)?;
        mac.verify_slice(&sig_bytes).map_err(|_| {
            metrics::counter!("signature_rejections_total").increment(1);
            tracing::warn!(
                gateway_order_id = %callback.gateway_order_id,
                "payment callback signature mismatch"
            );
            EngineError::SignatureInvalid
        })
    }
}

#[derive(Debug, Default)]
struct InMemoryGatewayState {
    orders: HashMap<String, (OrderId, Money)>,
    next_id: u32,
    next_payment_id: u32,
    fail_on_create: bool,
}

/// In-memory payment gateway for testing.
#[derive(Clone, Default)]
pub struct InMemoryPaymentGateway {
    state: Arc<RwLock<InMemoryGatewayState>>,
}

impl InMemoryPaymentGateway {
    /// Creates a new in-memory payment gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the gateway to fail on the next create call.
    pub fn set_fail_on_create(&self, fail: bool) {
        self.state.write().unwrap().fail_on_create = fail;
    }

    /// Returns the number of gateway orders created.
    pub fn gateway_order_count(&self) -> usize {
        self.state.read().unwrap().orders.len()
    }

    /// Simulates the client completing payment: produces a callback signed
    /// with the given verifier's secret.
    pub fn complete_payment(
        &self,
        verifier: &CallbackVerifier,
        gateway_order_id: &str,
    ) -> PaymentCallback {
        let mut state = self.state.write().unwrap();
        state.next_payment_id += 1;
        let payment_id = format!("PAY-{:04}", state.next_payment_id);
        let signature = verifier.sign(gateway_order_id, &payment_id);
        PaymentCallback {
            gateway_order_id: gateway_order_id.to_string(),
            payment_id,
            signature,
        }
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn create_gateway_order(
        &self,
        order_id: OrderId,
        amount: Money,
        currency: &str,
    ) -> Result<GatewayHandle> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_create {
            return Err(EngineError::GatewayUnavailable(
                "gateway order creation failed".to_string(),
            ));
        }

        state.next_id += 1;
        let gateway_order_id = format!("GW-{:04}", state.next_id);
        state.orders.insert(gateway_order_id.clone(), (order_id, amount));

        Ok(GatewayHandle {
            gateway_order_id,
            amount,
            currency: currency.to_string(),
        })
    }

    async fn lookup_gateway_order(&self, gateway_order_id: &str) -> Result<OrderId> {
        let state = self.state.read().unwrap();
        state
            .orders
            .get(gateway_order_id)
            .map(|(order_id, _)| *order_id)
            .ok_or_else(|| EngineError::UnknownGatewayOrder(gateway_order_id.to_string()))
    }
}

//! Order lifecycle and inventory reconciliation engine.
//!
//! The engine keeps one invariant: available stock reflects exactly the set
//! of orders currently in the stock-committed state. Status and payment
//! edits flow through [`OrderLifecycle`], which classifies each edit as a
//! stock commit, release, or no-op, validates commits against current
//! inventory, and applies the resulting deltas through the reconciler.
//! Checkout and payment capture flow through [`CheckoutOrchestrator`],
//! which creates orders and finalizes gateway payments from signed
//! callbacks.

pub mod checkout;
pub mod config;
pub mod error;
pub mod gateway;
pub mod lifecycle;
pub mod reconciler;
pub mod validator;

pub use checkout::{CheckoutOrchestrator, CheckoutOutcome};
pub use config::EngineConfig;
pub use error::{EngineError, ItemFailure, Result};
pub use gateway::{
    CallbackVerifier, GatewayHandle, InMemoryPaymentGateway, PaymentCallback, PaymentGateway,
};
pub use lifecycle::{OrderLifecycle, seller_inventory};
pub use reconciler::{ReconcileOutcome, StockReconciler};
pub use validator::{Shortfall, check_stock};

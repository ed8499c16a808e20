//! Domain model for the storefront order engine.
//!
//! This crate holds the order model, the order/payment status machine, the
//! stock-committed predicate, and the transition detector that classifies
//! status edits as stock commits or releases. Everything here is pure and
//! synchronous; the async store seams live in the `stores` crate.

pub mod cart;
pub mod error;
pub mod order;
pub mod status;
pub mod transition;
pub mod value_objects;

pub use cart::{Cart, CartLine};
pub use error::{CartError, OrderError};
pub use order::Order;
pub use status::{OrderStatus, PaymentMethod, PaymentStatus, StatusSnapshot};
pub use transition::{StockDirection, StockTransition, TransitionTracker, classify};
pub use value_objects::{Address, Money, OrderItem, ProductId};

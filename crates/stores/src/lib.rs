//! Store seams for the order engine.
//!
//! The order store and inventory store are external collaborators; this
//! crate defines their contracts as async traits plus two backends apiece:
//! an in-memory implementation with failure-injection switches for tests,
//! and a PostgreSQL implementation for deployments that host the stores
//! locally.

pub mod error;
pub mod inventory_store;
pub mod memory;
pub mod order_store;
pub mod postgres;

pub use error::{Result, StoreError};
pub use inventory_store::{InventoryStore, ProductRecord};
pub use memory::{InMemoryInventoryStore, InMemoryOrderStore};
pub use order_store::{NewOrder, OrderStore};
pub use postgres::{PostgresInventoryStore, PostgresOrderStore};

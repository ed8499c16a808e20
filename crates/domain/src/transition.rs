//! Stock transition detection.
//!
//! A status or payment edit either moves an order into the stock-committed
//! state (a commit, decrementing inventory), out of it (a release, restoring
//! inventory), or leaves the predicate unchanged. Classification is a pure
//! comparison of two [`StatusSnapshot`]s; no global state is consulted.

use std::collections::HashMap;

use common::OrderId;
use serde::{Deserialize, Serialize};

use crate::status::StatusSnapshot;

/// The direction of an inventory adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockDirection {
    /// Decrement stock by the order's quantities.
    Commit,

    /// Restore stock by the order's quantities.
    Release,
}

impl std::fmt::Display for StockDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StockDirection::Commit => write!(f, "commit"),
            StockDirection::Release => write!(f, "release"),
        }
    }
}

/// The classification of a status edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StockTransition {
    /// The order entered the stock-committed state.
    Commit,

    /// The order left the stock-committed state.
    Release,

    /// The stock-committed predicate did not change.
    NoOp,
}

impl StockTransition {
    /// Returns the inventory direction this transition implies, if any.
    pub fn direction(&self) -> Option<StockDirection> {
        match self {
            StockTransition::Commit => Some(StockDirection::Commit),
            StockTransition::Release => Some(StockDirection::Release),
            StockTransition::NoOp => None,
        }
    }
}

/// Classifies the edit from `prev` to `curr`.
///
/// `Commit` iff the order was not stock-committed and now is; `Release` iff
/// it was and no longer is; `NoOp` otherwise, including "still committed"
/// and "still uncommitted".
pub fn classify(prev: StatusSnapshot, curr: StatusSnapshot) -> StockTransition {
    match (prev.stock_committed(), curr.stock_committed()) {
        (false, true) => StockTransition::Commit,
        (true, false) => StockTransition::Release,
        _ => StockTransition::NoOp,
    }
}

/// Explicit per-order baseline tracking for observers that see orders
/// change over time (dashboards polling the order store).
///
/// On the first observation of an order the tracker records the baseline
/// and reports `NoOp` unconditionally: an unknown previous state is never a
/// transition, so a page reload cannot double-commit stock. Subsequent
/// observations classify against the stored baseline and advance it.
#[derive(Debug, Clone, Default)]
pub struct TransitionTracker {
    baselines: HashMap<OrderId, StatusSnapshot>,
}

impl TransitionTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Observes the current snapshot for an order and classifies the change
    /// since the last observation.
    pub fn observe(&mut self, order_id: OrderId, curr: StatusSnapshot) -> StockTransition {
        match self.baselines.insert(order_id, curr) {
            None => StockTransition::NoOp,
            Some(prev) => classify(prev, curr),
        }
    }

    /// Returns the recorded baseline for an order, if one exists.
    pub fn baseline(&self, order_id: OrderId) -> Option<StatusSnapshot> {
        self.baselines.get(&order_id).copied()
    }

    /// Drops the baseline for an order.
    pub fn forget(&mut self, order_id: OrderId) {
        self.baselines.remove(&order_id);
    }
}

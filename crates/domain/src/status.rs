//! Order and payment status machine.

use serde::{Deserialize, Serialize};

/// The fulfillment status of an order.
///
/// Forward path:
/// ```text
/// Pending ──► Confirmed ──► Shipped ──► Delivered
///    │
///    └──► Cancelled (buyer-initiated; sellers may cancel from any state)
/// ```
///
/// Seller-side edits are deliberately unrestricted: the dashboard may move
/// an order backwards (e.g. `Shipped` back to `Confirmed`) and the stock
/// transition detector absorbs whatever edit comes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order placed, awaiting seller confirmation.
    #[default]
    Pending,

    /// Seller accepted the order.
    Confirmed,

    /// Order handed to the carrier.
    Shipped,

    /// Order received by the buyer.
    Delivered,

    /// Order cancelled (terminal).
    Cancelled,
}

impl OrderStatus {
    /// Returns true if an order in this status holds stock once it is paid.
    pub fn affects_stock(&self) -> bool {
        matches!(
            self,
            OrderStatus::Confirmed | OrderStatus::Shipped | OrderStatus::Delivered
        )
    }

    /// Returns true if a buyer may cancel an order in this status.
    pub fn can_buyer_cancel(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Returns true if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Parses a status from its string name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "confirmed" => Some(OrderStatus::Confirmed),
            "shipped" => Some(OrderStatus::Shipped),
            "delivered" => Some(OrderStatus::Delivered),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The payment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// No verified payment exists for the order.
    #[default]
    Unpaid,

    /// Payment was captured and verified.
    Paid,

    /// A payment attempt was made and rejected.
    Failed,
}

impl PaymentStatus {
    /// Returns the payment status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
        }
    }

    /// Parses a payment status from its string name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unpaid" => Some(PaymentStatus::Unpaid),
            "paid" => Some(PaymentStatus::Paid),
            "failed" => Some(PaymentStatus::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the buyer chose to pay at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Pay the carrier on delivery; no gateway involvement.
    CashOnDelivery,

    /// Online payment captured through the gateway adapter.
    Gateway,
}

impl PaymentMethod {
    /// Returns the payment method name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CashOnDelivery => "cash_on_delivery",
            PaymentMethod::Gateway => "gateway",
        }
    }

    /// Parses a payment method from its string name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cash_on_delivery" => Some(PaymentMethod::CashOnDelivery),
            "gateway" => Some(PaymentMethod::Gateway),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A point-in-time view of an order's `(status, payment_status)` pair.
///
/// The transition detector compares two of these; nothing else in the
/// workspace is allowed to re-derive the stock-committed predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
}

impl StatusSnapshot {
    /// Creates a snapshot from a status pair.
    pub fn new(status: OrderStatus, payment_status: PaymentStatus) -> Self {
        Self {
            status,
            payment_status,
        }
    }

    /// Returns true if an order in this snapshot holds committed stock.
    ///
    /// The sole definition of the stock-committed predicate: the order is in
    /// a stock-affecting status and its payment is verified.
    pub fn stock_committed(&self) -> bool {
        self.status.affects_stock() && self.payment_status == PaymentStatus::Paid
    }
}

impl std::fmt::Display for StatusSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.status, self.payment_status)
    }
}

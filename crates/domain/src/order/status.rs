//! Order status machine.

use serde::{Deserialize, Serialize};

/// The status of an order.
///
/// Any status may follow any other. What matters is which side of the
/// holding line a change crosses:
/// ```text
///   holding:      Pending  Confirmed  Open  Delivered
///   not holding:  Cancelled  Failed  Refunded
/// ```
/// Crossing into the holding set reserves the order's items, crossing out
/// releases them, and a change within one set touches no stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Open,
    Delivered,
    Cancelled,
    Failed,
    Refunded,
}

/// Inventory direction of a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockEffect {
    /// Take the order's items out of stock.
    Reserve,
    /// Put the order's items back into stock.
    Release,
    NoChange,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 7] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Open,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
        OrderStatus::Failed,
        OrderStatus::Refunded,
    ];

    /// Returns true if an order in this status keeps its items reserved.
    pub fn holds_inventory(&self) -> bool {
        matches!(
            self,
            OrderStatus::Pending | OrderStatus::Confirmed | OrderStatus::Open | OrderStatus::Delivered
        )
    }

    /// Classifies a change from `self` to `to`.
    pub fn transition_effect(&self, to: OrderStatus) -> StockEffect {
        match (self.holds_inventory(), to.holds_inventory()) {
            (false, true) => StockEffect::Reserve,
            (true, false) => StockEffect::Release,
            _ => StockEffect::NoChange,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::Open => "Open",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::Failed => "Failed",
            OrderStatus::Refunded => "Refunded",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

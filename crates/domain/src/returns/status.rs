use serde::{Deserialize, Serialize};

use crate::order::OrderStatus;

/// The status of a return.
///
/// Every return status implies a status for its order: a return that is
/// still live or has gone through refunds the order, a rejected or
/// cancelled one puts it back to `Delivered`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ReturnStatus {
    #[default]
    Open,
    Accepted,
    Rejected,
    Completed,
    Cancelled,
}

impl ReturnStatus {
    pub const ALL: [ReturnStatus; 5] = [
        ReturnStatus::Open,
        ReturnStatus::Accepted,
        ReturnStatus::Rejected,
        ReturnStatus::Completed,
        ReturnStatus::Cancelled,
    ];

    /// The status the linked order is forced into when the return enters
    /// this status.
    pub fn forced_order_status(&self) -> OrderStatus {
        match self {
            ReturnStatus::Open | ReturnStatus::Accepted | ReturnStatus::Completed => {
                OrderStatus::Refunded
            }
            ReturnStatus::Rejected | ReturnStatus::Cancelled => OrderStatus::Delivered,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnStatus::Open => "Open",
            ReturnStatus::Accepted => "Accepted",
            ReturnStatus::Rejected => "Rejected",
            ReturnStatus::Completed => "Completed",
            ReturnStatus::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for ReturnStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forced_order_status() {
        assert_eq!(ReturnStatus::Open.forced_order_status(), OrderStatus::Refunded);
        assert_eq!(ReturnStatus::Accepted.forced_order_status(), OrderStatus::Refunded);
        assert_eq!(ReturnStatus::Completed.forced_order_status(), OrderStatus::Refunded);
        assert_eq!(ReturnStatus::Rejected.forced_order_status(), OrderStatus::Delivered);
        assert_eq!(ReturnStatus::Cancelled.forced_order_status(), OrderStatus::Delivered);
    }

    #[test]
    fn test_display() {
        let names: Vec<_> = ReturnStatus::ALL.iter().map(ToString::to_string).collect();
        assert_eq!(names, ["Open", "Accepted", "Rejected", "Completed", "Cancelled"]);
    }
}

//! Order aggregate and related types.

mod aggregate;
mod commands;
mod events;
mod status;
mod value_objects;

pub use aggregate::Order;
pub use commands::{OrderChanges, PlaceOrder};
pub use events::{
    DeliveryUpdatedData, ItemsReplacedData, OrderEvent, OrderPlacedData, PaymentUpdatedData,
    ReturnLinkChangedData, StatusChangedData,
};
pub use status::{OrderStatus, StockEffect};
pub use value_objects::{ContactDetails, DeliveryInfo, ItemId, OrderItem, PaymentInfo};

use common::{AggregateId, ProductId};
use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Order has not been placed")]
    NotPlaced,

    #[error("Order already placed")]
    AlreadyPlaced,

    #[error("Order has no items")]
    NoItems,

    #[error("Invalid quantity for {product_id}: {quantity} (must be greater than 0)")]
    InvalidQuantity { product_id: ProductId, quantity: u32 },

    #[error("Missing {0}")]
    MissingField(&'static str),

    /// An order can have at most one return.
    #[error("Order already has return {return_id}")]
    ReturnAlreadyLinked { return_id: AggregateId },
}

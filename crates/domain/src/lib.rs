//! Order and return aggregates for the order lifecycle engine.
//!
//! - [`Aggregate`] / [`DomainEvent`]: event-sourced entity traits
//! - [`Repository`]: load/append against an `EventStore` with version checks
//! - [`Order`] with its status machine ([`OrderStatus`], [`StockEffect`])
//! - [`Return`] with the order status each return status forces
//! - [`MethodDirectory`] / [`UserDirectory`]: lookups of referenced records

pub mod aggregate;
pub mod directory;
pub mod error;
pub mod order;
pub mod repository;
pub mod returns;

pub use aggregate::{Aggregate, DomainEvent};
pub use directory::{InMemoryDirectory, Method, MethodDirectory, MethodKind, User, UserDirectory};
pub use error::DomainError;
pub use order::{
    ContactDetails, DeliveryInfo, ItemId, Order, OrderChanges, OrderError, OrderEvent, OrderItem,
    OrderStatus, PaymentInfo, PlaceOrder, StockEffect,
};
pub use repository::Repository;
pub use returns::{Return, ReturnChanges, ReturnError, ReturnEvent, ReturnStatus};

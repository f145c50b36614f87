//! Identifiers and value types shared across the order lifecycle crates.

mod money;
mod types;

pub use money::Money;
pub use types::{AggregateId, MethodId, ProductId, UserId};

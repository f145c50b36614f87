//! Append-only journal for event-sourced orders and returns.
//!
//! Every aggregate stream is versioned; appends carry the version the writer
//! loaded so that two writers racing on the same order cannot both commit.

pub mod error;
pub mod event;
pub mod memory;
pub mod postgres;
pub mod store;

pub use common::AggregateId;
pub use error::{EventStoreError, Result};
pub use event::{EventEnvelope, EventId, Version};
pub use memory::InMemoryEventStore;
pub use postgres::PostgresEventStore;
pub use store::{AppendOptions, EventStore};

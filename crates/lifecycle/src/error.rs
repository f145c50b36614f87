//! Lifecycle error types.

use common::{AggregateId, MethodId, ProductId, UserId};
use domain::{DomainError, MethodKind, OrderError, ReturnError};
use inventory::{InventoryError, Shortfall, format_shortfalls};
use thiserror::Error;

/// Errors returned by order and return operations.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Order not found: {0}")]
    OrderNotFound(AggregateId),

    #[error("Return not found: {0}")]
    ReturnNotFound(AggregateId),

    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    #[error("Method not found: {0}")]
    MethodNotFound(MethodId),

    #[error("User not found: {0}")]
    UserNotFound(UserId),

    /// The write was rejected before anything was committed.
    #[error("Insufficient stock: {}", format_shortfalls(.0))]
    InsufficientStock(Vec<Shortfall>),

    /// The aggregate write is durable but the stock side effect that had to
    /// follow it did not happen. Needs manual reconciliation.
    #[error("Inconsistent stock reaction for {aggregate_id}: {reason}")]
    InconsistentReaction {
        aggregate_id: AggregateId,
        reason: String,
    },

    /// Optimistic concurrency retries ran out.
    #[error("Concurrent modification of {aggregate_id}: gave up after {attempts} attempts")]
    Conflict {
        aggregate_id: AggregateId,
        attempts: u32,
    },

    /// The runtime stopped the task running the write.
    #[error("Write interrupted: {0}")]
    Interrupted(String),

    #[error("Method {method_id} is not a {expected} method")]
    WrongMethodKind {
        method_id: MethodId,
        expected: MethodKind,
    },

    #[error("Invalid order: {0}")]
    Order(#[from] OrderError),

    #[error("Invalid return: {0}")]
    Return(#[from] ReturnError),

    #[error("Domain error: {0}")]
    Domain(DomainError),

    #[error("Inventory error: {0}")]
    Inventory(InventoryError),
}

impl LifecycleError {
    /// True for errors a client can fix by changing the request.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            LifecycleError::WrongMethodKind { .. }
                | LifecycleError::Order(_)
                | LifecycleError::Return(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            LifecycleError::OrderNotFound(_)
                | LifecycleError::ReturnNotFound(_)
                | LifecycleError::ProductNotFound(_)
                | LifecycleError::MethodNotFound(_)
                | LifecycleError::UserNotFound(_)
        )
    }
}

impl From<DomainError> for LifecycleError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Order(e) => LifecycleError::Order(e),
            DomainError::Return(e) => LifecycleError::Return(e),
            other => LifecycleError::Domain(other),
        }
    }
}

impl From<InventoryError> for LifecycleError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::InsufficientStock { shortfalls } => {
                LifecycleError::InsufficientStock(shortfalls)
            }
            InventoryError::ProductNotFound(id) => LifecycleError::ProductNotFound(id),
            other => LifecycleError::Inventory(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, LifecycleError>;

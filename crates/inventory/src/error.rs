use common::ProductId;
use serde::Serialize;
use thiserror::Error;

/// A product that could not cover its share of a reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Shortfall {
    pub product_id: ProductId,
    pub requested: u64,
    pub available: u64,
}

impl std::fmt::Display for Shortfall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (requested {}, available {})",
            self.product_id, self.requested, self.available
        )
    }
}

/// Errors that can occur in the inventory ledger.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// One or more products cannot cover the requested quantity. Nothing was
    /// subtracted.
    #[error("Insufficient stock: {}", format_shortfalls(.shortfalls))]
    InsufficientStock { shortfalls: Vec<Shortfall> },

    /// The product does not exist in the catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// Adding stock back would overflow the counter.
    #[error("Stock overflow for product {0}")]
    StockOverflow(ProductId),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Joins shortfalls as `SKU (requested n, available m), ...`.
pub fn format_shortfalls(shortfalls: &[Shortfall]) -> String {
    shortfalls
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, InventoryError>;

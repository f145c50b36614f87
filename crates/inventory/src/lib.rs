//! Inventory ledger for the order lifecycle.
//!
//! The ledger owns each product's available stock. Reservations are
//! all-or-nothing across every product they name and the check-and-subtract
//! for a product is a single atomic step, so concurrent reservations can
//! never oversell.

pub mod error;
pub mod ledger;
pub mod memory;
pub mod postgres;

pub use error::{InventoryError, Result, Shortfall, format_shortfalls};
pub use ledger::{InventoryLedger, Product, ProductCatalog, StockLine, merge_lines};
pub use memory::InMemoryInventory;
pub use postgres::PostgresInventory;

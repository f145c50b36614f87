//! Order lifecycle and inventory consistency.
//!
//! [`OrderLifecycle`] is the single entry point for order and return
//! writes. Each write is one unit of work: the [`reaction`] engine decides
//! which stock to move, the ledger moves it around the journal append, and
//! a failed append is compensated.

pub mod config;
pub mod error;
pub mod reaction;
pub mod requests;
pub mod service;

pub use config::{ItemReplacement, LifecycleConfig};
pub use error::{LifecycleError, Result};
pub use reaction::{StockReaction, held_quantities, item_lines, on_order_inserted, on_order_updated};
pub use requests::{ItemRequest, NewOrder, NewReturn, OrderUpdate, ReturnUpdate};
pub use service::{OrderLifecycle, OrderWrite, in_memory};

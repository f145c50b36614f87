//! Return aggregate: a refund request against exactly one order.

mod aggregate;
mod events;
mod status;

pub use aggregate::{Return, ReturnChanges};
pub use events::{ReturnEvent, ReturnMessageUpdatedData, ReturnRequestedData, ReturnStatusChangedData};
pub use status::ReturnStatus;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReturnError {
    #[error("Return has not been requested")]
    NotRequested,

    #[error("Return already requested")]
    AlreadyRequested,
}

use chrono::{DateTime, Utc};
use common::AggregateId;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

use super::ReturnStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ReturnEvent {
    ReturnRequested(ReturnRequestedData),
    ReturnStatusChanged(ReturnStatusChangedData),
    ReturnMessageUpdated(ReturnMessageUpdatedData),
}

impl DomainEvent for ReturnEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ReturnEvent::ReturnRequested(_) => "ReturnRequested",
            ReturnEvent::ReturnStatusChanged(_) => "ReturnStatusChanged",
            ReturnEvent::ReturnMessageUpdated(_) => "ReturnMessageUpdated",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnRequestedData {
    pub return_id: AggregateId,
    pub order_id: AggregateId,
    pub message: String,
    pub requested_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnStatusChangedData {
    pub from: ReturnStatus,
    pub to: ReturnStatus,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnMessageUpdatedData {
    pub message: String,
    pub updated_at: DateTime<Utc>,
}

impl ReturnEvent {
    pub fn return_requested(
        return_id: AggregateId,
        order_id: AggregateId,
        message: impl Into<String>,
    ) -> Self {
        ReturnEvent::ReturnRequested(ReturnRequestedData {
            return_id,
            order_id,
            message: message.into(),
            requested_at: Utc::now(),
        })
    }

    pub fn status_changed(from: ReturnStatus, to: ReturnStatus) -> Self {
        ReturnEvent::ReturnStatusChanged(ReturnStatusChangedData {
            from,
            to,
            changed_at: Utc::now(),
        })
    }

    pub fn message_updated(message: impl Into<String>) -> Self {
        ReturnEvent::ReturnMessageUpdated(ReturnMessageUpdatedData {
            message: message.into(),
            updated_at: Utc::now(),
        })
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ReturnEvent::ReturnRequested(data) => data.requested_at,
            ReturnEvent::ReturnStatusChanged(data) => data.changed_at,
            ReturnEvent::ReturnMessageUpdated(data) => data.updated_at,
        }
    }
}

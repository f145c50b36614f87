use chrono::{DateTime, Utc};
use common::AggregateId;
use event_store::Version;
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;

use super::{ReturnError, ReturnEvent, ReturnStatus};

/// Return aggregate root.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Return {
    id: Option<AggregateId>,

    #[serde(default)]
    version: Version,

    order_id: Option<AggregateId>,
    message: String,
    status: ReturnStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// A partial return update.
#[derive(Debug, Clone, Default)]
pub struct ReturnChanges {
    pub status: Option<ReturnStatus>,
    pub message: Option<String>,
}

impl Aggregate for Return {
    type Event = ReturnEvent;

    fn aggregate_type() -> &'static str {
        "Return"
    }

    fn id(&self) -> Option<AggregateId> {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn apply(&mut self, event: Self::Event) {
        self.updated_at = event.occurred_at();
        match event {
            ReturnEvent::ReturnRequested(data) => {
                self.id = Some(data.return_id);
                self.order_id = Some(data.order_id);
                self.message = data.message;
                self.status = ReturnStatus::Open;
                self.created_at = data.requested_at;
            }
            ReturnEvent::ReturnStatusChanged(data) => self.status = data.to,
            ReturnEvent::ReturnMessageUpdated(data) => self.message = data.message,
        }
    }
}

impl Return {
    pub fn order_id(&self) -> Option<AggregateId> {
        self.order_id
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> ReturnStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Opens a return against `order_id` in status `Open`.
    pub fn request(
        &self,
        return_id: AggregateId,
        order_id: AggregateId,
        message: impl Into<String>,
    ) -> Result<Vec<ReturnEvent>, ReturnError> {
        if self.id.is_some() {
            return Err(ReturnError::AlreadyRequested);
        }
        Ok(vec![ReturnEvent::return_requested(
            return_id, order_id, message,
        )])
    }

    /// Decides the events for a partial update. Unchanged fields produce
    /// no event.
    pub fn update(&self, changes: ReturnChanges) -> Result<Vec<ReturnEvent>, ReturnError> {
        if self.id.is_none() {
            return Err(ReturnError::NotRequested);
        }

        let mut events = Vec::new();
        if let Some(message) = changes.message
            && message != self.message
        {
            events.push(ReturnEvent::message_updated(message));
        }
        if let Some(status) = changes.status
            && status != self.status
        {
            events.push(ReturnEvent::status_changed(self.status, status));
        }
        Ok(events)
    }

    /// Returns the status change `events` would make, if any.
    pub fn status_change(&self, events: &[ReturnEvent]) -> Option<(ReturnStatus, ReturnStatus)> {
        events.iter().rev().find_map(|event| match event {
            ReturnEvent::ReturnStatusChanged(data) => Some((self.status, data.to)),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn requested() -> Return {
        let mut ret = Return::default();
        let events = ret
            .request(AggregateId::new(), AggregateId::new(), "wrong size")
            .unwrap();
        ret.apply_events(events);
        ret
    }

    #[test]
    fn test_request_opens_return() {
        let ret = requested();
        assert!(ret.id().is_some());
        assert!(ret.order_id().is_some());
        assert_eq!(ret.status(), ReturnStatus::Open);
        assert_eq!(ret.message(), "wrong size");
    }

    #[test]
    fn test_cannot_request_twice() {
        let ret = requested();
        let result = ret.request(AggregateId::new(), AggregateId::new(), "again");
        assert!(matches!(result, Err(ReturnError::AlreadyRequested)));
    }

    #[test]
    fn test_update_requires_requested_return() {
        let result = Return::default().update(ReturnChanges::default());
        assert!(matches!(result, Err(ReturnError::NotRequested)));
    }

    #[test]
    fn test_message_only_update_has_no_status_change() {
        let ret = requested();
        let events = ret
            .update(ReturnChanges {
                status: None,
                message: Some("arrived damaged".to_string()),
            })
            .unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(ret.status_change(&events), None);
        assert_eq!(ret.preview(&events).message(), "arrived damaged");
    }

    #[test]
    fn test_unchanged_status_produces_no_event() {
        let ret = requested();
        let events = ret
            .update(ReturnChanges {
                status: Some(ReturnStatus::Open),
                message: Some("wrong size".to_string()),
            })
            .unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn test_status_change_is_reported() {
        let ret = requested();
        let events = ret
            .update(ReturnChanges {
                status: Some(ReturnStatus::Rejected),
                message: None,
            })
            .unwrap();

        assert_eq!(
            ret.status_change(&events),
            Some((ReturnStatus::Open, ReturnStatus::Rejected))
        );
        assert_eq!(ret.preview(&events).status(), ReturnStatus::Rejected);
    }
}

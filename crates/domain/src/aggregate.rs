//! Aggregate and domain event traits.

use common::AggregateId;
use event_store::Version;
use serde::{Serialize, de::DeserializeOwned};

/// A fact recorded in an aggregate's stream.
///
/// Events are named in the past tense and never change once written.
pub trait DomainEvent: Serialize + DeserializeOwned + Send + Sync + Clone {
    /// Name stored in the journal's `event_type` column.
    fn event_type(&self) -> &'static str;
}

/// An event-sourced entity.
///
/// State is rebuilt by replaying the aggregate's events through `apply`,
/// which must be pure: no I/O, no failure, same input gives same output.
/// Command methods live on the concrete types and return the events a change
/// would produce without applying them.
pub trait Aggregate: Default + Clone + Send + Sync + Sized {
    type Event: DomainEvent;

    /// Stream type name ("Order", "Return").
    fn aggregate_type() -> &'static str;

    /// None until the creating event has been applied.
    fn id(&self) -> Option<AggregateId>;

    fn version(&self) -> Version;

    fn set_version(&mut self, version: Version);

    fn apply(&mut self, event: Self::Event);

    fn apply_events(&mut self, events: impl IntoIterator<Item = Self::Event>) {
        for event in events {
            self.apply(event);
        }
    }

    /// Returns the state this aggregate would have after `events`, leaving
    /// `self` untouched. The version is advanced by one per event.
    fn preview(&self, events: &[Self::Event]) -> Self {
        let mut next = self.clone();
        let mut version = next.version();
        for event in events {
            next.apply(event.clone());
            version = version.next();
        }
        next.set_version(version);
        next
    }
}

//! Loading and appending event-sourced aggregates.

use std::marker::PhantomData;
use std::sync::Arc;

use common::AggregateId;
use event_store::{AppendOptions, EventEnvelope, EventStore, Version};

use crate::aggregate::{Aggregate, DomainEvent};
use crate::error::DomainError;

/// Reads and writes one aggregate type against a shared event store.
///
/// Writes are split in two so a caller can run side effects between deciding
/// and committing: load the aggregate, let it produce events, `preview` the
/// next state, then `append` with the version that was loaded. A concurrent
/// writer makes the append fail with a conflict.
pub struct Repository<A: Aggregate> {
    store: Arc<dyn EventStore>,
    _phantom: PhantomData<fn() -> A>,
}

impl<A: Aggregate> Clone for Repository<A> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _phantom: PhantomData,
        }
    }
}

impl<A: Aggregate> Repository<A> {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self {
            store,
            _phantom: PhantomData,
        }
    }

    /// Replays the aggregate's stream. An unknown id yields `A::default()`.
    pub async fn load(&self, aggregate_id: AggregateId) -> Result<A, DomainError> {
        let envelopes = self.store.get_events_for_aggregate(aggregate_id).await?;

        let mut aggregate = A::default();
        for envelope in envelopes {
            let event: A::Event = envelope.decode()?;
            aggregate.apply(event);
            aggregate.set_version(envelope.version);
        }

        Ok(aggregate)
    }

    /// Loads an aggregate, returning None if its stream is empty.
    pub async fn load_existing(&self, aggregate_id: AggregateId) -> Result<Option<A>, DomainError> {
        let aggregate = self.load(aggregate_id).await?;
        Ok(aggregate.id().is_some().then_some(aggregate))
    }

    /// Appends events on top of `expected_version`.
    ///
    /// Returns the new stream version; an empty batch is a no-op.
    #[tracing::instrument(
        skip(self, events),
        fields(aggregate_type = A::aggregate_type(), count = events.len())
    )]
    pub async fn append(
        &self,
        aggregate_id: AggregateId,
        expected_version: Version,
        events: &[A::Event],
    ) -> Result<Version, DomainError> {
        if events.is_empty() {
            return Ok(expected_version);
        }

        let envelopes = build_envelopes::<A>(aggregate_id, expected_version, events)?;
        let version = self
            .store
            .append(envelopes, AppendOptions::expect_version(expected_version))
            .await?;

        tracing::debug!(%aggregate_id, %version, "events appended");
        Ok(version)
    }

    /// Ids of every aggregate of this type, oldest first.
    pub async fn ids(&self) -> Result<Vec<AggregateId>, DomainError> {
        Ok(self.store.aggregate_ids(A::aggregate_type()).await?)
    }
}

fn build_envelopes<A: Aggregate>(
    aggregate_id: AggregateId,
    current_version: Version,
    events: &[A::Event],
) -> Result<Vec<EventEnvelope>, DomainError> {
    let mut version = current_version;
    events
        .iter()
        .map(|event| {
            version = version.next();
            EventEnvelope::from_event(
                aggregate_id,
                A::aggregate_type(),
                version,
                event.event_type(),
                event,
            )
            .map_err(DomainError::from)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_store::InMemoryEventStore;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(tag = "type", content = "data")]
    enum NoteEvent {
        Opened { id: AggregateId, text: String },
        Edited { text: String },
    }

    impl DomainEvent for NoteEvent {
        fn event_type(&self) -> &'static str {
            match self {
                NoteEvent::Opened { .. } => "NoteOpened",
                NoteEvent::Edited { .. } => "NoteEdited",
            }
        }
    }

    #[derive(Debug, Default, Clone)]
    struct Note {
        id: Option<AggregateId>,
        text: String,
        version: Version,
    }

    impl Aggregate for Note {
        type Event = NoteEvent;

        fn aggregate_type() -> &'static str {
            "Note"
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
            match event {
                NoteEvent::Opened { id, text } => {
                    self.id = Some(id);
                    self.text = text;
                }
                NoteEvent::Edited { text } => self.text = text,
            }
        }
    }

    fn repository() -> (Repository<Note>, InMemoryEventStore) {
        let store = InMemoryEventStore::new();
        (Repository::new(Arc::new(store.clone())), store)
    }

    #[tokio::test]
    async fn append_then_load_replays_stream() {
        let (repo, _) = repository();
        let id = AggregateId::new();

        let version = repo
            .append(
                id,
                Version::initial(),
                &[
                    NoteEvent::Opened {
                        id,
                        text: "draft".to_string(),
                    },
                    NoteEvent::Edited {
                        text: "final".to_string(),
                    },
                ],
            )
            .await
            .unwrap();
        assert_eq!(version, Version::new(2));

        let note = repo.load_existing(id).await.unwrap().unwrap();
        assert_eq!(note.text, "final");
        assert_eq!(note.version(), Version::new(2));
    }

    #[tokio::test]
    async fn load_existing_is_none_for_unknown_id() {
        let (repo, _) = repository();
        assert!(repo.load_existing(AggregateId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn stale_version_is_a_conflict() {
        let (repo, _) = repository();
        let id = AggregateId::new();
        repo.append(
            id,
            Version::initial(),
            &[NoteEvent::Opened {
                id,
                text: "a".to_string(),
            }],
        )
        .await
        .unwrap();

        let err = repo
            .append(
                id,
                Version::initial(),
                &[NoteEvent::Opened {
                    id,
                    text: "b".to_string(),
                }],
            )
            .await
            .unwrap_err();

        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn empty_batch_is_not_persisted() {
        let (repo, store) = repository();

        let version = repo
            .append(AggregateId::new(), Version::initial(), &[])
            .await
            .unwrap();

        assert_eq!(version, Version::initial());
        assert_eq!(store.event_count().await, 0);
    }

    #[tokio::test]
    async fn ids_lists_streams_of_this_type() {
        let (repo, _) = repository();
        let id = AggregateId::new();
        repo.append(
            id,
            Version::initial(),
            &[NoteEvent::Opened {
                id,
                text: "x".to_string(),
            }],
        )
        .await
        .unwrap();

        assert_eq!(repo.ids().await.unwrap(), vec![id]);
    }
}

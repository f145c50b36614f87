use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    AggregateId, EventEnvelope, EventStoreError, Result, Version,
    store::{AppendOptions, EventStore, validate_events_for_append},
};

#[derive(Default)]
struct Streams {
    by_aggregate: HashMap<AggregateId, Vec<EventEnvelope>>,
    /// (aggregate type, id) in order of stream creation.
    created: Vec<(String, AggregateId)>,
}

/// In-memory event store used by tests and by the API when no database is
/// configured.
#[derive(Clone, Default)]
pub struct InMemoryEventStore {
    streams: Arc<RwLock<Streams>>,
}

impl InMemoryEventStore {
    /// Creates a new empty in-memory event store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of events stored.
    pub async fn event_count(&self) -> usize {
        self.streams
            .read()
            .await
            .by_aggregate
            .values()
            .map(Vec::len)
            .sum()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(&self, events: Vec<EventEnvelope>, options: AppendOptions) -> Result<Version> {
        validate_events_for_append(&events)?;

        let aggregate_id = events[0].aggregate_id;
        let aggregate_type = events[0].aggregate_type.clone();
        let first_new_version = events[0].version;

        let mut streams = self.streams.write().await;

        let current_version = streams
            .by_aggregate
            .get(&aggregate_id)
            .and_then(|stream| stream.last())
            .map(|e| e.version)
            .unwrap_or(Version::initial());

        if let Some(expected) = options.expected_version
            && current_version != expected
        {
            return Err(EventStoreError::ConcurrencyConflict {
                aggregate_id,
                expected,
                actual: current_version,
            });
        }

        // Same guarantee the unique (aggregate_id, version) index gives in Postgres.
        if first_new_version != current_version.next() {
            return Err(EventStoreError::ConcurrencyConflict {
                aggregate_id,
                expected: options.expected_version.unwrap_or(current_version),
                actual: current_version,
            });
        }

        let last_version = events
            .last()
            .map(|e| e.version)
            .unwrap_or(current_version);

        if current_version == Version::initial() {
            streams.created.push((aggregate_type, aggregate_id));
        }
        streams
            .by_aggregate
            .entry(aggregate_id)
            .or_default()
            .extend(events);

        Ok(last_version)
    }

    async fn get_events_for_aggregate(
        &self,
        aggregate_id: AggregateId,
    ) -> Result<Vec<EventEnvelope>> {
        let streams = self.streams.read().await;
        Ok(streams
            .by_aggregate
            .get(&aggregate_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_aggregate_version(&self, aggregate_id: AggregateId) -> Result<Option<Version>> {
        let streams = self.streams.read().await;
        Ok(streams
            .by_aggregate
            .get(&aggregate_id)
            .and_then(|stream| stream.last())
            .map(|e| e.version))
    }

    async fn aggregate_ids(&self, aggregate_type: &str) -> Result<Vec<AggregateId>> {
        let streams = self.streams.read().await;
        Ok(streams
            .created
            .iter()
            .filter(|(kind, _)| kind == aggregate_type)
            .map(|(_, id)| *id)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_event(aggregate_id: AggregateId, version: Version, event_type: &str) -> EventEnvelope {
        EventEnvelope::new(
            aggregate_id,
            "Order",
            version,
            event_type,
            serde_json::json!({"test": true}),
        )
    }

    #[tokio::test]
    async fn append_and_read_back_stream() {
        let store = InMemoryEventStore::new();
        let aggregate_id = AggregateId::new();

        let events = vec![
            order_event(aggregate_id, Version::new(1), "OrderPlaced"),
            order_event(aggregate_id, Version::new(2), "StatusChanged"),
        ];
        let version = store
            .append(events, AppendOptions::expect_new())
            .await
            .unwrap();
        assert_eq!(version, Version::new(2));

        let stored = store.get_events_for_aggregate(aggregate_id).await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].event_type, "OrderPlaced");
        assert_eq!(
            store.get_aggregate_version(aggregate_id).await.unwrap(),
            Some(Version::new(2))
        );
    }

    #[tokio::test]
    async fn stale_writer_gets_conflict() {
        let store = InMemoryEventStore::new();
        let aggregate_id = AggregateId::new();

        store
            .append(
                vec![order_event(aggregate_id, Version::first(), "OrderPlaced")],
                AppendOptions::expect_new(),
            )
            .await
            .unwrap();

        // Both writers loaded version 1; only the first may commit version 2.
        store
            .append(
                vec![order_event(aggregate_id, Version::new(2), "StatusChanged")],
                AppendOptions::expect_version(Version::first()),
            )
            .await
            .unwrap();
        let result = store
            .append(
                vec![order_event(aggregate_id, Version::new(2), "ItemsReplaced")],
                AppendOptions::expect_version(Version::first()),
            )
            .await;

        assert!(matches!(
            result,
            Err(EventStoreError::ConcurrencyConflict { actual, .. }) if actual == Version::new(2)
        ));
        assert_eq!(store.event_count().await, 2);
    }

    #[tokio::test]
    async fn creating_an_existing_stream_conflicts() {
        let store = InMemoryEventStore::new();
        let aggregate_id = AggregateId::new();
        let first = order_event(aggregate_id, Version::first(), "OrderPlaced");

        store
            .append(vec![first.clone()], AppendOptions::expect_new())
            .await
            .unwrap();
        let result = store.append(vec![first], AppendOptions::default()).await;

        assert!(result.unwrap_err().is_conflict());
    }

    #[tokio::test]
    async fn aggregate_ids_are_filtered_by_type() {
        let store = InMemoryEventStore::new();
        let order_id = AggregateId::new();
        let return_id = AggregateId::new();

        store
            .append(
                vec![order_event(order_id, Version::first(), "OrderPlaced")],
                AppendOptions::expect_new(),
            )
            .await
            .unwrap();
        store
            .append(
                vec![EventEnvelope::new(
                    return_id,
                    "Return",
                    Version::first(),
                    "ReturnRequested",
                    serde_json::json!({}),
                )],
                AppendOptions::expect_new(),
            )
            .await
            .unwrap();

        assert_eq!(store.aggregate_ids("Order").await.unwrap(), vec![order_id]);
        assert_eq!(store.aggregate_ids("Return").await.unwrap(), vec![return_id]);
    }

    #[tokio::test]
    async fn unknown_aggregate_has_no_events() {
        let store = InMemoryEventStore::new();
        let id = AggregateId::new();
        assert!(store.get_events_for_aggregate(id).await.unwrap().is_empty());
        assert_eq!(store.get_aggregate_version(id).await.unwrap(), None);
    }
}

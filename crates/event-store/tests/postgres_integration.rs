//! PostgreSQL journal tests.
//!
//! These need Docker and share one container. Run with:
//!
//! ```bash
//! cargo test -p event-store --test postgres_integration -- --ignored --test-threads=1
//! ```

use std::sync::Arc;

use event_store::{
    AggregateId, AppendOptions, EventEnvelope, EventStore, EventStoreError, PostgresEventStore,
    Version,
};
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();
            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();
            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_events_table.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

async fn get_test_store() -> PostgresEventStore {
    let info = get_container_info().await;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE events")
        .execute(&pool)
        .await
        .unwrap();

    PostgresEventStore::new(pool)
}

fn order_event(aggregate_id: AggregateId, version: i64, event_type: &str) -> EventEnvelope {
    EventEnvelope::new(
        aggregate_id,
        "Order",
        Version::new(version),
        event_type,
        serde_json::json!({"status": "Pending"}),
    )
}

#[tokio::test]
#[ignore = "requires docker"]
async fn append_and_retrieve_stream() {
    let store = get_test_store().await;
    let order_id = AggregateId::new();

    let version = store
        .append(
            vec![
                order_event(order_id, 1, "OrderPlaced"),
                order_event(order_id, 2, "StatusChanged"),
            ],
            AppendOptions::expect_new(),
        )
        .await
        .unwrap();
    assert_eq!(version, Version::new(2));

    let stored = store.get_events_for_aggregate(order_id).await.unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].event_type, "OrderPlaced");
    assert_eq!(stored[1].version, Version::new(2));
    assert_eq!(
        store.get_aggregate_version(order_id).await.unwrap(),
        Some(Version::new(2))
    );
}

#[tokio::test]
#[ignore = "requires docker"]
async fn stale_writer_is_rejected() {
    let store = get_test_store().await;
    let order_id = AggregateId::new();

    store
        .append(
            vec![order_event(order_id, 1, "OrderPlaced")],
            AppendOptions::expect_new(),
        )
        .await
        .unwrap();
    store
        .append(
            vec![order_event(order_id, 2, "StatusChanged")],
            AppendOptions::expect_version(Version::first()),
        )
        .await
        .unwrap();

    let result = store
        .append(
            vec![order_event(order_id, 2, "ItemsReplaced")],
            AppendOptions::expect_version(Version::first()),
        )
        .await;

    assert!(matches!(
        result,
        Err(EventStoreError::ConcurrencyConflict { .. })
    ));
}

#[tokio::test]
#[ignore = "requires docker"]
async fn unique_constraint_catches_unchecked_duplicates() {
    let store = get_test_store().await;
    let order_id = AggregateId::new();

    store
        .append(
            vec![order_event(order_id, 1, "OrderPlaced")],
            AppendOptions::default(),
        )
        .await
        .unwrap();
    let result = store
        .append(
            vec![order_event(order_id, 1, "OrderPlaced")],
            AppendOptions::default(),
        )
        .await;

    assert!(result.unwrap_err().is_conflict());
}

#[tokio::test]
#[ignore = "requires docker"]
async fn aggregate_ids_lists_streams_by_type() {
    let store = get_test_store().await;
    let first = AggregateId::new();
    let second = AggregateId::new();

    for id in [first, second] {
        store
            .append(
                vec![order_event(id, 1, "OrderPlaced")],
                AppendOptions::expect_new(),
            )
            .await
            .unwrap();
    }

    let ids = store.aggregate_ids("Order").await.unwrap();
    assert_eq!(ids, vec![first, second]);
    assert!(store.aggregate_ids("Return").await.unwrap().is_empty());
}

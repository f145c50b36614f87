//! HTTP API over the order lifecycle.
//!
//! Exposes order, return and product-stock endpoints backed by
//! [`lifecycle::OrderLifecycle`], with structured logging (tracing) and
//! Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use domain::InMemoryDirectory;
use event_store::{EventStoreError, PostgresEventStore};
use inventory::{InMemoryInventory, PostgresInventory};
use lifecycle::{LifecycleConfig, OrderLifecycle};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub lifecycle: OrderLifecycle,
    /// Methods and users orders may refer to.
    pub directory: InMemoryDirectory,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::ops::metrics))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::ops::health))
        .route("/orders", post(routes::orders::create))
        .route(
            "/orders/{id}",
            get(routes::orders::get).patch(routes::orders::update),
        )
        .route("/returns", post(routes::returns::create))
        .route(
            "/returns/{id}",
            get(routes::returns::get).patch(routes::returns::update),
        )
        .route(
            "/products/{id}",
            get(routes::products::get).put(routes::products::put),
        )
        .route("/methods", post(routes::directory::register_method))
        .route("/users", post(routes::directory::register_user))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates application state over in-memory journal and inventory.
pub fn create_default_state(
    inventory: InMemoryInventory,
    config: LifecycleConfig,
) -> Arc<AppState> {
    let directory = InMemoryDirectory::new();
    let lifecycle = lifecycle::in_memory(inventory, directory.clone(), config);
    Arc::new(AppState {
        lifecycle,
        directory,
    })
}

/// Creates application state over Postgres, running pending migrations.
pub async fn create_postgres_state(
    pool: PgPool,
    config: LifecycleConfig,
) -> Result<Arc<AppState>, EventStoreError> {
    let store = PostgresEventStore::new(pool.clone());
    store.run_migrations().await?;

    let inventory = Arc::new(PostgresInventory::new(pool));
    let directory = InMemoryDirectory::new();
    let shared_directory = Arc::new(directory.clone());
    let lifecycle = OrderLifecycle::new(
        Arc::new(store),
        inventory.clone(),
        inventory,
        shared_directory.clone(),
        shared_directory,
        config,
    );

    Ok(Arc::new(AppState {
        lifecycle,
        directory,
    }))
}

//! HTTP host with observability for the cart engine.
//!
//! Serves one session cart per process over REST, backed by a seeded
//! in-memory catalog and stock oracle, with structured logging (tracing)
//! and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;
pub mod seed;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use cart::{CartEngine, TracingSink};
use cart_store::SnapshotStore;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::cart::AppState;
use seed::CatalogSeed;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: SnapshotStore + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::system::metrics))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::system::health))
        .route("/cart", get(routes::cart::show::<S>))
        .route(
            "/cart/items/{id}",
            post(routes::cart::add::<S>)
                .put(routes::cart::set_amount::<S>)
                .delete(routes::cart::remove::<S>),
        )
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

/// Creates the application state, restoring the cart saved in `store`.
pub async fn create_state<S: SnapshotStore + 'static>(
    seed: &CatalogSeed,
    store: S,
) -> Arc<AppState<S>> {
    let stock = seed.stock_oracle();
    let engine = CartEngine::restore(seed.catalog(), stock.clone(), store, TracingSink).await;

    Arc::new(AppState { engine, stock })
}

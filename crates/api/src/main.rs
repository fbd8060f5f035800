//! API server entry point.

use api::config::Config;
use api::seed::CatalogSeed;
use cart_store::FileSnapshotStore;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Load catalog and stock
    let seed = match &config.catalog_seed {
        Some(path) => {
            let seed = CatalogSeed::load(path)
                .await
                .expect("failed to load catalog seed");
            tracing::info!(
                path = %path.display(),
                products = seed.products.len(),
                "loaded catalog seed"
            );
            seed
        }
        None => {
            tracing::warn!("CART_CATALOG_SEED not set, serving an empty catalog");
            CatalogSeed::default()
        }
    };

    // 4. Restore the session cart
    let store = FileSnapshotStore::new(&config.data_dir);
    let state = api::create_state(&seed, store).await;
    tracing::info!(
        data_dir = %config.data_dir.display(),
        lines = state.engine.cart().len(),
        "cart engine ready"
    );

    // 5. Build the application and start serving
    let app = api::create_app(state, metrics_handle);
    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}

//! DOF Archive API Gateway
//!
//! HTTP entry point for the gazette archive:
//! - File listing, detail, and PDF/zip download
//! - Structured publication detail
//! - Summary CRUD and sharing
//! - Health, logging, and metrics

mod extract;
mod handlers;
mod middleware;

#[cfg(test)]
mod test_support;

use anyhow::Context;
use axum::{
    routing::get,
    Router,
};
use dof_common::{
    config::AppConfig,
    db::DbPool,
    metrics,
    pdf::PdfResolver,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::{signal, sync::Notify};
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DbPool,
    pub resolver: PdfResolver,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;
    let config = Arc::new(config);

    init_tracing(&config);

    info!("Starting DOF Archive API Gateway v{}", dof_common::VERSION);

    // Initialize metrics
    if config.observability.metrics_port != 0 {
        let metrics_addr = SocketAddr::from(([0, 0, 0, 0], config.observability.metrics_port));
        PrometheusBuilder::new()
            .with_http_listener(metrics_addr)
            .install()
            .context("Failed to install Prometheus exporter")?;
        info!("Metrics exported on {}", metrics_addr);
    }
    metrics::register_metrics();

    // Initialize database connection
    info!("Connecting to database...");
    let db = DbPool::new(&config.database).await?;

    let resolver = PdfResolver::from_config(&config.storage)
        .context("Failed to build HTTP client for PDF retrieval")?;

    // Create app state
    let state = AppState {
        config: config.clone(),
        db,
        resolver,
    };

    // Build the router
    let app = create_router(state);

    // Start the server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server.host/server.port")?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // In-flight requests get `shutdown_timeout` to drain after the signal
    let signalled = Arc::new(Notify::new());
    let notify = signalled.clone();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            notify.notify_one();
        })
        .into_future();

    let drain_deadline = async {
        signalled.notified().await;
        tokio::time::sleep(config.shutdown_timeout()).await;
    };

    tokio::select! {
        result = server => result?,
        _ = drain_deadline => {
            tracing::warn!("Shutdown timeout elapsed with requests still in flight");
        }
    }

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if config.observability.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    // Public read API: any origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    let timeout = TimeoutLayer::new(state.config.request_timeout());

    let api_routes = Router::new()
        // Health endpoints
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))

        // Gazette files
        .route("/dof/files", get(handlers::files::list_files))
        .route("/dof/files/{id}", get(handlers::files::get_file))
        .route("/dof/files/{id}/download", get(handlers::files::download_file))

        // Publications
        .route("/dof/publications", get(handlers::publications::list_publications))
        .route("/dof/publications/{id}", get(handlers::publications::get_publication))

        // Summaries
        .route(
            "/summaries",
            get(handlers::summaries::list_summaries).post(handlers::summaries::create_summary),
        )
        .route(
            "/summaries/{id}",
            get(handlers::summaries::get_summary)
                .put(handlers::summaries::update_summary)
                .delete(handlers::summaries::delete_summary),
        )
        .route("/summaries/{id}/share", get(handlers::summaries::share_summary))
        .route_layer(axum::middleware::from_fn(middleware::metrics::track_requests));

    api_routes
        .layer(timeout)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(propagate_id)
        .layer(request_id)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}

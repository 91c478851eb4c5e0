//! Wayfarer API
//!
//! The entry point for the travel assistant's answer pipeline.
//! Handles:
//! - Question answering over the document collection
//! - Liveness/readiness probes
//! - Observability (logging, metrics)

mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use wayfarer_common::{config::AppConfig, metrics};
use wayfarer_rag::embeddings::HttpEmbedder;
use wayfarer_rag::store::QdrantStore;
use wayfarer_rag::{ModelGateway, RagPipeline, RelevanceJudge, Retriever, VectorStore};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub pipeline: Arc<RagPipeline>,
    pub store: Arc<dyn VectorStore>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Arc::new(AppConfig::load()?);

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));
    if config.observability.json_logging {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }

    info!("Starting Wayfarer API v{}", wayfarer_common::VERSION);

    // Initialize metrics
    if config.observability.metrics_port > 0 {
        let addr = SocketAddr::from(([0, 0, 0, 0], config.observability.metrics_port));
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()?;
        info!("Prometheus exporter listening on {}", addr);
    }
    metrics::register_metrics();

    // Build the pipeline from configuration; dependencies are constructed
    // here and passed down explicitly
    let store: Arc<dyn VectorStore> = Arc::new(QdrantStore::new(&config.qdrant)?);
    let embedder = Arc::new(HttpEmbedder::new(&config.embedding)?);
    let retriever = Retriever::new(store.clone(), embedder, &config.search);

    let gateway = Arc::new(ModelGateway::from_config(&config.providers)?);
    let judge = RelevanceJudge::new(gateway.clone(), config.judge.model.clone());

    let pipeline = Arc::new(RagPipeline::new(
        retriever,
        gateway,
        judge,
        config.search.default_limit,
    ));

    let state = AppState {
        config: config.clone(),
        pipeline,
        store,
    };

    // Build the router
    let app = create_router(state);

    // Start the server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    Router::new()
        // Health endpoints
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        // Answer endpoint
        .route("/answer", post(handlers::answer::answer))
        .layer(
            ServiceBuilder::new()
                .layer(request_id)
                .layer(TraceLayer::new_for_http())
                .layer(propagate_id)
                .layer(cors),
        )
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}

//! Receipt Server
//!
//! A receipt scanning backend: OCR ingestion with structured extraction,
//! arithmetic verification, and per-item spatial backmapping.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use receipt_server::config::Config;
use receipt_server::db;
use receipt_server::extraction::OpenAiExtractor;
use receipt_server::ocr::{HttpOcrEngine, OcrEngine};
use receipt_server::routes;
use receipt_server::state::AppState;
use receipt_server::storage::{S3Client, ScanStore};

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check(State(_state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "receipt_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();

    let config = Config::from_env().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config from env: {}, using defaults", e);
        Config::default()
    });

    tracing::info!("Starting Receipt Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("S3 endpoint: {}", config.storage.endpoint);
    tracing::info!("OCR endpoint: {}", config.ocr.endpoint);

    // Initialize scan storage
    let s3_client = S3Client::new(&config.storage).await?;
    let scans = ScanStore::with_s3(s3_client, "scans");

    // Initialize database
    let db_pool = db::create_pool(&config.database.url).await?;
    tracing::info!("Database initialized at {}", config.database.url);

    // External service clients
    let ocr = Arc::new(HttpOcrEngine::new(&config.ocr.endpoint, &config.ocr.api_key));
    if !ocr.is_available().await {
        tracing::warn!(
            "OCR service at {} is not reachable; ingestion will fail until it is",
            config.ocr.endpoint
        );
    }
    let extractor = Arc::new(OpenAiExtractor::new(
        &config.extraction.base_url,
        &config.extraction.api_key,
        &config.extraction.model,
    ));

    let port = config.server.port;
    let app_state = AppState::new(config, db_pool, scans, ocr, extractor);

    // Build CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let app = Router::new()
        .route("/health", get(health_check))
        .nest("/auth", routes::auth::router())
        .nest(
            "/receipts",
            routes::receipts::router().merge(routes::items::router()),
        )
        .nest("/categories", routes::categories::router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state);

    // Start server with graceful shutdown
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Receipt Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}

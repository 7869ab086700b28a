//! Server startup and router assembly

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

use crate::{
    api,
    config::Config,
    metrics,
    shared_state::{SharedState, UnifiedAppState},
};

/// Initialize logging, metrics and state, then serve until the listener fails.
pub async fn run_server(cfg: Config) -> anyhow::Result<()> {
    crate::telemetry::init_tracing();
    metrics::init_metrics();
    cfg.print_config();

    std::fs::create_dir_all(&cfg.upload_folder).with_context(|| {
        format!("Failed to create upload folder {}", cfg.upload_folder.display())
    })?;

    let addr = cfg.api_addr()?;
    let shared_state = Arc::new(SharedState::with_gemini(cfg));
    let unified_state = UnifiedAppState::new(shared_state);

    info!("Starting HTTP server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    let app = build_router(unified_state);
    axum::serve(listener, app).await?;

    Ok(())
}

pub fn build_router(state: UnifiedAppState) -> Router {
    let body_limit = state.config.max_content_length;
    let request_timeout = Duration::from_secs(state.config.request_timeout_seconds);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/", get(api::index))
        .route("/manage", get(api::manage))
        .route("/run_prompt", post(api::run_prompt))
        .route("/add_prompt", post(api::add_prompt))
        .route("/upload", post(api::upload_file))
        .route("/files", get(api::list_files))
        .route("/file/:filename", get(api::get_file))
        .route("/feedback", post(api::submit_feedback))
        .route("/conversation_history", get(api::conversation_history))
        .route("/memory_stats", get(api::memory_stats))
        .route("/metrics", get(metrics::get_metrics))
        .route("/healthz", get(|| async { "OK" }))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
        .with_state(state)
}

//! Main HTTP Gateway Server.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};
use chequeforge_extraction::ChequePipeline;
use chequeforge_store::ChequeStore;
use logging::ExtractionEventLogger;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, instrument};

use crate::uploads::{UPLOADS_ROUTE, UploadDir};
use crate::webhook::WebhookNotifier;
use crate::{cheques_api, health_api};

/// Application state shared across routes.
#[derive(Clone)]
pub struct GatewayState {
    pub pipeline: Arc<ChequePipeline>,
    pub store: Arc<ChequeStore>,
    pub uploads: UploadDir,
    pub webhook: Option<WebhookNotifier>,
    pub events: ExtractionEventLogger,
    pub max_upload_bytes: usize,
}

/// Build the router with every route and layer.
pub fn build_router(state: GatewayState) -> Router {
    let uploads = ServeDir::new(state.uploads.root());
    let body_limit = DefaultBodyLimit::max(state.max_upload_bytes);

    Router::new()
        .route("/api/health", get(health_api::get_health))
        .route("/api/cheques/process", post(cheques_api::process_cheque))
        .route("/api/cheques/review", get(cheques_api::list_pending_review))
        .route("/api/cheques/review/:id", put(cheques_api::apply_review))
        .nest_service(UPLOADS_ROUTE, uploads)
        .layer(body_limit)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Starts the HTTP server and runs until Ctrl-C.
#[instrument(skip(state))]
pub async fn start_server(addr: SocketAddr, state: GatewayState) -> Result<()> {
    info!(
        ocr = %state.pipeline.recognizer_name(),
        secondary = state.pipeline.secondary_name().unwrap_or("none"),
        uploads = %state.uploads.root().display(),
        "Starting gateway"
    );
    let app = build_router(state);

    let listener = TcpListener::bind(&addr).await?;
    info!("Gateway HTTP server listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

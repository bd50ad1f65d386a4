use axum::{
    routing::{get, post},
    Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tower_http::services::ServeDir;

use crate::config::types::Config;
use crate::jobs::ExtractJobCoordinator;
use crate::locator::ArtifactLocator;
use crate::storage::traits::JobStore;

use super::api::{extract_stream, health_check, AppState};

/// Builds the application router. Exposed separately so tests can drive the
/// API without binding a configured listener.
pub fn build_router(state: AppState, client_dir: Option<PathBuf>) -> Router {
    let router = Router::new()
        .route("/health", get(health_check))
        .route("/query/extract-stream", post(extract_stream))
        .with_state(state);

    match client_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    }
}

/// Start the web server with the given job store and configuration
pub async fn run_server(
    config: &Config,
    store: Arc<dyn JobStore>,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Result<(), Box<dyn std::error::Error>> {
    let coordinator = Arc::new(ExtractJobCoordinator::new(
        store,
        config.polling.interval,
        config.polling.max_wait,
    ));
    let locator = Arc::new(ArtifactLocator::new(config.s3.as_ref()).await);

    let app = build_router(
        AppState {
            coordinator,
            locator,
        },
        config.web.client_dir.clone(),
    );

    let listener = tokio::net::TcpListener::bind(&config.web.listen).await?;
    tracing::info!("Web server listening on {}", config.web.listen);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.wait_for(|&v| v).await;
            tracing::info!("Web server shutting down gracefully");
        })
        .await?;

    Ok(())
}

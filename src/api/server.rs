//! HTTP server for the quest ledger

use crate::api::routes;
use crate::command::ChatResolver;
use crate::core::config::AppConfig;
use crate::core::error::Result;
use crate::store::TaskStore;
use axum::http::{header, Method};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Application state shared across handlers
pub struct AppState {
    pub store: Arc<TaskStore>,
    pub resolver: ChatResolver,
}

impl AppState {
    pub fn new(store: Arc<TaskStore>, resolver: ChatResolver) -> Self {
        Self { store, resolver }
    }
}

/// Build the full router
pub fn build_router(state: Arc<AppState>, request_timeout: Duration) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .merge(routes::task_routes())
        .merge(routes::chat_routes())
        .merge(routes::health_routes())
        .with_state(state)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Run the HTTP server until ctrl-c
pub async fn run(config: &AppConfig, state: AppState) -> Result<()> {
    let app = build_router(
        Arc::new(state),
        Duration::from_secs(config.request_timeout_secs),
    );

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Dungeon Task Master listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

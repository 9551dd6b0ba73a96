//! Lookup Sheets API Server implementation
//!
//! HTTP REST API server using Axum. All sheet state lives in one
//! [`SheetRegistry`] shared by every request.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use chrono::{DateTime, Utc};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use super::handlers;
use crate::core::SheetRegistry;

/// API Server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// Shared application state
pub struct AppState {
    pub version: String,
    pub started_at: DateTime<Utc>,
    pub registry: SheetRegistry,
}

impl AppState {
    pub fn new(version: impl Into<String>) -> Self {
        Self::with_registry(version, SheetRegistry::new())
    }

    pub fn with_registry(version: impl Into<String>, registry: SheetRegistry) -> Self {
        Self {
            version: version.into(),
            started_at: Utc::now(),
            registry,
        }
    }
}

/// Build the router with all routes and middleware
pub fn router(state: Arc<AppState>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health and info endpoints
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/version", get(handlers::version))
        // Sheet endpoints
        .route("/sheet", post(handlers::create_sheet))
        .route("/sheets", get(handlers::list_sheets))
        .route(
            "/sheet/:sheet_id",
            get(handlers::get_sheet).delete(handlers::delete_sheet),
        )
        .route("/sheet/:sheet_id/cell", put(handlers::set_cell))
        .route(
            "/sheet/:sheet_id/cell/:column/:row/audit",
            get(handlers::audit_cell),
        )
        // State and middleware
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Run the API server until SIGINT/SIGTERM
pub async fn run_api_server(config: ApiConfig) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(env!("CARGO_PKG_VERSION")));
    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Lookup Sheets API Server starting on http://{}", addr);
    info!("   Endpoints: /sheet, /sheets, /sheet/:sheet_id, /sheet/:sheet_id/cell");
    info!("   Health: /health, Version: /version");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Lookup Sheets API Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, stopping server...");
}

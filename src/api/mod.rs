//! HTTP surface of the indicator registry
//!
//! ## Architecture
//!
//! - **Axum** web framework with Tower middleware
//! - Handlers translate requests into calls on the shared
//!   [`DocumentStore`](crate::registry::DocumentStore) and
//!   [`StatusStore`](crate::registry::StatusStore)
//!
//! ## Endpoints
//!
//! - `POST /v1/register` - Register an indicator document
//! - `GET /v1/indicator-documents` - Live documents with indicator status
//! - `GET /v1/indicator-documents/:identifier` - One live document
//! - `POST /v1/indicator-documents/:identifier/bulk_status` - Record statuses
//! - `GET /v1/health` - Health check
//! - `GET /metrics` - Prometheus metrics

#[cfg(feature = "api")]
pub mod error;
#[cfg(feature = "api")]
pub mod routes;
#[cfg(feature = "api")]
pub mod state;
#[cfg(feature = "api")]
pub mod types;

#[cfg(feature = "api")]
pub use error::{ApiError, ApiResult};
#[cfg(feature = "api")]
pub use state::ApiState;
#[cfg(feature = "api")]
pub use types::{HealthResponse, RegistrationResponse, StatusUpdate};

#[cfg(feature = "api")]
use axum::{
    Router,
    routing::{get, post},
};
use std::net::SocketAddr;
#[cfg(feature = "api")]
use tracing::info;

use crate::config::RegistryConfig;

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Bind address (e.g., "0.0.0.0:10567")
    pub bind_addr: SocketAddr,

    /// Enable permissive CORS for browser dashboards
    pub enable_cors: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::from(&RegistryConfig::default())
    }
}

impl From<&RegistryConfig> for ApiConfig {
    fn from(config: &RegistryConfig) -> Self {
        Self {
            bind_addr: config.bind_addr,
            enable_cors: config.enable_cors,
        }
    }
}

/// Build the registry router
#[cfg(feature = "api")]
pub fn router(state: ApiState, enable_cors: bool) -> Router {
    use tower_http::cors::{Any, CorsLayer};
    use tower_http::trace::TraceLayer;

    let mut app = Router::new()
        .route("/v1/register", post(routes::register::register_document))
        .route("/v1/register/", post(routes::register::register_document))
        .route(
            "/v1/indicator-documents",
            get(routes::documents::list_documents),
        )
        .route(
            "/v1/indicator-documents/",
            get(routes::documents::list_documents),
        )
        .route(
            "/v1/indicator-documents/:identifier",
            get(routes::documents::get_document),
        )
        .route(
            "/v1/indicator-documents/:identifier/bulk_status",
            post(routes::documents::bulk_status),
        )
        .route("/v1/health", get(routes::health::health_check))
        .route("/metrics", get(routes::metrics::metrics))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    app
}

/// Spawn the API server
///
/// This starts an Axum HTTP server in a background task.
/// Returns the server's local address.
#[cfg(feature = "api")]
pub async fn spawn_api_server(config: ApiConfig, state: ApiState) -> anyhow::Result<SocketAddr> {
    info!("starting API server on {}", config.bind_addr);

    let app = router(state, config.enable_cors);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    let addr = listener.local_addr()?;

    info!("API server listening on {}", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("API server error: {}", e);
        }
    });

    Ok(addr)
}

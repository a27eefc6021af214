//! Health check endpoint

use axum::{Json, extract::State};

use crate::api::{state::ApiState, types::HealthResponse};

/// GET /v1/health
///
/// Returns a simple health check response
pub async fn health_check(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: state.clock.now().to_rfc3339(),
    })
}

//! Prometheus exposition endpoint

use axum::{extract::State, http::header};
use axum::response::IntoResponse;

use crate::api::{error::ApiResult, state::ApiState};

/// GET /metrics
pub async fn metrics(State(state): State<ApiState>) -> ApiResult<impl IntoResponse> {
    let text = state.metrics.render()?;
    Ok(([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], text))
}

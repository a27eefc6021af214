//! Document registration endpoint

use axum::{Json, body::Bytes, extract::State};
use tracing::{debug, instrument, warn};

use crate::api::{
    error::{ApiError, ApiResult},
    state::ApiState,
    types::RegistrationResponse,
};
use crate::document::process_document;

/// POST /v1/register
///
/// Patch, validate and store a raw document. Re-registering identical
/// content refreshes the existing entry.
#[instrument(skip_all, fields(bytes = body.len()))]
pub async fn register_document(
    State(state): State<ApiState>,
    body: Bytes,
) -> ApiResult<Json<RegistrationResponse>> {
    if body.is_empty() {
        state.metrics.registration_errors_total.inc();
        return Err(ApiError::InvalidRequest("request body is empty".to_string()));
    }

    let processed = match process_document(&state.patches, &body) {
        Ok(processed) => processed,
        Err(e) => {
            warn!("Rejected document: {e}");
            state.metrics.registration_errors_total.inc();
            return Err(e.into());
        }
    };

    for skipped in processed.report.skipped() {
        debug!(
            patch = skipped.patch,
            operation = skipped.operation,
            path = %skipped.path,
            "Patch operation skipped for {}",
            processed.identifier
        );
    }

    let registration = state
        .documents
        .register(&processed.identifier, &processed.canonical, state.clock.now())
        .await;

    state.metrics.registrations_total.inc();
    state
        .metrics
        .registered_documents
        .set(i64::try_from(state.documents.len().await).unwrap_or(i64::MAX));

    debug!(identifier = %processed.identifier, ?registration, "Registered document");

    Ok(Json(RegistrationResponse {
        identifier: processed.identifier,
    }))
}

//! Registered document endpoints

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::{error, instrument, trace};

use crate::api::{
    error::{ApiError, ApiResult},
    state::ApiState,
    types::StatusUpdate,
};
use crate::document::IndicatorDocument;
use crate::registry::{DocumentView, RegisteredEntry, merge};

/// GET /v1/indicator-documents
///
/// Every live document with its latest indicator statuses
#[instrument(skip_all)]
pub async fn list_documents(State(state): State<ApiState>) -> Json<Vec<DocumentView>> {
    let entries = state.documents.list(state.clock.now()).await;
    let mut views = Vec::with_capacity(entries.len());

    for entry in entries {
        match view_of(&state, &entry).await {
            Ok(view) => views.push(view),
            Err(e) => error!(identifier = %entry.identifier, "Could not decode stored document: {e}"),
        }
    }

    trace!(count = views.len(), "Listing documents");
    Json(views)
}

/// GET /v1/indicator-documents/:identifier
pub async fn get_document(
    State(state): State<ApiState>,
    Path(identifier): Path<String>,
) -> ApiResult<Json<DocumentView>> {
    let now = state.clock.now();

    let entry = state
        .documents
        .get(&identifier)
        .await
        .filter(|entry| now.signed_duration_since(entry.last_refreshed_at) <= state.documents.ttl())
        .ok_or_else(|| ApiError::NotFound(format!("document {identifier} is not registered")))?;

    let view = view_of(&state, &entry)
        .await
        .map_err(|e| ApiError::Internal(format!("could not decode stored document: {e}")))?;

    Ok(Json(view))
}

/// POST /v1/indicator-documents/:identifier/bulk_status
///
/// Records one status per entry. The document does not have to be
/// registered yet.
#[instrument(skip(state, updates), fields(updates = updates.len()))]
pub async fn bulk_status(
    State(state): State<ApiState>,
    Path(identifier): Path<String>,
    Json(updates): Json<Vec<StatusUpdate>>,
) -> StatusCode {
    let now = state.clock.now();

    for update in &updates {
        state
            .statuses
            .set_status(&identifier, &update.name, &update.status, now)
            .await;
    }

    state.metrics.status_updates_total.inc_by(updates.len() as u64);
    StatusCode::OK
}

async fn view_of(
    state: &ApiState,
    entry: &RegisteredEntry,
) -> Result<DocumentView, serde_json::Error> {
    let document: IndicatorDocument = serde_json::from_slice(&entry.bytes)?;
    let statuses = state.statuses.for_document(&entry.identifier).await;

    Ok(merge(&entry.identifier, &document, |_, name| {
        statuses.get(name).cloned()
    }))
}

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use clarity_core::PolicyDocument;
use serde_json::{Value, json};

use super::{ApiError, AppState, internal, json_error};
use crate::bus::Event;

pub(super) async fn get(State(state): State<AppState>) -> Result<Json<PolicyDocument>, ApiError> {
    let doc = state
        .store
        .policies()
        .await
        .map_err(internal("Failed to read policies"))?;
    Ok(Json(doc))
}

/// Replace the whole policy document. Last writer wins.
pub(super) async fn replace(
    State(state): State<AppState>,
    Json(doc): Json<PolicyDocument>,
) -> Result<Json<Value>, ApiError> {
    doc.validate()
        .map_err(|e| json_error(StatusCode::BAD_REQUEST, e.to_string()))?;

    state
        .store
        .replace_policies(&doc)
        .await
        .map_err(internal("Failed to update policies"))?;
    state.bus.publish(Event::PoliciesUpdated, &doc);
    Ok(Json(json!({ "success": true })))
}

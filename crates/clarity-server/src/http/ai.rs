//! Endpoints backed by the AI gateway.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use clarity_core::{PolicySuggestion, ReceiptFields, Recommendation, Transaction, cached_suggestion};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{info, warn};

use super::{ApiError, AppState, RECEIPT_LIMIT, internal, json_error, not_found};
use crate::bus::Event;

const RECEIPT_FIELD: &str = "receipt";
const NO_RECEIPT: &str = "No receipt file provided";

/// Recommendation for an unsaved transaction. Nothing is persisted.
pub(super) async fn analyze(
    State(state): State<AppState>,
    Json(txn): Json<Transaction>,
) -> Result<Json<Recommendation>, ApiError> {
    let policies = state
        .store
        .policies()
        .await
        .map_err(internal("Failed to analyze transaction"))?;
    Ok(Json(state.ai.approvals.recommend(&txn, &policies).await))
}

pub(super) async fn reanalyze(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Transaction>, ApiError> {
    const FAILED: &str = "Failed to re-analyze transaction";

    let txn = state
        .store
        .transaction(&id)
        .await
        .map_err(internal(FAILED))?
        .ok_or_else(not_found)?;
    let policies = state.store.policies().await.map_err(internal(FAILED))?;
    let rec = state.ai.approvals.recommend(&txn, &policies).await;

    // The record may have changed or vanished while the model was thinking.
    let updated = state
        .store
        .update_transaction(&id, |t| t.apply_recommendation(&rec))
        .await
        .map_err(internal(FAILED))?
        .ok_or_else(not_found)?;

    state.bus.publish(Event::TransactionUpdated, &updated);
    info!(id = %id, approval_status = %rec.approval_status, "reanalyzed transaction");
    Ok(Json(updated))
}

/// Extract fields from the multipart `receipt` image. Pipeline failures
/// come back as a 200 with `error` set.
pub(super) async fn parse_receipt(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ReceiptFields>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| json_error(e.status(), e.body_text()))?
    {
        if field.name() != Some(RECEIPT_FIELD) {
            continue;
        }

        let mime = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| json_error(e.status(), e.body_text()))?;
        if bytes.len() > RECEIPT_LIMIT {
            warn!(size = bytes.len(), "receipt too large");
            return Err(json_error(
                StatusCode::PAYLOAD_TOO_LARGE,
                "Receipt file exceeds 10 MiB",
            ));
        }

        info!(size = bytes.len(), mime = %mime, "processing receipt");
        return Ok(Json(state.ai.receipts.extract(&bytes, &mime).await));
    }

    Err(json_error(StatusCode::BAD_REQUEST, NO_RECEIPT))
}

#[derive(Debug, Default, Deserialize)]
struct SuggestRequest {
    #[serde(default)]
    transaction: Option<Transaction>,
}

/// Uncached suggestion, optionally focused on a client-supplied transaction.
pub(super) async fn suggest_policy(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    const FAILED: &str = "Failed to generate policy suggestion";

    let req: SuggestRequest = if body.iter().all(u8::is_ascii_whitespace) {
        SuggestRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| json_error(StatusCode::BAD_REQUEST, e.to_string()))?
    };

    let txns = state.store.transactions().await.map_err(internal(FAILED))?;
    let policies = state.store.policies().await.map_err(internal(FAILED))?;
    let suggestion = state
        .ai
        .suggestions
        .suggest(&txns, &policies, req.transaction.as_ref())
        .await;
    Ok(Json(json!({ "suggestion": suggestion.text })))
}

#[derive(Debug, Deserialize)]
pub(super) struct SuggestionQuery {
    force: Option<String>,
}

impl SuggestionQuery {
    fn force(&self) -> bool {
        self.force
            .as_deref()
            .is_some_and(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1"))
    }
}

#[derive(Debug, Serialize)]
pub(super) struct SuggestionResponse {
    suggestion: String,
    cached: bool,
    timestamp: DateTime<Utc>,
}

/// Suggestion for a stored transaction, served from its 24-hour cache
/// unless stale or forced.
pub(super) async fn policy_suggestion(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<SuggestionQuery>,
) -> Result<Json<SuggestionResponse>, ApiError> {
    const FAILED: &str = "Failed to get policy suggestion";

    let txns = state.store.transactions().await.map_err(internal(FAILED))?;
    let txn = txns.iter().find(|t| t.id == id).ok_or_else(not_found)?;

    let now = Utc::now();
    if let Some(cached) = cached_suggestion(txn, now, query.force()) {
        info!(id = %id, "serving cached policy suggestion");
        return Ok(Json(SuggestionResponse {
            suggestion: cached.content.clone(),
            cached: true,
            timestamp: cached.timestamp,
        }));
    }

    let policies = state.store.policies().await.map_err(internal(FAILED))?;
    let suggestion = state.ai.suggestions.suggest(&txns, &policies, Some(txn)).await;

    if suggestion.is_cacheable() {
        let record = PolicySuggestion::new(suggestion.text.clone(), now);
        let updated = state
            .store
            .update_transaction(&id, |t| t.policy_suggestion = Some(record))
            .await
            .map_err(internal(FAILED))?;
        match updated {
            Some(updated) => {
                state.bus.publish(Event::TransactionUpdated, &updated);
            }
            None => warn!(id = %id, "transaction deleted before suggestion was stored"),
        }
    }

    Ok(Json(SuggestionResponse {
        suggestion: suggestion.text,
        cached: false,
        timestamp: now,
    }))
}

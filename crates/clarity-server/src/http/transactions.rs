use axum::Json;
use axum::extract::{Path, State};
use clarity_core::grouping::{self, Grouped};
use clarity_core::Transaction;
use serde_json::{Value, json};
use tracing::info;

use super::{ApiError, AppState, internal};
use crate::bus::Event;

pub(super) async fn list(State(state): State<AppState>) -> Result<Json<Vec<Transaction>>, ApiError> {
    let txns = state
        .store
        .transactions()
        .await
        .map_err(internal("Failed to read transactions"))?;
    Ok(Json(txns))
}

/// Create a transaction: assign an id, resolve its group, attach an
/// approval recommendation, persist and broadcast.
pub(super) async fn create(
    State(state): State<AppState>,
    Json(mut txn): Json<Transaction>,
) -> Result<Json<Transaction>, ApiError> {
    const FAILED: &str = "Failed to add transaction";

    txn.ensure_id();
    let policies = state.store.policies().await.map_err(internal(FAILED))?;
    let rec = state.ai.approvals.recommend(&txn, &policies).await;
    txn.apply_recommendation(&rec);

    let placement = state
        .store
        .insert_transaction(txn)
        .await
        .map_err(internal(FAILED))?;

    if let Some(owner) = &placement.created_owner {
        state.bus.publish(Event::TransactionNew, owner);
    }
    state.bus.publish(Event::TransactionNew, &placement.member);
    Ok(Json(placement.member))
}

/// Idempotent delete. Members of a deleted owner are ungrouped, not deleted.
pub(super) async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let removal = state
        .store
        .remove_transaction(&id)
        .await
        .map_err(internal("Failed to delete transaction"))?;

    for member in &removal.detached {
        state.bus.publish(Event::TransactionUpdated, member);
    }
    state.bus.publish(Event::TransactionDeleted, &id);
    Ok(Json(json!({ "success": true })))
}

pub(super) async fn groups(State(state): State<AppState>) -> Result<Json<Grouped>, ApiError> {
    let txns = state
        .store
        .transactions()
        .await
        .map_err(internal("Failed to read transactions"))?;
    Ok(Json(grouping::group_transactions(&txns)))
}

/// Delete an owner and all of its members.
pub(super) async fn remove_group(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let deleted = state
        .store
        .remove_group(&id)
        .await
        .map_err(internal("Failed to delete group"))?;

    for deleted_id in &deleted {
        state.bus.publish(Event::TransactionDeleted, deleted_id);
    }
    info!(owner_id = %id, deleted = deleted.len(), "group deleted");
    Ok(Json(json!({ "success": true, "deleted": deleted })))
}

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use clarity_ai::AiGateway;
use clarity_store::Store;
use serde::Serialize;
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::bus::NotificationBus;

mod ai;
mod policies;
mod transactions;
mod ws;

/// Upper bound on any request body.
pub const BODY_LIMIT: usize = 16 * 1024 * 1024;

/// Upper bound on an uploaded receipt image.
pub const RECEIPT_LIMIT: usize = 10 * 1024 * 1024;

pub const NOT_FOUND: &str = "Transaction not found";

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub ai: AiGateway,
    pub bus: NotificationBus,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn json_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn not_found() -> ApiError {
    json_error(StatusCode::NOT_FOUND, NOT_FOUND)
}

/// Log the cause and answer 500 with a generic message.
fn internal(message: &'static str) -> impl FnOnce(clarity_store::StoreError) -> ApiError {
    move |err| {
        error!(error = %err, "{message}");
        json_error(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(banner))
        .route("/healthz", get(healthz))
        .route(
            "/api/transactions",
            get(transactions::list).post(transactions::create),
        )
        .route("/api/transactions/{id}", delete(transactions::remove))
        .route(
            "/api/transactions/{id}/policy-suggestion",
            get(ai::policy_suggestion),
        )
        .route("/api/groups", get(transactions::groups))
        .route("/api/groups/{id}", delete(transactions::remove_group))
        .route("/api/policies", get(policies::get).post(policies::replace))
        .route("/api/analyze-transaction", post(ai::analyze))
        .route("/api/reanalyze-transaction/{id}", post(ai::reanalyze))
        .route("/api/parse-receipt", post(ai::parse_receipt))
        .route("/api/suggest-policy", post(ai::suggest_policy))
        .route("/ws", get(ws::upgrade))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn banner() -> Json<Value> {
    Json(json!({
        "message": "Clarity API Server",
        "status": "Running",
        "endpoints": {
            "transactions": "/api/transactions",
            "groups": "/api/groups",
            "policies": "/api/policies",
            "parseReceipt": "/api/parse-receipt",
            "analyzeTransaction": "/api/analyze-transaction",
            "suggestPolicy": "/api/suggest-policy",
            "websocket": "/ws",
        }
    }))
}

async fn healthz() -> &'static str {
    "ok"
}

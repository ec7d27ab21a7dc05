use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use crm_core::response::{build_record, save_record, validate_query};
use crm_core::types::response_type;
use serde_json::json;

use crate::error::AppError;
use crate::state::AppState;

pub const SAVE_FAILED_MESSAGE: &str = "Failed to save response record";

/// GET /api/responses: record a prospect's response to a follow-up email.
pub async fn record_response(
    State(app): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let query = validate_query(&params)?;
    let record = build_record(query, Utc::now());

    let store = app.store.clone();
    let table = app.table.clone();
    let to_save = record.clone();
    let saved = tokio::task::spawn_blocking(move || save_record(store.as_ref(), &table, &to_save))
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))?;
    if let Err(e) = saved {
        tracing::error!(response_id = %record.response_id, "failed to save response: {e}");
        return Err(AppError::internal(SAVE_FAILED_MESSAGE));
    }

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Response recorded successfully",
            "data": {
                "response_id": record.response_id,
                "received_at": record.received_at,
                "prospect_id": record.prospect_id,
                "response_type": response_type::to_display_string(record.response_type),
            }
        })),
    ))
}

/// OPTIONS /api/responses. With CORS enabled the CORS layer answers first.
pub async fn preflight() -> Json<serde_json::Value> {
    Json(json!({ "message": "OK" }))
}

/// Any other method on /api/responses.
pub async fn method_not_allowed() -> AppError {
    AppError::method_not_allowed("Only GET method is supported")
}

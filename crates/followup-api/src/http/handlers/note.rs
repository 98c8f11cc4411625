//! Note writing onto the lead's CRM timeline.

use std::time::Instant;

use axum::Json;
use axum::extract::State;
use serde_json::json;

use followup_types::chat::CreateNoteRequest;

use crate::http::error::AppError;
use crate::http::extractors::auth::CurrentAccount;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// POST /api/v1/fub/note - Write a note onto the lead's timeline.
pub async fn create_note(
    State(state): State<AppState>,
    current: CurrentAccount,
    Json(body): Json<CreateNoteRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    state
        .assist_service
        .write_note(&current.account, &body.person_id, &body.content)
        .await?;

    tracing::info!(
        account_id = current.account.account_id,
        person_id = %body.person_id,
        "note written to CRM"
    );

    let data = json!({
        "status": "created",
        "person_id": body.person_id,
    });
    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(data, request_id, elapsed)))
}

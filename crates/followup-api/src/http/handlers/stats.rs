//! Dashboard statistics endpoint.
//!
//! GET /api/v1/stats - Aggregate counts for the admin view of the embed.

use std::time::Instant;

use axum::Json;
use axum::extract::State;
use serde_json::json;

use followup_core::repository::{AccountRepository, ChatLogRepository};

use crate::http::error::AppError;
use crate::http::extractors::auth::CurrentAccount;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// GET /api/v1/stats - Aggregate usage statistics.
///
/// Totals come from COUNT(*) queries through the repositories; the cache
/// figure is the live in-process entry count.
pub async fn get_stats(
    State(state): State<AppState>,
    current: CurrentAccount,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let accounts_total = state.accounts.count().await?;
    let messages_total = state.chat_log.count_messages().await?;
    let messages_for_account = state
        .chat_log
        .count_for_account(current.account.account_id)
        .await?;

    let data = json!({
        "accounts_total": accounts_total,
        "messages_total": messages_total,
        "messages_for_account": messages_for_account,
        "cached_leads": state.lead_cache.len(),
        "subscription_status": current.account.subscription_status,
    });

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(
        ApiResponse::success(data, request_id, elapsed).with_link("self", "/api/v1/stats"),
    ))
}

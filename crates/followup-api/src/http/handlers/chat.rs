//! Chat endpoints: ask for a suggestion, read back the conversation log.

use std::net::SocketAddr;
use std::time::Instant;

use axum::Json;
use axum::extract::{ConnectInfo, Query, State};
use axum::http::HeaderMap;
use serde::Deserialize;
use serde_json::json;

use followup_core::ratelimit::RateDecision;
use followup_types::chat::{AskRequest, ChatMessage};

use crate::http::error::AppError;
use crate::http::extractors::auth::CurrentAccount;
use crate::http::extractors::client_ip;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Largest history page a single request may ask for.
const MAX_HISTORY_PAGE: i64 = 200;

/// POST /api/v1/chat/message - Ask the assistant about a lead.
///
/// The expensive endpoint: two CRM round trips on a cache miss plus a
/// completion call, so both the per-account and per-IP budgets apply.
pub async fn ask(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    current: CurrentAccount,
    Json(body): Json<AskRequest>,
) -> Result<Json<ApiResponse<ChatMessage>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let account_decision = state
        .rate_limiter
        .check_account(current.account.account_id)
        .await;
    if let RateDecision::Limited { retry_after_secs } = account_decision {
        return Err(AppError::RateLimited { retry_after_secs });
    }
    let ip = client_ip(&headers, &addr);
    if let RateDecision::Limited { retry_after_secs } = state.rate_limiter.check_ip(&ip).await {
        return Err(AppError::RateLimited { retry_after_secs });
    }

    let reply = state
        .assist_service
        .suggest(&current.account, &body.person_id, &body.question)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    let history = format!("/api/v1/chat/history?person_id={}", body.person_id);
    Ok(Json(
        ApiResponse::success(reply, request_id, elapsed).with_link("history", &history),
    ))
}

/// Query parameters for GET /api/v1/chat/history.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub person_id: String,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/v1/chat/history - Conversation log for one lead, oldest first.
pub async fn history(
    State(state): State<AppState>,
    current: CurrentAccount,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let limit = query.limit.map(|l| l.clamp(1, MAX_HISTORY_PAGE));
    let offset = query.offset.map(|o| o.max(0));

    let messages = state
        .assist_service
        .history(&current.account, &query.person_id, limit, offset)
        .await?;

    let data = json!({
        "person_id": query.person_id,
        "count": messages.len(),
        "messages": messages,
    });
    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(data, request_id, elapsed)))
}

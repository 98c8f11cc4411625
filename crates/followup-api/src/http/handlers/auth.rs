//! Session endpoints for the embedded widget.
//!
//! POST /api/v1/auth/iframe-login - exchange a signed embed context for a JWT.
//! GET  /api/v1/auth/refresh      - re-issue a token close to expiry.

use std::net::SocketAddr;
use std::time::Instant;

use axum::Json;
use axum::extract::{ConnectInfo, State};
use axum::http::HeaderMap;
use serde_json::json;

use followup_core::ratelimit::RateDecision;
use followup_core::repository::AccountRepository;
use followup_infra::auth::context::verify_and_decode;
use followup_infra::auth::jwt::TOKEN_TTL_SECS;
use followup_types::chat::IframeLoginRequest;

use crate::http::error::AppError;
use crate::http::extractors::auth::CurrentAccount;
use crate::http::extractors::client_ip;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// POST /api/v1/auth/iframe-login - Authenticate the iframe widget.
///
/// Verifies the HMAC signature over the raw base64 context, upserts the
/// tenant account, and returns a 24-hour session token. This endpoint is
/// unauthenticated, so it is IP rate limited.
pub async fn iframe_login(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(body): Json<IframeLoginRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let ip = client_ip(&headers, &addr);
    if let RateDecision::Limited { retry_after_secs } = state.rate_limiter.check_ip(&ip).await {
        return Err(AppError::RateLimited { retry_after_secs });
    }

    let fub_account_id = verify_and_decode(
        &state.settings.fub_embed_secret,
        &body.context,
        &body.signature,
    )?;

    let account = state
        .accounts
        .upsert_by_fub_account_id(&fub_account_id)
        .await?;
    let token = state
        .token_service
        .issue(account.account_id, &account.fub_account_id)?;

    tracing::info!(account_id = account.account_id, "iframe login");

    let data = json!({
        "token": token,
        "expires_in_secs": TOKEN_TTL_SECS,
        "account": account,
    });
    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(
        ApiResponse::success(data, request_id, elapsed)
            .with_link("refresh", "/api/v1/auth/refresh"),
    ))
}

/// GET /api/v1/auth/refresh - Re-issue a session token.
///
/// Returns a new token only when the current one is inside the refresh
/// window; otherwise `token` is null and the widget keeps what it has.
pub async fn refresh(
    State(state): State<AppState>,
    current: CurrentAccount,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let token = if current.claims.should_refresh() {
        Some(
            state
                .token_service
                .issue(current.account.account_id, &current.account.fub_account_id)?,
        )
    } else {
        None
    };

    let data = json!({
        "refreshed": token.is_some(),
        "token": token,
        "expires_in_secs": TOKEN_TTL_SECS,
    });
    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(data, request_id, elapsed)))
}

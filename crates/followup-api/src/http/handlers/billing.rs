//! Stripe billing endpoints: checkout, customer portal, and the webhook.

use std::time::Instant;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use serde_json::json;

use followup_core::billing::classify_event;
use followup_infra::billing::webhook::verify_webhook_signature;
use followup_types::error::BillingError;

use crate::http::error::AppError;
use crate::http::extractors::auth::CurrentAccount;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// POST /api/v1/stripe/checkout - Start a subscription Checkout Session.
///
/// The returned URL is opened by the widget in a new tab; Stripe redirects
/// back to the embed origin when the tenant finishes or cancels.
pub async fn create_checkout(
    State(state): State<AppState>,
    current: CurrentAccount,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let origin = &state.settings.frontend_embed_origin;
    let success_url = format!("{origin}/billing/success?session_id={{CHECKOUT_SESSION_ID}}");
    let cancel_url = format!("{origin}/billing/cancelled");

    let session = state
        .stripe
        .create_checkout_session(
            &current.account.fub_account_id,
            current.account.stripe_customer_id.as_deref(),
            &success_url,
            &cancel_url,
        )
        .await?;

    tracing::info!(
        account_id = current.account.account_id,
        session_id = %session.id,
        "checkout session created"
    );

    let data = json!({
        "checkout_url": session.url,
        "session_id": session.id,
    });
    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(data, request_id, elapsed)))
}

/// POST /api/v1/stripe/portal - Open the Stripe customer portal.
///
/// Requires a linked Stripe customer, which only exists after the first
/// completed checkout.
pub async fn create_portal(
    State(state): State<AppState>,
    current: CurrentAccount,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let customer_id = current
        .account
        .stripe_customer_id
        .as_deref()
        .ok_or_else(|| {
            AppError::Validation("no billing profile yet, complete checkout first".to_string())
        })?;

    let return_url = format!("{}/billing", state.settings.frontend_embed_origin);
    let session = state
        .stripe
        .create_portal_session(customer_id, &return_url)
        .await?;

    let data = json!({ "portal_url": session.url });
    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(data, request_id, elapsed)))
}

/// POST /api/v1/stripe/webhook - Handle a Stripe lifecycle event.
///
/// The signature covers the raw body, so the body must not pass through
/// a JSON extractor before verification.
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            AppError::Billing(BillingError::MalformedPayload(
                "missing Stripe-Signature header".to_string(),
            ))
        })?;

    verify_webhook_signature(&state.settings.stripe_webhook_secret, &body, signature)?;

    let event: serde_json::Value = serde_json::from_slice(&body).map_err(|e| {
        AppError::Billing(BillingError::MalformedPayload(format!("invalid JSON: {e}")))
    })?;

    let update = classify_event(&event)?;
    let outcome = state.billing_service.apply(update).await?;

    tracing::info!(
        event = event.get("type").and_then(|v| v.as_str()).unwrap_or("unknown"),
        ?outcome,
        "billing webhook processed"
    );

    let data = json!({ "received": true });
    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(data, request_id, elapsed)))
}

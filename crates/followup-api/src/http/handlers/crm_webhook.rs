//! Follow Up Boss webhook receiver.
//!
//! The CRM posts change notifications (people updated, notes created) with
//! an HMAC signature over the raw body, keyed by the same embed secret as
//! the iframe context. On a verified event the cached context for every
//! named person is dropped so the next question sees fresh data.

use std::time::Instant;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use secrecy::ExposeSecret;
use serde_json::json;

use followup_infra::auth::hmac::verify_signature_hex;
use followup_types::error::AuthError;

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Header carrying the hex HMAC-SHA256 digest of the raw body.
const SIGNATURE_HEADER: &str = "fub-signature";

/// POST /api/v1/fub/webhook - Handle a CRM change notification.
pub async fn fub_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::Auth(AuthError::MissingCredentials))?;

    verify_signature_hex(
        state.settings.fub_embed_secret.expose_secret().as_bytes(),
        &body,
        signature,
    )?;

    let event: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|e| AppError::Validation(format!("invalid webhook JSON: {e}")))?;

    let person_ids = resource_ids(&event);
    for person_id in &person_ids {
        state.assist_service.invalidate_lead(person_id);
    }

    tracing::info!(
        event = event.get("event").and_then(|v| v.as_str()).unwrap_or("unknown"),
        invalidated = person_ids.len(),
        "CRM webhook processed"
    );

    let data = json!({ "invalidated": person_ids.len() });
    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(data, request_id, elapsed)))
}

/// Person ids named by the event. The CRM sends them as numbers; strings
/// are accepted too.
fn resource_ids(event: &serde_json::Value) -> Vec<String> {
    event
        .get("resourceIds")
        .and_then(|v| v.as_array())
        .map(|ids| {
            ids.iter()
                .filter_map(|id| match id {
                    serde_json::Value::Number(n) => Some(n.to_string()),
                    serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_resource_ids() {
        let event = json!({ "event": "peopleUpdated", "resourceIds": [11, 22] });
        assert_eq!(resource_ids(&event), vec!["11", "22"]);
    }

    #[test]
    fn test_string_resource_ids() {
        let event = json!({ "resourceIds": ["11", "", "22"] });
        assert_eq!(resource_ids(&event), vec!["11", "22"]);
    }

    #[test]
    fn test_missing_resource_ids() {
        let event = json!({ "event": "peopleUpdated" });
        assert!(resource_ids(&event).is_empty());
    }
}

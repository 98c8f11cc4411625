//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use followup_types::error::{AssistError, AuthError, BillingError, CrmError, RepositoryError};

use crate::http::response::ApiResponse;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Iframe or bearer-token authentication failure.
    Auth(AuthError),
    /// Failure in the assist pipeline (suggestions, history, notes).
    Assist(AssistError),
    /// Billing webhook or Stripe API failure.
    Billing(BillingError),
    /// Storage failure outside the assist pipeline.
    Repository(RepositoryError),
    /// The caller exhausted a rate-limit budget.
    RateLimited { retry_after_secs: u64 },
    /// Request shape problem caught before any service ran.
    Validation(String),
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        AppError::Auth(e)
    }
}

impl From<AssistError> for AppError {
    fn from(e: AssistError) -> Self {
        AppError::Assist(e)
    }
}

impl From<BillingError> for AppError {
    fn from(e: BillingError) -> Self {
        AppError::Billing(e)
    }
}

impl From<RepositoryError> for AppError {
    fn from(e: RepositoryError) -> Self {
        AppError::Repository(e)
    }
}

impl AppError {
    /// Status code, machine-readable code, and message for this error.
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Auth(AuthError::MissingCredentials) => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Missing bearer token. Authenticate via POST /api/v1/auth/iframe-login first."
                    .to_string(),
            ),
            AppError::Auth(AuthError::TokenExpired) => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_EXPIRED",
                "Session token expired".to_string(),
            ),
            AppError::Auth(AuthError::TokenInvalid) => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_INVALID",
                "Session token invalid".to_string(),
            ),
            AppError::Auth(AuthError::InvalidSignature) => (
                StatusCode::UNAUTHORIZED,
                "INVALID_SIGNATURE",
                "Signature verification failed".to_string(),
            ),
            AppError::Auth(AuthError::MalformedContext(msg)) => (
                StatusCode::BAD_REQUEST,
                "MALFORMED_CONTEXT",
                msg.clone(),
            ),
            AppError::Assist(AssistError::Validation(msg)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Assist(AssistError::SubscriptionRequired) => (
                StatusCode::FORBIDDEN,
                "SUBSCRIPTION_REQUIRED",
                "An active subscription is required".to_string(),
            ),
            AppError::Assist(AssistError::Crm(CrmError::PersonNotFound)) => (
                StatusCode::NOT_FOUND,
                "PERSON_NOT_FOUND",
                "Person not found in the CRM".to_string(),
            ),
            AppError::Assist(AssistError::Crm(CrmError::RateLimited)) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "CRM_RATE_LIMITED",
                "The CRM is rate limiting us, retry shortly".to_string(),
            ),
            AppError::Assist(AssistError::Crm(e)) => {
                (StatusCode::BAD_GATEWAY, "CRM_ERROR", e.to_string())
            }
            AppError::Assist(AssistError::Llm(e)) => {
                (StatusCode::BAD_GATEWAY, "LLM_ERROR", e.to_string())
            }
            AppError::Assist(AssistError::Repository(e)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORAGE_ERROR",
                e.to_string(),
            ),
            AppError::Billing(
                e @ (BillingError::SignatureInvalid
                | BillingError::StaleTimestamp
                | BillingError::MalformedPayload(_)),
            ) => (StatusCode::BAD_REQUEST, "WEBHOOK_REJECTED", e.to_string()),
            AppError::Billing(e) => (StatusCode::BAD_GATEWAY, "BILLING_ERROR", e.to_string()),
            AppError::Repository(RepositoryError::NotFound) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                "Not found".to_string(),
            ),
            AppError::Repository(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORAGE_ERROR",
                e.to_string(),
            ),
            AppError::RateLimited { retry_after_secs } => (
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMITED",
                format!("Too many requests, retry in {retry_after_secs}s"),
            ),
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        if status.is_server_error() {
            tracing::error!(code, %message, "request failed");
        }

        let request_id = uuid::Uuid::now_v7().to_string();
        let body = ApiResponse::error(code, &message, request_id);

        let mut response = (status, axum::Json(body)).into_response();
        if let AppError::RateLimited { retry_after_secs } = self {
            if let Ok(value) = retry_after_secs.to_string().parse() {
                response.headers_mut().insert("retry-after", value);
            }
        }
        response
    }
}

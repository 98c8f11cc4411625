use thiserror::Error;

/// Errors from repository operations (used by trait definitions in followup-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors related to iframe and bearer-token authentication.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("signature verification failed")]
    InvalidSignature,

    #[error("malformed embed context: {0}")]
    MalformedContext(String),

    #[error("token expired")]
    TokenExpired,

    #[error("invalid token")]
    TokenInvalid,

    #[error("missing credentials")]
    MissingCredentials,
}

/// Errors from the Follow Up Boss API client.
#[derive(Debug, Error)]
pub enum CrmError {
    #[error("CRM rejected credentials")]
    Unauthorized,

    #[error("person not found")]
    PersonNotFound,

    #[error("CRM rate limit hit")]
    RateLimited,

    #[error("CRM API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("CRM transport error: {0}")]
    Transport(String),

    #[error("OAuth token refresh failed: {0}")]
    TokenRefresh(String),
}

/// Errors from Stripe billing operations.
#[derive(Debug, Error)]
pub enum BillingError {
    #[error("webhook signature verification failed")]
    SignatureInvalid,

    #[error("webhook timestamp outside tolerance")]
    StaleTimestamp,

    #[error("malformed webhook payload: {0}")]
    MalformedPayload(String),

    #[error("billing API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("billing transport error: {0}")]
    Transport(String),
}

/// Errors from the assist pipeline (chat suggestions and note writing).
///
/// Composes the lower-level taxonomies so handlers can map each case to a
/// distinct HTTP status.
#[derive(Debug, Error)]
pub enum AssistError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("an active subscription is required")]
    SubscriptionRequired,

    #[error(transparent)]
    Crm(#[from] CrmError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Errors from the completion provider.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("completion API error: {0}")]
    Api(String),

    #[error("completion transport error: {0}")]
    Transport(String),

    #[error("provider returned an empty completion")]
    EmptyCompletion,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }

    #[test]
    fn test_crm_error_display() {
        let err = CrmError::Api {
            status: 503,
            message: "maintenance".to_string(),
        };
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("maintenance"));
    }

    #[test]
    fn test_auth_error_display() {
        let err = AuthError::MalformedContext("not json".to_string());
        assert_eq!(err.to_string(), "malformed embed context: not json");
    }
}

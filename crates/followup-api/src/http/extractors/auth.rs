//! Bearer-token authentication extractor.
//!
//! Verifies the `Authorization: Bearer <jwt>` header issued by the
//! iframe-login endpoint and loads the tenant's account row. Handlers that
//! take a [`CurrentAccount`] parameter are authenticated by construction.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use followup_core::repository::AccountRepository;
use followup_infra::auth::jwt::SessionClaims;
use followup_types::account::Account;
use followup_types::error::AuthError;

use crate::http::error::AppError;
use crate::state::AppState;

/// The authenticated tenant behind a request.
pub struct CurrentAccount {
    pub account: Account,
    pub claims: SessionClaims,
}

impl FromRequestParts<AppState> for CurrentAccount {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer(parts)?;
        let claims = state.token_service.verify(&token)?;

        // The account can disappear between token issue and use, e.g. after
        // a database restore. Treat that the same as a bad token.
        let account = state
            .accounts
            .get(claims.account_id)
            .await
            .map_err(AppError::from)?
            .ok_or(AppError::Auth(AuthError::TokenInvalid))?;

        Ok(CurrentAccount { account, claims })
    }
}

/// Pull the bearer token out of the Authorization header.
fn extract_bearer(parts: &Parts) -> Result<String, AuthError> {
    let auth = parts
        .headers
        .get("authorization")
        .ok_or(AuthError::MissingCredentials)?;
    let auth = auth.to_str().map_err(|_| AuthError::MissingCredentials)?;
    auth.strip_prefix("Bearer ")
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::MissingCredentials)
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::http::Request;

    fn parts_with_auth(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/v1/stats");
        if let Some(value) = value {
            builder = builder.header("authorization", value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_extracts_bearer_token() {
        let parts = parts_with_auth(Some("Bearer abc.def.ghi"));
        assert_eq!(extract_bearer(&parts).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_missing_header_rejected() {
        let parts = parts_with_auth(None);
        assert!(matches!(
            extract_bearer(&parts),
            Err(AuthError::MissingCredentials)
        ));
    }

    #[test]
    fn test_non_bearer_scheme_rejected() {
        let parts = parts_with_auth(Some("Basic dXNlcjpwdw=="));
        assert!(matches!(
            extract_bearer(&parts),
            Err(AuthError::MissingCredentials)
        ));
    }

    #[test]
    fn test_empty_token_rejected() {
        let parts = parts_with_auth(Some("Bearer "));
        assert!(matches!(
            extract_bearer(&parts),
            Err(AuthError::MissingCredentials)
        ));
    }
}

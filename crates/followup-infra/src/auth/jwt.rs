//! Session tokens for the embedded widget.
//!
//! After the embed context checks out, the widget gets a signed JWT and
//! uses it as a bearer token. Tokens live 24 hours; the refresh endpoint
//! re-issues them when they are close to expiry.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use followup_types::error::AuthError;

/// Session lifetime.
pub const TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

/// Remaining lifetime below which the refresh endpoint issues a new token.
pub const REFRESH_THRESHOLD_SECS: i64 = 15 * 60;

/// Claims carried by a widget session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub account_id: i64,
    pub fub_account_id: String,
    pub exp: i64,
    pub iat: i64,
}

impl SessionClaims {
    /// True when the token is inside the refresh window.
    pub fn should_refresh(&self) -> bool {
        self.exp - Utc::now().timestamp() < REFRESH_THRESHOLD_SECS
    }
}

/// Issues and verifies widget session tokens (HS256).
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenService {
    pub fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
        }
    }

    /// Issue a fresh 24-hour token for an authenticated tenant.
    pub fn issue(&self, account_id: i64, fub_account_id: &str) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = SessionClaims {
            account_id,
            fub_account_id: fub_account_id.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(TOKEN_TTL_SECS)).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|_| AuthError::TokenInvalid)
    }

    /// Verify a bearer token and return its claims.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        decode::<SessionClaims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::TokenInvalid,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new(&SecretString::from("test-jwt-secret"))
    }

    #[test]
    fn test_issue_and_verify_round_trip() {
        let svc = service();
        let token = svc.issue(7, "fub-7").unwrap();
        let claims = svc.verify(&token).unwrap();

        assert_eq!(claims.account_id, 7);
        assert_eq!(claims.fub_account_id, "fub-7");
        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_SECS);
    }

    #[test]
    fn test_fresh_token_is_not_in_refresh_window() {
        let svc = service();
        let token = svc.issue(1, "fub-1").unwrap();
        assert!(!svc.verify(&token).unwrap().should_refresh());
    }

    #[test]
    fn test_near_expiry_token_wants_refresh() {
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            account_id: 1,
            fub_account_id: "fub-1".to_string(),
            iat: now - TOKEN_TTL_SECS,
            exp: now + 60,
        };
        assert!(claims.should_refresh());
    }

    #[test]
    fn test_expired_token_rejected() {
        let svc = service();
        let now = Utc::now();
        // Past the default validation leeway.
        let claims = SessionClaims {
            account_id: 1,
            fub_account_id: "fub-1".to_string(),
            iat: (now - Duration::hours(25)).timestamp(),
            exp: (now - Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-jwt-secret"),
        )
        .unwrap();

        assert!(matches!(svc.verify(&token), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let svc = service();
        let other = TokenService::new(&SecretString::from("other-secret"));
        let token = other.issue(1, "fub-1").unwrap();
        assert!(matches!(svc.verify(&token), Err(AuthError::TokenInvalid)));
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(matches!(
            service().verify("not.a.jwt"),
            Err(AuthError::TokenInvalid)
        ));
    }
}

//! FubClient -- concrete [`CrmGateway`] implementation for the Follow Up Boss
//! REST API.
//!
//! Requests authenticate with the tenant's OAuth access token. On a 401 the
//! client refreshes the token once and retries; new tokens ride back to the
//! caller on [`CrmResponse`] so they can be persisted.
//!
//! The client secret is wrapped in [`secrecy::SecretString`] and is never
//! logged or included in `Debug` output.

use std::time::Duration;

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use followup_core::crm::{CrmGateway, CrmResponse, RefreshedTokens};
use followup_types::account::Account;
use followup_types::error::CrmError;
use followup_types::lead::{Activity, ActivityList, Person};

/// Activities fetched per lead, newest first.
const ACTIVITY_FETCH_LIMIT: u32 = 20;

/// Follow Up Boss CRM client.
///
/// Implements [`CrmGateway`] over the FUB v1 REST API.
pub struct FubClient {
    client: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: SecretString,
}

// FubClient intentionally does NOT derive Debug so the client secret can
// never end up in logs or panic output.

impl FubClient {
    pub fn new(base_url: String, client_id: String, client_secret: SecretString) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to create reqwest client");

        Self {
            client,
            base_url,
            client_id,
            client_secret,
        }
    }

    /// Build the full API URL for a given path.
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn person_path(person_id: &str) -> String {
        format!("/v1/people/{person_id}")
    }

    fn activities_path(person_id: &str) -> String {
        format!(
            "/v1/people/{person_id}/activities?limit={ACTIVITY_FETCH_LIMIT}&sort=-created"
        )
    }

    fn notes_path(person_id: &str) -> String {
        format!("/v1/people/{person_id}/notes")
    }

    /// Exchange a refresh token for a new access token.
    async fn refresh_tokens(&self, refresh_token: &str) -> Result<RefreshedTokens, CrmError> {
        let response = self
            .client
            .post(self.url("/v1/oauth/token"))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.expose_secret()),
            ])
            .send()
            .await
            .map_err(|e| CrmError::TokenRefresh(format!("refresh request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CrmError::TokenRefresh(format!("HTTP {status}: {body}")));
        }

        let tokens: OAuthTokenResponse = response
            .json()
            .await
            .map_err(|e| CrmError::TokenRefresh(format!("invalid token response: {e}")))?;

        tracing::info!("refreshed FUB access token");
        Ok(RefreshedTokens {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        })
    }

    /// Send a GET, refreshing the access token once on a 401.
    async fn get_with_refresh<T: DeserializeOwned>(
        &self,
        account: &Account,
        path: &str,
    ) -> Result<CrmResponse<T>, CrmError> {
        let access = account
            .fub_access_token
            .as_deref()
            .ok_or(CrmError::Unauthorized)?;

        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(access)
            .send()
            .await
            .map_err(|e| CrmError::Transport(e.to_string()))?;

        if response.status() == StatusCode::UNAUTHORIZED {
            let refresh = account
                .fub_refresh_token
                .as_deref()
                .ok_or(CrmError::Unauthorized)?;
            let tokens = self.refresh_tokens(refresh).await?;

            let retry = self
                .client
                .get(self.url(path))
                .bearer_auth(&tokens.access_token)
                .send()
                .await
                .map_err(|e| CrmError::Transport(e.to_string()))?;

            let value = parse_json(retry).await?;
            return Ok(CrmResponse {
                value,
                refreshed: Some(tokens),
            });
        }

        let value = parse_json(response).await?;
        Ok(CrmResponse::plain(value))
    }
}

impl CrmGateway for FubClient {
    async fn fetch_person(
        &self,
        account: &Account,
        person_id: &str,
    ) -> Result<CrmResponse<Person>, CrmError> {
        self.get_with_refresh(account, &Self::person_path(person_id))
            .await
    }

    async fn fetch_activities(
        &self,
        account: &Account,
        person_id: &str,
    ) -> Result<CrmResponse<Vec<Activity>>, CrmError> {
        let response: CrmResponse<ActivityList> = self
            .get_with_refresh(account, &Self::activities_path(person_id))
            .await?;
        Ok(CrmResponse {
            value: response.value.activities,
            refreshed: response.refreshed,
        })
    }

    async fn create_note(
        &self,
        account: &Account,
        person_id: &str,
        content: &str,
    ) -> Result<CrmResponse<()>, CrmError> {
        let access = account
            .fub_access_token
            .as_deref()
            .ok_or(CrmError::Unauthorized)?;
        let body = serde_json::json!({ "content": content });
        let path = Self::notes_path(person_id);

        let response = self
            .client
            .post(self.url(&path))
            .bearer_auth(access)
            .json(&body)
            .send()
            .await
            .map_err(|e| CrmError::Transport(e.to_string()))?;

        if response.status() == StatusCode::UNAUTHORIZED {
            let refresh = account
                .fub_refresh_token
                .as_deref()
                .ok_or(CrmError::Unauthorized)?;
            let tokens = self.refresh_tokens(refresh).await?;

            let retry = self
                .client
                .post(self.url(&path))
                .bearer_auth(&tokens.access_token)
                .json(&body)
                .send()
                .await
                .map_err(|e| CrmError::Transport(e.to_string()))?;

            check_status(retry).await?;
            return Ok(CrmResponse {
                value: (),
                refreshed: Some(tokens),
            });
        }

        check_status(response).await?;
        Ok(CrmResponse::plain(()))
    }
}

#[derive(Debug, Deserialize)]
struct OAuthTokenResponse {
    access_token: String,
    refresh_token: Option<String>,
}

/// Map a non-success status onto the CRM error taxonomy.
fn map_error_status(status: StatusCode, body: String) -> CrmError {
    match status.as_u16() {
        401 => CrmError::Unauthorized,
        404 => CrmError::PersonNotFound,
        429 => CrmError::RateLimited,
        code => CrmError::Api {
            status: code,
            message: body,
        },
    }
}

async fn check_status(response: reqwest::Response) -> Result<(), CrmError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(map_error_status(status, body))
}

async fn parse_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, CrmError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(map_error_status(status, body));
    }
    response
        .json()
        .await
        .map_err(|e| CrmError::Api {
            status: status.as_u16(),
            message: format!("failed to parse response: {e}"),
        })
}

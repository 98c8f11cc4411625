//! CrmGateway trait definition.
//!
//! The gateway wraps the Follow Up Boss REST API. Because FUB access tokens
//! expire, any call may transparently refresh the OAuth pair; the refreshed
//! tokens ride back on the response so the caller can persist them.

use followup_types::account::Account;
use followup_types::error::CrmError;
use followup_types::lead::{Activity, Person};

/// A replacement OAuth token pair produced by a mid-call refresh.
#[derive(Debug, Clone)]
pub struct RefreshedTokens {
    pub access_token: String,
    /// FUB rotates refresh tokens on some plans; `None` keeps the old one.
    pub refresh_token: Option<String>,
}

/// A gateway response carrying the payload plus any refreshed credentials.
#[derive(Debug, Clone)]
pub struct CrmResponse<T> {
    pub value: T,
    pub refreshed: Option<RefreshedTokens>,
}

impl<T> CrmResponse<T> {
    pub fn plain(value: T) -> Self {
        Self {
            value,
            refreshed: None,
        }
    }
}

/// Trait for the CRM backend (Follow Up Boss).
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
/// Implementations live in followup-infra (e.g., `FubClient`).
pub trait CrmGateway: Send + Sync {
    /// Fetch a person record.
    fn fetch_person(
        &self,
        account: &Account,
        person_id: &str,
    ) -> impl std::future::Future<Output = Result<CrmResponse<Person>, CrmError>> + Send;

    /// Fetch the most recent activities for a person, newest first.
    fn fetch_activities(
        &self,
        account: &Account,
        person_id: &str,
    ) -> impl std::future::Future<Output = Result<CrmResponse<Vec<Activity>>, CrmError>> + Send;

    /// Write a note onto a person's timeline.
    fn create_note(
        &self,
        account: &Account,
        person_id: &str,
        content: &str,
    ) -> impl std::future::Future<Output = Result<CrmResponse<()>, CrmError>> + Send;
}

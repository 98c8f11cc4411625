//! AccountRepository trait definition.

use followup_types::account::{Account, SubscriptionStatus};
use followup_types::error::RepositoryError;

/// Repository trait for tenant account persistence.
///
/// Implementations live in followup-infra (e.g., `SqliteAccountRepository`).
pub trait AccountRepository: Send + Sync {
    /// Fetch the account for a FUB account id, creating it with default
    /// (trialing) status when it does not exist yet.
    ///
    /// Idempotent: calling twice with the same id returns the same row.
    fn upsert_by_fub_account_id(
        &self,
        fub_account_id: &str,
    ) -> impl std::future::Future<Output = Result<Account, RepositoryError>> + Send;

    /// Get an account by its primary key.
    fn get(
        &self,
        account_id: i64,
    ) -> impl std::future::Future<Output = Result<Option<Account>, RepositoryError>> + Send;

    /// Get an account by its FUB account id.
    fn get_by_fub_account_id(
        &self,
        fub_account_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<Account>, RepositoryError>> + Send;

    /// Get an account by its Stripe customer id.
    fn get_by_stripe_customer_id(
        &self,
        customer_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<Account>, RepositoryError>> + Send;

    /// Update the subscription status of an account.
    fn set_subscription_status(
        &self,
        account_id: i64,
        status: SubscriptionStatus,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Record the Stripe customer id after a completed checkout.
    fn set_stripe_customer_id(
        &self,
        account_id: i64,
        customer_id: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Replace the stored CRM OAuth token pair.
    ///
    /// A `None` refresh token keeps the existing one.
    fn set_oauth_tokens(
        &self,
        account_id: i64,
        access_token: &str,
        refresh_token: Option<&str>,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Count total accounts.
    fn count(&self) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}

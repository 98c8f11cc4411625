//! Application state wiring all services together.
//!
//! Services are generic over repository/gateway traits, but AppState pins
//! them to the concrete infra implementations. Every repository instance
//! shares the same [`DatabasePool`], so the single-writer discipline holds
//! across the whole process.

use std::sync::Arc;

use followup_core::assist::{AssistService, LeadCache};
use followup_core::billing::BillingService;
use followup_core::ratelimit::{RateLimitConfig, RateLimiter};
use followup_infra::auth::jwt::TokenService;
use followup_infra::billing::StripeClient;
use followup_infra::config::Settings;
use followup_infra::crm::FubClient;
use followup_infra::llm::OpenAiCompletionClient;
use followup_infra::sqlite::account::SqliteAccountRepository;
use followup_infra::sqlite::chat::SqliteChatLogRepository;
use followup_infra::sqlite::pool::DatabasePool;
use followup_infra::sqlite::rate_limit::SqliteRateLimitRepository;

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcreteAssistService = AssistService<
    SqliteAccountRepository,
    SqliteChatLogRepository,
    FubClient,
    OpenAiCompletionClient,
>;

pub type ConcreteBillingService = BillingService<SqliteAccountRepository>;

pub type ConcreteRateLimiter = RateLimiter<SqliteRateLimitRepository>;

/// Shared application state holding all services.
#[derive(Clone)]
pub struct AppState {
    pub assist_service: Arc<ConcreteAssistService>,
    pub billing_service: Arc<ConcreteBillingService>,
    pub rate_limiter: Arc<ConcreteRateLimiter>,
    pub token_service: Arc<TokenService>,
    pub stripe: Arc<StripeClient>,
    pub accounts: Arc<SqliteAccountRepository>,
    pub chat_log: Arc<SqliteChatLogRepository>,
    pub lead_cache: Arc<LeadCache>,
    pub settings: Arc<Settings>,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Initialize the application state: connect to DB, wire services.
    pub async fn init(settings: Settings) -> anyhow::Result<Self> {
        // Ensure the directory holding the SQLite file exists.
        if let Some(dir) = sqlite_parent_dir(&settings.database_url) {
            tokio::fs::create_dir_all(&dir).await?;
        }

        let db_pool = DatabasePool::new(&settings.database_url).await?;

        let lead_cache = Arc::new(LeadCache::default());

        let crm = FubClient::new(
            settings.fub_api_base.clone(),
            settings.fub_client_id.clone(),
            settings.fub_client_secret.clone(),
        );
        let completions =
            OpenAiCompletionClient::new(&settings.openai_api_key, settings.openai_model.clone());

        let assist_service = AssistService::new(
            SqliteAccountRepository::new(db_pool.clone()),
            SqliteChatLogRepository::new(db_pool.clone()),
            crm,
            completions,
            lead_cache.clone(),
        );

        let billing_service = BillingService::new(SqliteAccountRepository::new(db_pool.clone()));

        let rate_limiter = RateLimiter::new(
            SqliteRateLimitRepository::new(db_pool.clone()),
            RateLimitConfig {
                account_limit: settings.rate_limit_rpm,
                ip_limit: settings.rate_limit_rpm_ip,
            },
        );

        let token_service = TokenService::new(&settings.jwt_secret);
        let stripe = StripeClient::new(
            settings.stripe_secret_key.clone(),
            settings.stripe_price_id_monthly.clone(),
        );

        Ok(Self {
            assist_service: Arc::new(assist_service),
            billing_service: Arc::new(billing_service),
            rate_limiter: Arc::new(rate_limiter),
            token_service: Arc::new(token_service),
            stripe: Arc::new(stripe),
            accounts: Arc::new(SqliteAccountRepository::new(db_pool.clone())),
            chat_log: Arc::new(SqliteChatLogRepository::new(db_pool.clone())),
            lead_cache,
            settings: Arc::new(settings),
            db_pool,
        })
    }
}

/// Directory that must exist for a `sqlite://` URL to be creatable.
///
/// Returns `None` for in-memory databases and URLs without a parent.
fn sqlite_parent_dir(database_url: &str) -> Option<std::path::PathBuf> {
    let path = database_url.strip_prefix("sqlite://")?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() || path == ":memory:" {
        return None;
    }
    let parent = std::path::Path::new(path).parent()?;
    if parent.as_os_str().is_empty() {
        return None;
    }
    Some(parent.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_parent_dir() {
        assert_eq!(
            sqlite_parent_dir("sqlite:///var/lib/fwup/followup.db"),
            Some(std::path::PathBuf::from("/var/lib/fwup"))
        );
        assert_eq!(
            sqlite_parent_dir("sqlite:///var/lib/fwup/followup.db?mode=rwc"),
            Some(std::path::PathBuf::from("/var/lib/fwup"))
        );
        assert_eq!(sqlite_parent_dir("sqlite://:memory:"), None);
        assert_eq!(sqlite_parent_dir("postgres://localhost/db"), None);
    }
}

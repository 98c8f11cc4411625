//! Sliding-window rate limiting over the persistence layer.
//!
//! Limits are enforced per account and per client IP with independent
//! budgets. The limiter fails open: a storage error during the check is
//! logged and the request is allowed, so a database hiccup degrades to
//! "no limiting" rather than a hard outage of the whole API.

use chrono::{Duration as ChronoDuration, Utc};

use crate::repository::RateLimitRepository;

/// Window length in seconds.
pub const WINDOW_SECS: i64 = 60;

/// Default per-account budget within one window.
pub const DEFAULT_ACCOUNT_LIMIT: u32 = 10;

/// Default per-IP budget within one window.
pub const DEFAULT_IP_LIMIT: u32 = 100;

/// Limiter configuration, sourced from `Settings` at startup.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub account_limit: u32,
    pub ip_limit: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            account_limit: DEFAULT_ACCOUNT_LIMIT,
            ip_limit: DEFAULT_IP_LIMIT,
        }
    }
}

/// Result of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    Limited { retry_after_secs: u64 },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed)
    }
}

/// Sliding-window limiter backed by a `RateLimitRepository`.
pub struct RateLimiter<R: RateLimitRepository> {
    repo: R,
    config: RateLimitConfig,
}

impl<R: RateLimitRepository> RateLimiter<R> {
    pub fn new(repo: R, config: RateLimitConfig) -> Self {
        Self { repo, config }
    }

    /// Check and record one request for an account.
    pub async fn check_account(&self, account_id: i64) -> RateDecision {
        self.check(&format!("account:{account_id}"), self.config.account_limit)
            .await
    }

    /// Check and record one request for a client IP.
    pub async fn check_ip(&self, ip: &str) -> RateDecision {
        self.check(&format!("ip:{ip}"), self.config.ip_limit).await
    }

    /// Delete every entry older than the window, across all identifiers.
    ///
    /// `check` prunes only the identifier it touches, so identifiers that
    /// stop sending requests leave rows behind. A periodic task calls this
    /// to clean those up.
    pub async fn purge_expired(&self) -> Result<u64, followup_types::error::RepositoryError> {
        let cutoff = Utc::now() - ChronoDuration::seconds(WINDOW_SECS);
        self.repo.purge_expired(cutoff).await
    }

    async fn check(&self, identifier: &str, limit: u32) -> RateDecision {
        let now = Utc::now();
        let window_start = now - ChronoDuration::seconds(WINDOW_SECS);

        let result = async {
            self.repo.prune_before(identifier, window_start).await?;
            let hits = self.repo.hits_since(identifier, window_start).await?;
            if hits >= limit as i64 {
                return Ok::<_, followup_types::error::RepositoryError>(RateDecision::Limited {
                    retry_after_secs: WINDOW_SECS as u64,
                });
            }
            self.repo.record_hit(identifier, now).await?;
            Ok(RateDecision::Allowed)
        }
        .await;

        match result {
            Ok(decision) => {
                if let RateDecision::Limited { .. } = decision {
                    tracing::warn!(identifier, limit, "rate limit exceeded");
                }
                decision
            }
            Err(e) => {
                tracing::warn!(identifier, error = %e, "rate limit check failed, allowing request");
                RateDecision::Allowed
            }
        }
    }
}

//! RateLimitRepository trait definition.

use chrono::{DateTime, Utc};
use followup_types::error::RepositoryError;

/// Repository trait for sliding-window rate-limit counters.
///
/// Identifiers are opaque strings such as `account:42` or `ip:203.0.113.9`.
/// Implementations live in followup-infra (e.g., `SqliteRateLimitRepository`).
pub trait RateLimitRepository: Send + Sync {
    /// Delete entries for an identifier whose window started before `cutoff`.
    ///
    /// Returns the number of rows removed.
    fn prune_before(
        &self,
        identifier: &str,
        cutoff: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    /// Sum the request counts recorded for an identifier since `since`.
    fn hits_since(
        &self,
        identifier: &str,
        since: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<i64, RepositoryError>> + Send;

    /// Record one request for an identifier at the given instant.
    fn record_hit(
        &self,
        identifier: &str,
        at: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete all entries older than `cutoff` regardless of identifier.
    ///
    /// Maintenance sweep so the table does not grow without bound.
    fn purge_expired(
        &self,
        cutoff: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}

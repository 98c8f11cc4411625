//! SQLite rate limit store.
//!
//! One row per request hit. The limiter prunes rows older than the window
//! before counting, and a periodic sweep removes rows for identifiers that
//! went quiet.

use chrono::{DateTime, Utc};
use followup_core::repository::RateLimitRepository;
use followup_types::error::RepositoryError;
use sqlx::Row;

use super::pool::DatabasePool;
use super::format_datetime;

/// SQLite-backed implementation of `RateLimitRepository`.
pub struct SqliteRateLimitRepository {
    pool: DatabasePool,
}

impl SqliteRateLimitRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

impl RateLimitRepository for SqliteRateLimitRepository {
    async fn prune_before(
        &self,
        identifier: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM rate_limit_entries WHERE identifier = ? AND requested_at < ?",
        )
        .bind(identifier)
        .bind(format_datetime(&cutoff))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
        Ok(result.rows_affected())
    }

    async fn hits_since(
        &self,
        identifier: &str,
        since: DateTime<Utc>,
    ) -> Result<i64, RepositoryError> {
        // Counted on the writer so hits recorded a moment ago are always seen.
        let row = sqlx::query(
            "SELECT COUNT(*) AS n FROM rate_limit_entries WHERE identifier = ? AND requested_at >= ?",
        )
        .bind(identifier)
        .bind(format_datetime(&since))
        .fetch_one(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
        row.try_get("n")
            .map_err(|e| RepositoryError::Query(e.to_string()))
    }

    async fn record_hit(
        &self,
        identifier: &str,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO rate_limit_entries (identifier, requested_at) VALUES (?, ?)")
            .bind(identifier)
            .bind(format_datetime(&at))
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        Ok(())
    }

    async fn purge_expired(&self, cutoff: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM rate_limit_entries WHERE requested_at < ?")
            .bind(format_datetime(&cutoff))
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Duration;

    async fn repo() -> (tempfile::TempDir, SqliteRateLimitRepository) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());
        let pool = DatabasePool::new(&url).await.unwrap();
        (dir, SqliteRateLimitRepository::new(pool))
    }

    #[tokio::test]
    async fn test_record_and_count_within_window() {
        let (_dir, repo) = repo().await;
        let now = Utc::now();

        repo.record_hit("account:1", now).await.unwrap();
        repo.record_hit("account:1", now).await.unwrap();
        repo.record_hit("ip:203.0.113.9", now).await.unwrap();

        let since = now - Duration::seconds(60);
        assert_eq!(repo.hits_since("account:1", since).await.unwrap(), 2);
        assert_eq!(repo.hits_since("ip:203.0.113.9", since).await.unwrap(), 1);
        assert_eq!(repo.hits_since("account:2", since).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_prune_removes_only_stale_rows_for_identifier() {
        let (_dir, repo) = repo().await;
        let now = Utc::now();
        let stale = now - Duration::seconds(120);

        repo.record_hit("account:1", stale).await.unwrap();
        repo.record_hit("account:1", now).await.unwrap();
        repo.record_hit("account:2", stale).await.unwrap();

        let cutoff = now - Duration::seconds(60);
        assert_eq!(repo.prune_before("account:1", cutoff).await.unwrap(), 1);
        assert_eq!(repo.hits_since("account:1", cutoff).await.unwrap(), 1);
        // Other identifiers keep their stale rows until their own prune.
        assert_eq!(repo.hits_since("account:2", stale).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_purge_sweeps_all_identifiers() {
        let (_dir, repo) = repo().await;
        let now = Utc::now();
        let stale = now - Duration::seconds(3600);

        repo.record_hit("account:1", stale).await.unwrap();
        repo.record_hit("account:2", stale).await.unwrap();
        repo.record_hit("account:3", now).await.unwrap();

        let purged = repo.purge_expired(now - Duration::seconds(60)).await.unwrap();
        assert_eq!(purged, 2);
        assert_eq!(
            repo.hits_since("account:3", now - Duration::seconds(60))
                .await
                .unwrap(),
            1
        );
    }
}

//! SQLite account repository implementation.
//!
//! Implements `AccountRepository` from `followup-core` using sqlx with split
//! read/write pools. One row per Follow Up Boss tenant.

use chrono::Utc;
use followup_core::repository::AccountRepository;
use followup_types::account::{Account, SubscriptionStatus};
use followup_types::error::RepositoryError;
use sqlx::Row;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime};

/// SQLite-backed implementation of `AccountRepository`.
pub struct SqliteAccountRepository {
    pool: DatabasePool,
}

impl SqliteAccountRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite rows to domain Account.
struct AccountRow {
    account_id: i64,
    fub_account_id: String,
    subscription_status: String,
    fub_access_token: Option<String>,
    fub_refresh_token: Option<String>,
    stripe_customer_id: Option<String>,
    created_at: String,
    updated_at: String,
}

impl AccountRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            account_id: row.try_get("account_id")?,
            fub_account_id: row.try_get("fub_account_id")?,
            subscription_status: row.try_get("subscription_status")?,
            fub_access_token: row.try_get("fub_access_token")?,
            fub_refresh_token: row.try_get("fub_refresh_token")?,
            stripe_customer_id: row.try_get("stripe_customer_id")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_account(self) -> Result<Account, RepositoryError> {
        let subscription_status: SubscriptionStatus = self
            .subscription_status
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        Ok(Account {
            account_id: self.account_id,
            fub_account_id: self.fub_account_id,
            subscription_status,
            fub_access_token: self.fub_access_token,
            fub_refresh_token: self.fub_refresh_token,
            stripe_customer_id: self.stripe_customer_id,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

const SELECT_COLUMNS: &str = "SELECT account_id, fub_account_id, subscription_status, \
     fub_access_token, fub_refresh_token, stripe_customer_id, created_at, updated_at \
     FROM accounts";

impl SqliteAccountRepository {
    async fn fetch_one_where(
        &self,
        predicate: &str,
        bind: &str,
        use_writer: bool,
    ) -> Result<Option<Account>, RepositoryError> {
        let sql = format!("{SELECT_COLUMNS} WHERE {predicate}");
        let query = sqlx::query(&sql).bind(bind);
        let row = if use_writer {
            query.fetch_optional(&self.pool.writer).await
        } else {
            query.fetch_optional(&self.pool.reader).await
        }
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        row.map(|r| AccountRow::from_row(&r).map_err(|e| RepositoryError::Query(e.to_string())))
            .transpose()?
            .map(AccountRow::into_account)
            .transpose()
    }
}

impl AccountRepository for SqliteAccountRepository {
    async fn upsert_by_fub_account_id(
        &self,
        fub_account_id: &str,
    ) -> Result<Account, RepositoryError> {
        let now = format_datetime(&Utc::now());
        sqlx::query(
            "INSERT INTO accounts (fub_account_id, subscription_status, created_at, updated_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(fub_account_id) DO NOTHING",
        )
        .bind(fub_account_id)
        .bind(SubscriptionStatus::default().to_string())
        .bind(&now)
        .bind(&now)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        // Read back through the writer so the row is visible even before
        // the reader pool catches up on a fresh WAL checkpoint.
        self.fetch_one_where("fub_account_id = ?", fub_account_id, true)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    async fn get(&self, account_id: i64) -> Result<Option<Account>, RepositoryError> {
        let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE account_id = ?"))
            .bind(account_id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        row.map(|r| AccountRow::from_row(&r).map_err(|e| RepositoryError::Query(e.to_string())))
            .transpose()?
            .map(AccountRow::into_account)
            .transpose()
    }

    async fn get_by_fub_account_id(
        &self,
        fub_account_id: &str,
    ) -> Result<Option<Account>, RepositoryError> {
        self.fetch_one_where("fub_account_id = ?", fub_account_id, false)
            .await
    }

    async fn get_by_stripe_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<Account>, RepositoryError> {
        self.fetch_one_where("stripe_customer_id = ?", customer_id, false)
            .await
    }

    async fn set_subscription_status(
        &self,
        account_id: i64,
        status: SubscriptionStatus,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE accounts SET subscription_status = ?, updated_at = ? WHERE account_id = ?",
        )
        .bind(status.to_string())
        .bind(format_datetime(&Utc::now()))
        .bind(account_id)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn set_stripe_customer_id(
        &self,
        account_id: i64,
        customer_id: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE accounts SET stripe_customer_id = ?, updated_at = ? WHERE account_id = ?",
        )
        .bind(customer_id)
        .bind(format_datetime(&Utc::now()))
        .bind(account_id)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn set_oauth_tokens(
        &self,
        account_id: i64,
        access_token: &str,
        refresh_token: Option<&str>,
    ) -> Result<(), RepositoryError> {
        // A refresh response without a new refresh token keeps the stored one.
        let result = match refresh_token {
            Some(refresh) => {
                sqlx::query(
                    "UPDATE accounts SET fub_access_token = ?, fub_refresh_token = ?, updated_at = ? WHERE account_id = ?",
                )
                .bind(access_token)
                .bind(refresh)
                .bind(format_datetime(&Utc::now()))
                .bind(account_id)
                .execute(&self.pool.writer)
                .await
            }
            None => {
                sqlx::query(
                    "UPDATE accounts SET fub_access_token = ?, updated_at = ? WHERE account_id = ?",
                )
                .bind(access_token)
                .bind(format_datetime(&Utc::now()))
                .bind(account_id)
                .execute(&self.pool.writer)
                .await
            }
        }
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM accounts")
            .fetch_one(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        let n: i64 = row
            .try_get("n")
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        Ok(n as u64)
    }
}

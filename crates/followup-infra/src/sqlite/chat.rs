//! SQLite chat log repository implementation.
//!
//! Stores one row per message, two per completed exchange. History queries
//! are always scoped to an account and lead so tenants never see each
//! other's conversations.

use followup_core::repository::ChatLogRepository;
use followup_types::chat::{ChatMessage, MessageRole};
use followup_types::error::RepositoryError;
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime};

/// SQLite-backed implementation of `ChatLogRepository`.
pub struct SqliteChatLogRepository {
    pool: DatabasePool,
}

impl SqliteChatLogRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite rows to domain ChatMessage.
struct MessageRow {
    id: String,
    account_id: i64,
    person_id: String,
    role: String,
    content: String,
    created_at: String,
}

impl MessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            account_id: row.try_get("account_id")?,
            person_id: row.try_get("person_id")?,
            role: row.try_get("role")?,
            content: row.try_get("content")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_message(self) -> Result<ChatMessage, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid message id: {e}")))?;
        let role: MessageRole = self
            .role
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        Ok(ChatMessage {
            id,
            account_id: self.account_id,
            person_id: self.person_id,
            role,
            content: self.content,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

impl ChatLogRepository for SqliteChatLogRepository {
    async fn append(&self, message: &ChatMessage) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO chat_messages (id, account_id, person_id, role, content, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(message.id.to_string())
        .bind(message.account_id)
        .bind(&message.person_id)
        .bind(message.role.to_string())
        .bind(&message.content)
        .bind(format_datetime(&message.created_at))
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("UNIQUE") => Err(
                RepositoryError::Conflict(format!("message '{}' already exists", message.id)),
            ),
            Err(e) => Err(RepositoryError::Query(e.to_string())),
        }
    }

    async fn list_for_person(
        &self,
        account_id: i64,
        person_id: &str,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let mut sql = String::from(
            "SELECT id, account_id, person_id, role, content, created_at
             FROM chat_messages
             WHERE account_id = ? AND person_id = ?
             ORDER BY created_at ASC, id ASC",
        );
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {limit}"));
            if let Some(offset) = offset {
                sql.push_str(&format!(" OFFSET {offset}"));
            }
        }

        let rows = sqlx::query(&sql)
            .bind(account_id)
            .bind(person_id)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows.iter()
            .map(|r| {
                MessageRow::from_row(r)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?
                    .into_message()
            })
            .collect()
    }

    async fn count_for_account(&self, account_id: i64) -> Result<u64, RepositoryError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM chat_messages WHERE account_id = ?")
            .bind(account_id)
            .fetch_one(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        let n: i64 = row
            .try_get("n")
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        Ok(n as u64)
    }

    async fn count_messages(&self) -> Result<u64, RepositoryError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM chat_messages")
            .fetch_one(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        let n: i64 = row
            .try_get("n")
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        Ok(n as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use followup_core::repository::AccountRepository;

    use crate::sqlite::account::SqliteAccountRepository;

    async fn setup() -> (tempfile::TempDir, SqliteChatLogRepository, i64) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());
        let pool = DatabasePool::new(&url).await.unwrap();
        let accounts = SqliteAccountRepository::new(pool.clone());
        let account = accounts.upsert_by_fub_account_id("fub-1").await.unwrap();
        (dir, SqliteChatLogRepository::new(pool), account.account_id)
    }

    fn message(account_id: i64, person_id: &str, role: MessageRole, content: &str) -> ChatMessage {
        ChatMessage::new(account_id, person_id, role, content)
    }

    #[tokio::test]
    async fn test_append_and_list_in_order() {
        let (_dir, repo, account_id) = setup().await;

        let question = message(account_id, "77", MessageRole::User, "what next?");
        let answer = message(account_id, "77", MessageRole::Assistant, "\u{2022} Call them");
        repo.append(&question).await.unwrap();
        repo.append(&answer).await.unwrap();

        let history = repo.list_for_person(account_id, "77", None, None).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, MessageRole::User);
        assert_eq!(history[1].role, MessageRole::Assistant);
        assert_eq!(history[1].content, "\u{2022} Call them");
    }

    #[tokio::test]
    async fn test_history_is_scoped_to_person() {
        let (_dir, repo, account_id) = setup().await;

        repo.append(&message(account_id, "77", MessageRole::User, "a"))
            .await
            .unwrap();
        repo.append(&message(account_id, "88", MessageRole::User, "b"))
            .await
            .unwrap();

        let history = repo.list_for_person(account_id, "77", None, None).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].person_id, "77");
    }

    #[tokio::test]
    async fn test_limit_and_offset() {
        let (_dir, repo, account_id) = setup().await;
        for i in 0..5 {
            repo.append(&message(account_id, "77", MessageRole::User, &format!("q{i}")))
                .await
                .unwrap();
        }

        let page = repo
            .list_for_person(account_id, "77", Some(2), Some(2))
            .await
            .unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].content, "q2");
        assert_eq!(page[1].content, "q3");
    }

    #[tokio::test]
    async fn test_duplicate_id_is_a_conflict() {
        let (_dir, repo, account_id) = setup().await;
        let msg = message(account_id, "77", MessageRole::User, "once");
        repo.append(&msg).await.unwrap();
        assert!(matches!(
            repo.append(&msg).await,
            Err(RepositoryError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_counts() {
        let (_dir, repo, account_id) = setup().await;
        repo.append(&message(account_id, "77", MessageRole::User, "a"))
            .await
            .unwrap();
        repo.append(&message(account_id, "88", MessageRole::User, "b"))
            .await
            .unwrap();

        assert_eq!(repo.count_for_account(account_id).await.unwrap(), 2);
        assert_eq!(repo.count_for_account(9999).await.unwrap(), 0);
        assert_eq!(repo.count_messages().await.unwrap(), 2);
    }
}

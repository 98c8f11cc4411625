//! ChatLogRepository trait definition.
//!
//! The chat log is append-only: rows are written once per message and
//! never updated. Follows the same RPITIT pattern as AccountRepository.

use followup_types::chat::ChatMessage;
use followup_types::error::RepositoryError;

/// Repository trait for the per-lead conversation log.
///
/// Implementations live in followup-infra (e.g., `SqliteChatLogRepository`).
pub trait ChatLogRepository: Send + Sync {
    /// Append a message to the log.
    fn append(
        &self,
        message: &ChatMessage,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Get messages for one lead within an account, ordered by created_at ASC.
    fn list_for_person(
        &self,
        account_id: i64,
        person_id: &str,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> impl std::future::Future<Output = Result<Vec<ChatMessage>, RepositoryError>> + Send;

    /// Get the total number of messages an account has logged.
    fn count_for_account(
        &self,
        account_id: i64,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    /// Count total messages across all accounts.
    fn count_messages(
        &self,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}

//! Repository trait definitions.
//!
//! These are the persistence ports implemented by `followup-infra`
//! (SQLite via sqlx). All traits use native async fn in traits (RPITIT,
//! Rust 2024 edition) and return `RepositoryError`.

pub mod account;
pub mod chat;
pub mod rate_limit;

pub use account::AccountRepository;
pub use chat::ChatLogRepository;
pub use rate_limit::RateLimitRepository;

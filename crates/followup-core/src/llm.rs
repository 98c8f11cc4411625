//! CompletionClient trait definition.
//!
//! Suggestions are single-shot: one system prompt, one user prompt, one
//! short completion. No streaming and no tool calling.

use followup_types::error::LlmError;

/// Trait for the completion provider backend (OpenAI).
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
/// Implementations live in followup-infra (e.g., `OpenAiCompletionClient`).
pub trait CompletionClient: Send + Sync {
    /// Send the prompts and return the raw completion text.
    fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> impl std::future::Future<Output = Result<String, LlmError>> + Send;
}

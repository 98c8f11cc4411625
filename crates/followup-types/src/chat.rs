//! Chat message types for the assistant conversation log.
//!
//! The log is append-only: every exchange writes a `user` row (the agent's
//! question) followed by an `assistant` row (the generated suggestion),
//! keyed by the CRM person the conversation is about.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Who authored a chat message.
///
/// Maps to the CHECK constraint in the SQLite schema:
/// `CHECK (role IN ('user', 'assistant'))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// A single row in the conversation log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub account_id: i64,
    /// The CRM person this exchange is about.
    pub person_id: String,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    /// Build a new message with a fresh UUID v7 id and the current time.
    pub fn new(account_id: i64, person_id: &str, role: MessageRole, content: &str) -> Self {
        Self {
            id: Uuid::now_v7(),
            account_id,
            person_id: person_id.to_string(),
            role,
            content: content.to_string(),
            created_at: Utc::now(),
        }
    }
}

/// Request body for POST /api/v1/chat/message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    pub person_id: String,
    pub question: String,
}

/// Request body for POST /api/v1/fub/note.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNoteRequest {
    pub person_id: String,
    pub content: String,
}

/// Request body for POST /api/v1/auth/iframe-login.
///
/// `context` is the base64 blob handed to the iframe by the CRM embed;
/// `signature` is its HMAC-SHA256 hex digest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IframeLoginRequest {
    pub context: String,
    pub signature: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_role_roundtrip() {
        for role in [MessageRole::User, MessageRole::Assistant] {
            let s = role.to_string();
            let parsed: MessageRole = s.parse().unwrap();
            assert_eq!(role, parsed);
        }
    }

    #[test]
    fn test_message_role_serde() {
        let json = serde_json::to_string(&MessageRole::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
    }

    #[test]
    fn test_new_message_ids_are_time_sortable() {
        let a = ChatMessage::new(1, "p-1", MessageRole::User, "first");
        let b = ChatMessage::new(1, "p-1", MessageRole::Assistant, "second");
        assert!(a.id < b.id);
    }
}

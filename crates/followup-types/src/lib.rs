//! Shared domain types for the FUB Follow-up Assistant.
//!
//! This crate contains the core domain types used across the platform:
//! Account, ChatMessage, lead payloads, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod account;
pub mod chat;
pub mod error;
pub mod lead;

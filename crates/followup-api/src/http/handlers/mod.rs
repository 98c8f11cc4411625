//! Request handlers grouped by resource.

pub mod auth;
pub mod billing;
pub mod chat;
pub mod crm_webhook;
pub mod note;
pub mod stats;

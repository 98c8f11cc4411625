//! Iframe embed authentication.
//!
//! Follow Up Boss loads the widget in an iframe and passes a base64 context
//! blob plus an HMAC-SHA256 signature. `hmac` verifies the signature,
//! `context` decodes the blob, and `jwt` issues the session token the
//! widget uses for every later call.

pub mod context;
pub mod hmac;
pub mod jwt;

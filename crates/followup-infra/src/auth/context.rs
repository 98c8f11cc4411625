//! Decoding of the signed embed context blob.
//!
//! Follow Up Boss passes the iframe a base64-encoded JSON document plus an
//! HMAC signature computed over the raw base64 string. The signature must
//! be checked against the raw string before decoding anything.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use followup_types::error::AuthError;

use super::hmac::verify_signature_hex;

/// The part of the embed context this service acts on.
#[derive(Debug, Clone, Deserialize)]
pub struct EmbedContext {
    pub account: EmbedAccount,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbedAccount {
    pub id: EmbedAccountId,
}

/// Account ids arrive as either JSON strings or numbers depending on the
/// embed version. Normalized to a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EmbedAccountId {
    Text(String),
    Number(i64),
}

impl EmbedAccountId {
    pub fn as_string(&self) -> String {
        match self {
            EmbedAccountId::Text(s) => s.clone(),
            EmbedAccountId::Number(n) => n.to_string(),
        }
    }
}

/// Verify the signature over the raw context string, then decode it.
///
/// Returns the tenant's Follow Up Boss account id.
pub fn verify_and_decode(
    embed_secret: &SecretString,
    raw_context: &str,
    signature_hex: &str,
) -> Result<String, AuthError> {
    verify_signature_hex(
        embed_secret.expose_secret().as_bytes(),
        raw_context.as_bytes(),
        signature_hex,
    )?;
    decode_context(raw_context)
}

/// Decode the base64 context and pull out the account id.
///
/// Some embeds strip base64 padding, so it is restored before decoding.
pub fn decode_context(raw_context: &str) -> Result<String, AuthError> {
    let padded = repad(raw_context);
    let bytes = BASE64
        .decode(padded.as_bytes())
        .map_err(|e| AuthError::MalformedContext(format!("invalid base64: {e}")))?;

    let context: EmbedContext = serde_json::from_slice(&bytes)
        .map_err(|e| AuthError::MalformedContext(format!("invalid context JSON: {e}")))?;

    let id = context.account.id.as_string();
    if id.is_empty() {
        return Err(AuthError::MalformedContext(
            "empty account id".to_string(),
        ));
    }
    Ok(id)
}

fn repad(raw: &str) -> String {
    match raw.len() % 4 {
        0 => raw.to_string(),
        rem => format!("{raw}{}", "=".repeat(4 - rem)),
    }
}

//! Stripe webhook signature verification.
//!
//! Stripe signs each delivery with a `Stripe-Signature` header of the form
//! `t=<unix>,v1=<hex>[,v1=<hex>...]`. The signed payload is `{t}.{body}`.
//! Deliveries older than the tolerance are rejected to block replays.

use secrecy::{ExposeSecret, SecretString};

use followup_types::error::BillingError;

use crate::auth::hmac::verify_signature_hex;

/// Maximum age of a delivery before it is considered a replay.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Verify a Stripe webhook delivery against the endpoint secret.
pub fn verify_webhook_signature(
    secret: &SecretString,
    payload: &[u8],
    signature_header: &str,
) -> Result<(), BillingError> {
    verify_at(
        secret,
        payload,
        signature_header,
        chrono::Utc::now().timestamp(),
    )
}

fn verify_at(
    secret: &SecretString,
    payload: &[u8],
    signature_header: &str,
    now: i64,
) -> Result<(), BillingError> {
    let header = parse_signature_header(signature_header)?;

    if (now - header.timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(BillingError::StaleTimestamp);
    }

    let mut signed_payload = header.timestamp.to_string().into_bytes();
    signed_payload.push(b'.');
    signed_payload.extend_from_slice(payload);

    let secret_bytes = secret.expose_secret().as_bytes();
    for candidate in &header.v1_signatures {
        if verify_signature_hex(secret_bytes, &signed_payload, candidate).is_ok() {
            return Ok(());
        }
    }
    Err(BillingError::SignatureInvalid)
}

struct SignatureHeader {
    timestamp: i64,
    v1_signatures: Vec<String>,
}

fn parse_signature_header(header: &str) -> Result<SignatureHeader, BillingError> {
    let mut timestamp = None;
    let mut v1_signatures = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => {
                timestamp = Some(value.parse::<i64>().map_err(|_| {
                    BillingError::MalformedPayload("invalid signature timestamp".to_string())
                })?);
            }
            "v1" => v1_signatures.push(value.to_string()),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or_else(|| {
        BillingError::MalformedPayload("signature header missing timestamp".to_string())
    })?;
    if v1_signatures.is_empty() {
        return Err(BillingError::MalformedPayload(
            "signature header missing v1 signature".to_string(),
        ));
    }

    Ok(SignatureHeader {
        timestamp,
        v1_signatures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::auth::hmac::compute_signature_hex;

    const SECRET: &str = "whsec_test";
    const PAYLOAD: &[u8] = br#"{"type":"invoice.payment_succeeded"}"#;

    fn sign(timestamp: i64, payload: &[u8], secret: &str) -> String {
        let mut signed = timestamp.to_string().into_bytes();
        signed.push(b'.');
        signed.extend_from_slice(payload);
        compute_signature_hex(secret.as_bytes(), &signed)
    }

    #[test]
    fn test_valid_signature_accepted() {
        let now = 1_700_000_000;
        let header = format!("t={now},v1={}", sign(now, PAYLOAD, SECRET));
        assert!(verify_at(&SecretString::from(SECRET), PAYLOAD, &header, now).is_ok());
    }

    #[test]
    fn test_extra_v1_candidates_are_tried() {
        let now = 1_700_000_000;
        let header = format!(
            "t={now},v1={},v1={}",
            "0".repeat(64),
            sign(now, PAYLOAD, SECRET)
        );
        assert!(verify_at(&SecretString::from(SECRET), PAYLOAD, &header, now).is_ok());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let now = 1_700_000_000;
        let header = format!("t={now},v1={}", sign(now, PAYLOAD, "whsec_other"));
        assert!(matches!(
            verify_at(&SecretString::from(SECRET), PAYLOAD, &header, now),
            Err(BillingError::SignatureInvalid)
        ));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let now = 1_700_000_000;
        let header = format!("t={now},v1={}", sign(now, PAYLOAD, SECRET));
        assert!(matches!(
            verify_at(&SecretString::from(SECRET), b"{}", &header, now),
            Err(BillingError::SignatureInvalid)
        ));
    }

    #[test]
    fn test_stale_delivery_rejected() {
        let then = 1_700_000_000;
        let header = format!("t={then},v1={}", sign(then, PAYLOAD, SECRET));
        let now = then + SIGNATURE_TOLERANCE_SECS + 1;
        assert!(matches!(
            verify_at(&SecretString::from(SECRET), PAYLOAD, &header, now),
            Err(BillingError::StaleTimestamp)
        ));
    }

    #[test]
    fn test_malformed_header_rejected() {
        let secret = SecretString::from(SECRET);
        for header in ["", "v1=abc", "t=123", "t=abc,v1=def"] {
            assert!(matches!(
                verify_at(&secret, PAYLOAD, header, 123),
                Err(BillingError::MalformedPayload(_))
            ));
        }
    }
}

//! HMAC-SHA256 signature verification for embed contexts and webhooks.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use followup_types::error::AuthError;

type HmacSha256 = Hmac<Sha256>;

/// Verify a hex-encoded HMAC-SHA256 signature over `message`.
///
/// Returns `Ok(())` only when the signature decodes and matches. The
/// comparison runs in constant time via the hmac crate's `verify_slice`.
pub fn verify_signature_hex(
    secret: &[u8],
    message: &[u8],
    signature_hex: &str,
) -> Result<(), AuthError> {
    let expected_bytes = hex_decode(signature_hex).map_err(|_| AuthError::InvalidSignature)?;

    let mut mac =
        HmacSha256::new_from_slice(secret).map_err(|_| AuthError::InvalidSignature)?;
    mac.update(message);

    mac.verify_slice(&expected_bytes)
        .map_err(|_| AuthError::InvalidSignature)
}

/// Compute the hex-encoded HMAC-SHA256 of `message`.
pub fn compute_signature_hex(secret: &[u8], message: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret).expect("HMAC accepts keys of any length");
    mac.update(message);
    hex_encode(&mac.finalize().into_bytes())
}

/// Decode a hex string to bytes.
fn hex_decode(hex: &str) -> Result<Vec<u8>, ()> {
    if hex.len() % 2 != 0 {
        return Err(());
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| ()))
        .collect()
}

/// Encode bytes to a lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 4231 test vector 1
    #[test]
    fn test_rfc4231_vector_1() {
        let key = [0x0b; 20];
        let message = b"Hi There";
        let expected = "b0344c61d8db38535ca8afceaf0bf12b881dc200c9833da726e9376c2e32cff7";

        assert_eq!(compute_signature_hex(&key, message), expected);
        assert!(verify_signature_hex(&key, message, expected).is_ok());
    }

    // RFC 4231 test vector 2
    #[test]
    fn test_rfc4231_vector_2() {
        let key = b"Jefe";
        let message = b"what do ya want for nothing?";
        let expected = "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843";

        assert!(verify_signature_hex(key, message, expected).is_ok());
    }

    #[test]
    fn test_wrong_signature_rejected() {
        let key = b"secret";
        let message = b"payload";
        let wrong = compute_signature_hex(b"other-secret", message);
        assert!(matches!(
            verify_signature_hex(key, message, &wrong),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn test_malformed_hex_rejected() {
        assert!(verify_signature_hex(b"secret", b"payload", "not-hex").is_err());
        assert!(verify_signature_hex(b"secret", b"payload", "abc").is_err());
    }

    #[test]
    fn test_round_trip() {
        let key = b"embed-secret";
        let message = br#"{"account":{"id":"fub-1"}}"#;
        let sig = compute_signature_hex(key, message);
        assert!(verify_signature_hex(key, message, &sig).is_ok());
    }
}

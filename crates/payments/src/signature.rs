//! HMAC-SHA256 signatures (hex-encoded), compared in constant time.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature is missing")]
    Missing,

    #[error("signature mismatch")]
    Mismatch,

    #[error("signing key rejected")]
    InvalidKey,
}

fn mac(secret: &str, message: &[u8]) -> Result<HmacSha256, SignatureError> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
        .map_err(|_| SignatureError::InvalidKey)?;
    mac.update(message);
    Ok(mac)
}

fn sign(secret: &str, message: &[u8]) -> Result<String, SignatureError> {
    Ok(hex::encode(mac(secret, message)?.finalize().into_bytes()))
}

fn verify(secret: &str, message: &[u8], signature: &str) -> Result<(), SignatureError> {
    let signature = signature.trim();
    if signature.is_empty() {
        return Err(SignatureError::Missing);
    }
    let provided = hex::decode(signature).map_err(|_| SignatureError::Mismatch)?;

    mac(secret, message)?
        .verify_slice(&provided)
        .map_err(|_| SignatureError::Mismatch)
}

/// Expected client callback signature: `HMAC(key_secret, "{order_id}|{payment_id}")`.
pub fn payment_signature(
    key_secret: &str,
    provider_order_id: &str,
    provider_payment_id: &str,
) -> Result<String, SignatureError> {
    sign(
        key_secret,
        format!("{provider_order_id}|{provider_payment_id}").as_bytes(),
    )
}

pub fn verify_payment_signature(
    key_secret: &str,
    provider_order_id: &str,
    provider_payment_id: &str,
    signature: &str,
) -> Result<(), SignatureError> {
    verify(
        key_secret,
        format!("{provider_order_id}|{provider_payment_id}").as_bytes(),
        signature,
    )
}

/// Expected webhook signature over the exact raw request body.
pub fn webhook_signature(webhook_secret: &str, raw_body: &[u8]) -> Result<String, SignatureError> {
    sign(webhook_secret, raw_body)
}

pub fn verify_webhook_signature(
    webhook_secret: &str,
    raw_body: &[u8],
    signature: &str,
) -> Result<(), SignatureError> {
    verify(webhook_secret, raw_body, signature)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLIENT_SIG: &str = "a982c20f48234e966ccc8d903bff75730b34341007236ad8c8a9d7c0ae5848c5";
    const WEBHOOK_SIG: &str = "4673dd707ef4c41b987cb7fefe1583142dc702388c93145b7814b9ad3d3c183e";

    #[test]
    fn payment_signature_matches_known_vector() {
        let sig = payment_signature("test_secret", "order_9A33XWu170gUtm", "pay_29QQoUBi66xm2f").unwrap();
        assert_eq!(sig, CLIENT_SIG);
        assert!(
            verify_payment_signature("test_secret", "order_9A33XWu170gUtm", "pay_29QQoUBi66xm2f", CLIENT_SIG)
                .is_ok()
        );
    }

    #[test]
    fn uppercase_hex_is_accepted() {
        let upper = CLIENT_SIG.to_uppercase();
        assert!(
            verify_payment_signature("test_secret", "order_9A33XWu170gUtm", "pay_29QQoUBi66xm2f", &upper)
                .is_ok()
        );
    }

    #[test]
    fn any_single_character_change_is_rejected() {
        // payment id tampered
        assert_eq!(
            verify_payment_signature("test_secret", "order_9A33XWu170gUtm", "pay_29QQoUBi66xm2g", CLIENT_SIG),
            Err(SignatureError::Mismatch)
        );
        // order id tampered
        assert_eq!(
            verify_payment_signature("test_secret", "order_9A33XWu170gUtn", "pay_29QQoUBi66xm2f", CLIENT_SIG),
            Err(SignatureError::Mismatch)
        );
        // secret differs
        assert_eq!(
            verify_payment_signature("test_secreT", "order_9A33XWu170gUtm", "pay_29QQoUBi66xm2f", CLIENT_SIG),
            Err(SignatureError::Mismatch)
        );
        // signature itself altered
        let mut altered = CLIENT_SIG.to_string();
        altered.replace_range(0..1, "b");
        assert_eq!(
            verify_payment_signature("test_secret", "order_9A33XWu170gUtm", "pay_29QQoUBi66xm2f", &altered),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn malformed_or_missing_signatures_are_rejected() {
        assert_eq!(
            verify_payment_signature("s", "o", "p", ""),
            Err(SignatureError::Missing)
        );
        assert_eq!(
            verify_payment_signature("s", "o", "p", "not-hex"),
            Err(SignatureError::Mismatch)
        );
        assert_eq!(
            verify_payment_signature("s", "o", "p", &CLIENT_SIG[..10]),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn webhook_signature_covers_raw_body() {
        let body = br#"{"event":"payment.captured"}"#;
        assert_eq!(webhook_signature("whsec", body).unwrap(), WEBHOOK_SIG);
        assert!(verify_webhook_signature("whsec", body, WEBHOOK_SIG).is_ok());

        // Same JSON, different bytes.
        let reformatted = br#"{"event": "payment.captured"}"#;
        assert_eq!(
            verify_webhook_signature("whsec", reformatted, WEBHOOK_SIG),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn signing_is_deterministic() {
        assert_eq!(payment_signature("k", "o", "p"), payment_signature("k", "o", "p"));
    }
}

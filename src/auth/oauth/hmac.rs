//! HMAC-SHA256 signatures for installation callbacks and webhook deliveries.
//!
//! The platform signs two kinds of requests with the app's secret:
//!
//! - installation callbacks: lowercase hex digest over the canonical
//!   parameter string (see [`CallbackParams::signable_string`])
//! - webhook deliveries: base64 digest over the exact raw request body
//!
//! Signature checks never fail open. If a MAC cannot be initialized the
//! compute functions return `None` and every verifier treats that as a
//! mismatch. Comparisons are constant time.
//!
//! # Example
//!
//! ```rust
//! use cart_guardian::auth::oauth::hmac::{compute_signature, compute_signature_base64};
//!
//! let signature = compute_signature("code=abc123&shop=demo.example", "my-secret").unwrap();
//! assert_eq!(signature.len(), 64);
//!
//! let webhook_sig = compute_signature_base64(b"{\"id\":555}", "my-secret").unwrap();
//! assert_eq!(webhook_sig.len(), 44);
//! ```

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::auth::oauth::CallbackParams;

type HmacSha256 = Hmac<Sha256>;

fn digest(message: &[u8], secret: &str) -> Option<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(message);
    Some(mac.finalize().into_bytes().to_vec())
}

/// Computes a lowercase hex HMAC-SHA256 signature of `message`.
///
/// Returns `None` if the MAC cannot be keyed.
///
/// ```rust
/// use cart_guardian::auth::oauth::hmac::compute_signature;
///
/// assert_eq!(
///     compute_signature("message", "key").unwrap(),
///     "6e9ef29b75fffc5b7abae527d58fdadb2fe42e7219011976917343065f58ed4a"
/// );
/// ```
#[must_use]
pub fn compute_signature(message: &str, secret: &str) -> Option<String> {
    digest(message.as_bytes(), secret).map(hex::encode)
}

/// Computes a standard base64 HMAC-SHA256 signature of raw bytes.
///
/// The bytes are signed as given; callers must pass the request body exactly
/// as received.
#[must_use]
pub fn compute_signature_base64(message: &[u8], secret: &str) -> Option<String> {
    digest(message, secret).map(|bytes| STANDARD.encode(bytes))
}

/// Compares two strings in constant time.
#[must_use]
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Checks a callback's `hmac` parameter against each secret in turn.
///
/// A callback with no `hmac` parameter is never valid.
#[must_use]
pub fn verify_query_signature(params: &CallbackParams, secrets: &[&str]) -> bool {
    let Some(received) = params.get(CallbackParams::SIGNATURE_PARAM) else {
        return false;
    };
    let signable = params.signable_string();

    secrets.iter().any(|secret| {
        compute_signature(&signable, secret)
            .is_some_and(|computed| constant_time_compare(&computed, received))
    })
}

/// Checks a base64 body signature against each secret in turn.
#[must_use]
pub fn verify_body_signature(raw_body: &[u8], signature: &str, secrets: &[&str]) -> bool {
    let signature = signature.trim();
    if signature.is_empty() {
        return false;
    }

    secrets.iter().any(|secret| {
        compute_signature_base64(raw_body, secret)
            .is_some_and(|computed| constant_time_compare(&computed, signature))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed_params(secret: &str) -> CallbackParams {
        let mut params = CallbackParams::from_pairs([
            ("shop", "demo.example"),
            ("code", "abc123"),
            ("timestamp", "1700000000"),
        ]);
        let signature = compute_signature(&params.signable_string(), secret).unwrap();
        params.push("hmac", signature);
        params
    }

    #[test]
    fn test_compute_signature_matches_known_value() {
        assert_eq!(
            compute_signature("message", "key").unwrap(),
            "6e9ef29b75fffc5b7abae527d58fdadb2fe42e7219011976917343065f58ed4a"
        );
    }

    #[test]
    fn test_compute_signature_is_lowercase_hex() {
        let sig = compute_signature("", "secret").unwrap();
        assert_eq!(sig.len(), 64);
        assert!(sig
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_compute_signature_base64_matches_known_value() {
        assert_eq!(
            compute_signature_base64(b"message", "key").unwrap(),
            "bp7ym3X//Ft6uuUn1Y/a2y/kLnIZARl2kXNDBl9Y7Uo="
        );
    }

    #[test]
    fn test_compute_signature_base64_accepts_non_utf8() {
        let sig = compute_signature_base64(&[0x80, 0xff, 0xfe], "secret").unwrap();
        assert_eq!(sig.len(), 44);
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("abc123", "abc123"));
        assert!(constant_time_compare("", ""));
        assert!(!constant_time_compare("abc123", "abc124"));
        assert!(!constant_time_compare("abc", "abcd"));
        assert!(!constant_time_compare("ABC", "abc"));
    }

    #[test]
    fn test_verify_query_signature_accepts_valid_callback() {
        let params = signed_params("test-secret");
        assert!(verify_query_signature(&params, &["test-secret"]));
    }

    #[test]
    fn test_verify_query_signature_rejects_changed_value() {
        let params = signed_params("test-secret");
        let tampered = CallbackParams::from_pairs(params.iter().map(|(k, v)| {
            if k == "code" {
                (k.to_string(), "abc124".to_string())
            } else {
                (k.to_string(), v.to_string())
            }
        }));
        assert!(!verify_query_signature(&tampered, &["test-secret"]));
    }

    #[test]
    fn test_verify_query_signature_rejects_missing_hmac() {
        let params = CallbackParams::from_pairs([("shop", "demo.example"), ("code", "abc123")]);
        assert!(!verify_query_signature(&params, &["test-secret"]));
    }

    #[test]
    fn test_verify_query_signature_falls_back_to_old_secret() {
        let params = signed_params("old-secret");
        assert!(verify_query_signature(&params, &["new-secret", "old-secret"]));
        assert!(!verify_query_signature(&params, &["new-secret"]));
    }

    #[test]
    fn test_verify_body_signature_is_byte_exact() {
        let body = br#"{"id":555,"email":"a@b.com"}"#;
        let signature = compute_signature_base64(body, "secret").unwrap();

        assert!(verify_body_signature(body, &signature, &["secret"]));

        // Same JSON document with keys reordered
        let reordered = br#"{"email":"a@b.com","id":555}"#;
        assert!(!verify_body_signature(reordered, &signature, &["secret"]));

        // Same document with extra whitespace
        let spaced = br#"{"id": 555, "email": "a@b.com"}"#;
        assert!(!verify_body_signature(spaced, &signature, &["secret"]));
    }

    #[test]
    fn test_verify_body_signature_rejects_blank_header() {
        assert!(!verify_body_signature(b"body", "", &["secret"]));
        assert!(!verify_body_signature(b"body", "   ", &["secret"]));
    }
}

//! HMAC-SHA256 Webhook Signatures
//!
//! Verifies the `X-Hub-Signature-256` header Meta attaches to webhook deliveries,
//! and the `hub.*` subscription handshake.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the payload signature.
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

const SIGNATURE_PREFIX: &str = "sha256=";

/// Sign a payload with HMAC-SHA256 and return the hex-encoded signature.
pub fn sign_payload(secret: &str, payload: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Verify an `X-Hub-Signature-256` header value (`sha256=<hex>`) against a payload.
pub fn verify_signature(secret: &str, payload: &[u8], header: &str) -> bool {
    let Some(signature) = header.trim().strip_prefix(SIGNATURE_PREFIX) else {
        return false;
    };
    let expected = sign_payload(secret, payload);
    let signature = signature.to_ascii_lowercase();
    // Constant-time comparison
    expected.len() == signature.len()
        && expected
            .as_bytes()
            .iter()
            .zip(signature.as_bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

/// Query parameters of the subscription handshake.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct VerifyQuery {
    /// Should be "subscribe"
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    /// Token configured in the WhatsApp dashboard
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    /// Challenge string to echo back
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

impl VerifyQuery {
    /// Return the challenge to echo when the handshake is valid.
    pub fn accept(&self, expected_token: &str) -> Option<&str> {
        if self.mode.as_deref() != Some("subscribe") {
            return None;
        }
        if self.verify_token.as_deref() != Some(expected_token) {
            return None;
        }
        self.challenge.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_and_verify() {
        let secret = "app_secret_12345";
        let payload = br#"{"entry":[]}"#;
        let header = format!("sha256={}", sign_payload(secret, payload));
        assert!(verify_signature(secret, payload, &header));
        assert!(verify_signature(secret, payload, &header.to_uppercase().replace("SHA256=", "sha256=")));
        assert!(!verify_signature("wrong_secret", payload, &header));
        assert!(!verify_signature(secret, b"tampered", &header));
    }

    #[test]
    fn signature_without_prefix_is_rejected() {
        let secret = "app_secret_12345";
        let payload = b"hello";
        assert!(!verify_signature(secret, payload, &sign_payload(secret, payload)));
        assert!(!verify_signature(secret, payload, "sha256="));
    }

    #[test]
    fn handshake_echoes_challenge_for_matching_token() {
        let query: VerifyQuery = serde_json::from_str(
            r#"{"hub.mode":"subscribe","hub.verify_token":"tok","hub.challenge":"1158201444"}"#,
        )
        .unwrap();
        assert_eq!(query.accept("tok"), Some("1158201444"));
        assert_eq!(query.accept("other"), None);

        let wrong_mode: VerifyQuery = serde_json::from_str(
            r#"{"hub.mode":"unsubscribe","hub.verify_token":"tok","hub.challenge":"1"}"#,
        )
        .unwrap();
        assert_eq!(wrong_mode.accept("tok"), None);
    }
}

//! `intuit-signature` verification.

use backoffice_core::WebhookSignatureVerifier;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 of the raw body keyed with the app's webhook verifier token.
pub struct HmacWebhookVerifier {
    verifier_token: String,
}

impl HmacWebhookVerifier {
    pub fn new(verifier_token: impl Into<String>) -> Self {
        Self { verifier_token: verifier_token.into() }
    }

    fn mac(&self, body: &[u8]) -> Option<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(self.verifier_token.as_bytes()).ok()?;
        mac.update(body);
        Some(mac)
    }

    /// Base64 signature for `body`, as QuickBooks would send it.
    pub fn sign(&self, body: &[u8]) -> Option<String> {
        self.mac(body).map(|mac| STANDARD.encode(mac.finalize().into_bytes()))
    }
}

impl WebhookSignatureVerifier for HmacWebhookVerifier {
    fn verify(&self, body: &[u8], signature: &str) -> bool {
        let Ok(expected) = STANDARD.decode(signature.trim()) else {
            debug!("webhook signature is not valid base64");
            return false;
        };
        match self.mac(body) {
            Some(mac) => mac.verify_slice(&expected).is_ok(),
            None => false,
        }
    }
}

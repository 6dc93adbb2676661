//! Port interfaces for inbound webhooks

/// Checks the `intuit-signature` header against the raw request body.
pub trait WebhookSignatureVerifier: Send + Sync {
    /// `signature` is the header value as received (base64).
    fn verify(&self, body: &[u8], signature: &str) -> bool;
}

//! Inbound QuickBooks webhooks.

pub mod ports;
pub mod receiver;

pub use ports::WebhookSignatureVerifier;
pub use receiver::{WebhookOutcome, WebhookReceiver};

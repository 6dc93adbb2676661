//! QuickBooks Online adapters: REST transport, OAuth token endpoint and
//! webhook signature verification.

pub mod client;
pub mod oauth;
pub mod webhook;

pub use client::QuickBooksClient;
pub use oauth::IntuitTokenEndpoint;
pub use webhook::HmacWebhookVerifier;

//! External service integrations

pub mod quickbooks;

pub use quickbooks::{HmacWebhookVerifier, IntuitTokenEndpoint, QuickBooksClient};

//! Application constants
//!
//! QuickBooks endpoints, limits and local formatting rules.

// QuickBooks Online endpoints
pub const QBO_API_BASE_PRODUCTION: &str = "https://quickbooks.api.intuit.com";
pub const QBO_API_BASE_SANDBOX: &str = "https://sandbox-quickbooks.api.intuit.com";
pub const QBO_TOKEN_URL: &str = "https://oauth.platform.intuit.com/oauth2/v1/tokens/bearer";
pub const QBO_AUTHORIZE_URL: &str = "https://appcenter.intuit.com/connect/oauth2";
pub const QBO_ACCOUNTING_SCOPE: &str = "com.intuit.quickbooks.accounting";
pub const QBO_DEFAULT_MINOR_VERSION: u32 = 75;

// Query limits
pub const QBO_QUERY_LIMIT: u32 = 1000;
pub const DEFAULT_ESTIMATE_PAGE_SIZE: u32 = 100;

// Webhook
/// Header carrying the base64 HMAC-SHA256 of a webhook body.
pub const WEBHOOK_SIGNATURE_HEADER: &str = "intuit-signature";

// Token refresh
pub const DEFAULT_REFRESH_MARGIN_SECS: i64 = 300;
/// Upper bound for any token lifetime or refresh margin (ten years).
pub const MAX_TOKEN_LIFETIME_SECS: i64 = 10 * 365 * 24 * 60 * 60;

// Outbound HTTP
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_HTTP_MAX_ATTEMPTS: usize = 3;

// Sync
pub const SYNC_SUMMARY_RECORD_LIMIT: usize = 50;
pub const PLACEHOLDER_DOCUMENT_PREFIX: &str = "QB-";

// Local order numbers
pub const ORDER_NUMBER_WIDTH: usize = 6;
pub const ORDER_NUMBER_MAX_ATTEMPTS: usize = 5;

// Sync log reads
pub const SYNC_LOG_DEFAULT_LIMIT: u32 = 50;
pub const SYNC_LOG_MAX_LIMIT: u32 = 500;

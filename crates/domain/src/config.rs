//! Configuration structures

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_REFRESH_MARGIN_SECS, QBO_API_BASE_PRODUCTION,
    QBO_API_BASE_SANDBOX, QBO_DEFAULT_MINOR_VERSION, QBO_TOKEN_URL,
};

/// Top-level application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub quickbooks: QuickBooksConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

/// Which Intuit API host the connection talks to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuickBooksEnvironment {
    #[default]
    Sandbox,
    Production,
}

impl std::str::FromStr for QuickBooksEnvironment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sandbox" | "development" => Ok(Self::Sandbox),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!("Invalid QuickBooks environment: {other}")),
        }
    }
}

/// QuickBooks Online app credentials and client tuning.
#[derive(Clone, Serialize, Deserialize)]
pub struct QuickBooksConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    #[serde(default)]
    pub environment: QuickBooksEnvironment,
    /// Verifier token shared with Intuit for webhook signatures.
    #[serde(default)]
    pub webhook_verifier_token: Option<String>,
    #[serde(default = "default_minor_version")]
    pub minor_version: u32,
    /// Overrides the environment's API host (tests, proxies).
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub token_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_refresh_margin_secs")]
    pub refresh_margin_secs: i64,
}

impl QuickBooksConfig {
    pub fn api_base(&self) -> &str {
        match (&self.api_base_url, self.environment) {
            (Some(url), _) => url.trim_end_matches('/'),
            (None, QuickBooksEnvironment::Sandbox) => QBO_API_BASE_SANDBOX,
            (None, QuickBooksEnvironment::Production) => QBO_API_BASE_PRODUCTION,
        }
    }

    pub fn token_endpoint(&self) -> &str {
        self.token_url.as_deref().unwrap_or(QBO_TOKEN_URL)
    }
}

impl fmt::Debug for QuickBooksConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuickBooksConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .field("environment", &self.environment)
            .field(
                "webhook_verifier_token",
                &self.webhook_verifier_token.as_ref().map(|_| "<redacted>"),
            )
            .field("minor_version", &self.minor_version)
            .field("api_base_url", &self.api_base_url)
            .field("token_url", &self.token_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("refresh_margin_secs", &self.refresh_margin_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_addr: default_bind_addr(), cors_origins: Vec::new() }
    }
}

fn default_pool_size() -> u32 {
    8
}

fn default_minor_version() -> u32 {
    QBO_DEFAULT_MINOR_VERSION
}

fn default_timeout_secs() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}

fn default_refresh_margin_secs() -> i64 {
    DEFAULT_REFRESH_MARGIN_SECS
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

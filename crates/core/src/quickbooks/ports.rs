//! Port interfaces for the QuickBooks Online boundary

use async_trait::async_trait;
use backoffice_domain::{QuickBooksConnection, Result, TokenGrant};
use serde_json::Value;

/// Credential handed to the API client for one request.
#[derive(Clone, PartialEq, Eq)]
pub struct ActiveCredential {
    pub realm_id: String,
    pub access_token: String,
}

impl std::fmt::Debug for ActiveCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveCredential")
            .field("realm_id", &self.realm_id)
            .finish_non_exhaustive()
    }
}

/// Persistence of the connected company credential.
#[async_trait]
pub trait ConnectionRepository: Send + Sync {
    /// The connection currently in use, if any.
    async fn find_active(&self) -> Result<Option<QuickBooksConnection>>;

    async fn find_by_realm(&self, realm_id: &str) -> Result<Option<QuickBooksConnection>>;

    /// Insert or replace the row for `connection.realm_id`. When the saved
    /// connection is active every other realm is deactivated.
    async fn save(&self, connection: &QuickBooksConnection) -> Result<()>;

    /// Soft "not configured": keep the row, clear tokens, mark inactive.
    async fn deactivate(&self, realm_id: &str) -> Result<()>;
}

/// The provider's OAuth2 token endpoint.
///
/// A rejected grant (HTTP 400/401 from the provider) surfaces as
/// `BackofficeError::Auth`.
#[async_trait]
pub trait OAuthTokenEndpoint: Send + Sync {
    async fn exchange_code(&self, code: &str, code_verifier: Option<&str>) -> Result<TokenGrant>;

    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant>;
}

/// Source of bearer tokens for the API client.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// A token valid for at least the configured safety margin.
    async fn access_token(&self) -> Result<ActiveCredential>;

    /// Called after the provider answered 401 for `rejected`. Refreshes
    /// unless another caller already replaced that token.
    async fn force_refresh(&self, rejected: &str) -> Result<ActiveCredential>;
}

/// Authenticated company-scoped REST calls.
///
/// Paths are relative to `/v3/company/<realm>/`, e.g. `estimate/177`. The
/// transport adds `minorversion`, bearer auth and fault classification.
#[async_trait]
pub trait QuickBooksTransport: Send + Sync {
    async fn get(&self, path: &str, params: &[(&str, &str)]) -> Result<Value>;

    async fn post(&self, path: &str, params: &[(&str, &str)], body: &Value) -> Result<Value>;

    /// Run a rendered query-language statement.
    async fn query(&self, statement: &str) -> Result<Value>;

    /// `GET` with `Accept: application/pdf`, returning raw bytes.
    async fn get_pdf(&self, path: &str) -> Result<Vec<u8>>;
}

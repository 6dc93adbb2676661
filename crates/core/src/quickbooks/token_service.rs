//! Token store access and refresh.

use std::sync::Arc;

use async_trait::async_trait;
use backoffice_common::time::Clock;
use backoffice_domain::constants::MAX_TOKEN_LIFETIME_SECS;
use backoffice_domain::{
    BackofficeError, ConnectionStatus, QuickBooksConnection, Result, TokenGrant,
};
use chrono::Duration;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use super::ports::{AccessTokenProvider, ActiveCredential, ConnectionRepository, OAuthTokenEndpoint};

/// Hands out valid access tokens for the active connection and refreshes
/// them through the provider when they are about to expire.
///
/// Refreshes are single-flight: concurrent callers queue on one async lock
/// and re-read the stored connection once they hold it, so only the first
/// caller talks to the token endpoint.
pub struct TokenService {
    connections: Arc<dyn ConnectionRepository>,
    endpoint: Arc<dyn OAuthTokenEndpoint>,
    clock: Arc<dyn Clock>,
    margin: Duration,
    refresh_lock: Mutex<()>,
}

impl TokenService {
    pub fn new(
        connections: Arc<dyn ConnectionRepository>,
        endpoint: Arc<dyn OAuthTokenEndpoint>,
        clock: Arc<dyn Clock>,
        margin_secs: i64,
    ) -> Self {
        Self {
            connections,
            endpoint,
            clock,
            margin: Duration::seconds(margin_secs.clamp(0, MAX_TOKEN_LIFETIME_SECS)),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Current access token if `now < expires_at - margin`, otherwise a
    /// freshly refreshed one.
    #[instrument(skip(self))]
    pub async fn get_valid_access_token(&self) -> Result<ActiveCredential> {
        let connection = self.active_connection().await?;
        if connection.access_token_usable(self.clock.now(), self.margin) {
            return Ok(credential(&connection));
        }

        let _guard = self.refresh_lock.lock().await;
        let connection = self.active_connection().await?;
        if connection.access_token_usable(self.clock.now(), self.margin) {
            return Ok(credential(&connection));
        }
        self.refresh_locked(connection).await
    }

    /// Refresh after the provider rejected `rejected`, unless the stored
    /// token has already moved on.
    #[instrument(skip(self, rejected))]
    pub async fn refresh_after_rejection(&self, rejected: &str) -> Result<ActiveCredential> {
        let _guard = self.refresh_lock.lock().await;
        let connection = self.active_connection().await?;
        if connection.access_token != rejected
            && connection.access_token_usable(self.clock.now(), self.margin)
        {
            return Ok(credential(&connection));
        }
        self.refresh_locked(connection).await
    }

    pub async fn status(&self) -> Result<ConnectionStatus> {
        Ok(match self.connections.find_active().await? {
            Some(connection) => connection.status(self.clock.now(), self.margin),
            None => ConnectionStatus::not_configured(),
        })
    }

    /// Store a token pair (operator supplied, or from the OAuth callback) and
    /// make its realm active. Holds the refresh lock, so a refresh already in
    /// flight cannot overwrite the new pair.
    #[instrument(skip(self, grant), fields(realm_id = %realm_id))]
    pub async fn store_grant(
        &self,
        realm_id: &str,
        grant: &TokenGrant,
    ) -> Result<ConnectionStatus> {
        validate_grant(realm_id, grant)?;

        let now = self.clock.now();
        let _guard = self.refresh_lock.lock().await;
        let connection = match self.connections.find_by_realm(realm_id).await? {
            Some(mut existing) => {
                existing.apply_grant(grant, now)?;
                existing
            }
            None => QuickBooksConnection::from_grant(realm_id, grant, now)?,
        };
        self.connections.save(&connection).await?;
        info!(expires_at = %connection.expires_at, "Stored QuickBooks token pair");

        Ok(connection.status(now, self.margin))
    }

    /// Soft disconnect of the active realm. No-op when nothing is connected.
    #[instrument(skip(self))]
    pub async fn disconnect(&self) -> Result<ConnectionStatus> {
        let _guard = self.refresh_lock.lock().await;
        if let Some(connection) = self.connections.find_active().await? {
            self.connections.deactivate(&connection.realm_id).await?;
            info!(realm_id = %connection.realm_id, "QuickBooks connection deactivated");
        }
        Ok(ConnectionStatus::not_configured())
    }

    async fn active_connection(&self) -> Result<QuickBooksConnection> {
        self.connections.find_active().await?.ok_or_else(|| {
            BackofficeError::Auth("QuickBooks is not connected; authorize the app first".into())
        })
    }

    async fn refresh_locked(
        &self,
        mut connection: QuickBooksConnection,
    ) -> Result<ActiveCredential> {
        let now = self.clock.now();
        if connection.refresh_token_expired(now) {
            warn!(
                realm_id = %connection.realm_id,
                refresh_token_expires_at = %connection.refresh_token_expires_at,
                "Refresh token expired; re-authorization required"
            );
            return Err(BackofficeError::Auth(
                "QuickBooks refresh token expired; re-authorize the connection".into(),
            ));
        }

        let grant = self.endpoint.refresh(&connection.refresh_token).await.map_err(|err| {
            warn!(realm_id = %connection.realm_id, error = %err, "Token refresh failed");
            match err {
                BackofficeError::Auth(_) | BackofficeError::Network(_) => err,
                other => BackofficeError::Auth(format!("token refresh failed: {other}")),
            }
        })?;

        connection.apply_grant(&grant, self.clock.now())?;
        self.connections.save(&connection).await?;
        info!(
            realm_id = %connection.realm_id,
            expires_at = %connection.expires_at,
            "QuickBooks access token refreshed"
        );

        Ok(credential(&connection))
    }
}

#[async_trait]
impl AccessTokenProvider for TokenService {
    async fn access_token(&self) -> Result<ActiveCredential> {
        self.get_valid_access_token().await
    }

    async fn force_refresh(&self, rejected: &str) -> Result<ActiveCredential> {
        self.refresh_after_rejection(rejected).await
    }
}

fn credential(connection: &QuickBooksConnection) -> ActiveCredential {
    ActiveCredential {
        realm_id: connection.realm_id.clone(),
        access_token: connection.access_token.clone(),
    }
}

fn validate_grant(realm_id: &str, grant: &TokenGrant) -> Result<()> {
    if realm_id.trim().is_empty() {
        return Err(BackofficeError::Validation("realmId is required".into()));
    }
    if grant.access_token.trim().is_empty() || grant.refresh_token.trim().is_empty() {
        return Err(BackofficeError::Validation("accessToken and refreshToken are required".into()));
    }
    let lifetimes = 1..=MAX_TOKEN_LIFETIME_SECS;
    let in_range = |secs: &i64| lifetimes.contains(secs);
    if !in_range(&grant.expires_in) || !in_range(&grant.refresh_token_expires_in) {
        return Err(BackofficeError::Validation(format!(
            "token lifetimes must be between 1 and {MAX_TOKEN_LIFETIME_SECS} seconds"
        )));
    }
    Ok(())
}

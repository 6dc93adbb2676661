//! Application context - dependency injection container

use std::sync::Arc;

use backoffice_common::time::{Clock, SystemClock};
use backoffice_core::{
    AccessTokenProvider, ConnectionRepository, EstimateService, OAuthOnboarding,
    OAuthTokenEndpoint, OnboardingSettings, QuickBooksGateway, RecordService, SyncJournal,
    SyncManager, TokenService, WebhookReceiver, WebhookSignatureVerifier,
};
use backoffice_domain::{Config, Result};
use backoffice_infra::database::{
    local_store, DbManager, SqliteConnectionRepository, SqliteSyncLogRepository,
};
use backoffice_infra::{HmacWebhookVerifier, IntuitTokenEndpoint, QuickBooksClient};
use tracing::{info, warn};

use crate::utils::health::{ComponentHealth, HealthStatus};

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: Config,
    pub db: Arc<DbManager>,
    pub records: Arc<RecordService>,
    pub tokens: Arc<TokenService>,
    pub onboarding: Arc<OAuthOnboarding>,
    pub sync: Arc<SyncManager>,
    pub journal: SyncJournal,
    pub estimates: Arc<EstimateService>,
    pub webhooks: Arc<WebhookReceiver>,
}

impl AppContext {
    /// Open the database and wire every adapter with the system clock.
    pub fn new(config: Config) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Same as [`AppContext::new`] with an injected clock, for tests that
    /// need to move token expiry around.
    pub fn with_clock(config: Config, clock: Arc<dyn Clock>) -> Result<Self> {
        let db = DbManager::open(&config.database.path, config.database.pool_size)?;
        let store = local_store(&db);
        let journal = SyncJournal::new(Arc::new(SqliteSyncLogRepository::new(Arc::clone(&db))));

        let qbo = &config.quickbooks;
        let connections: Arc<dyn ConnectionRepository> =
            Arc::new(SqliteConnectionRepository::new(Arc::clone(&db)));
        let endpoint: Arc<dyn OAuthTokenEndpoint> =
            Arc::new(IntuitTokenEndpoint::from_config(qbo)?);

        let tokens = Arc::new(TokenService::new(
            connections,
            Arc::clone(&endpoint),
            Arc::clone(&clock),
            qbo.refresh_margin_secs,
        ));

        let settings = OnboardingSettings::new(qbo.client_id.clone(), qbo.redirect_uri.clone());
        let onboarding = Arc::new(OAuthOnboarding::new(
            settings,
            Arc::clone(&tokens),
            endpoint,
            journal.clone(),
            Arc::clone(&clock),
        ));

        let token_provider: Arc<dyn AccessTokenProvider> = tokens.clone();
        let client = QuickBooksClient::from_config(qbo, token_provider)?;
        let gateway = Arc::new(QuickBooksGateway::new(Arc::new(client)));

        let sync = Arc::new(SyncManager::new(
            Arc::clone(&gateway),
            &store,
            journal.clone(),
            Arc::clone(&clock),
        ));
        let estimates = Arc::new(EstimateService::new(
            gateway,
            store.clone(),
            journal.clone(),
            Arc::clone(&clock),
        ));

        let verifier = match qbo.webhook_verifier_token.as_deref() {
            Some(token) => {
                Some(Arc::new(HmacWebhookVerifier::new(token)) as Arc<dyn WebhookSignatureVerifier>)
            }
            None => {
                warn!("webhook verifier token not configured; webhook deliveries will be rejected");
                None
            }
        };
        let webhooks = Arc::new(WebhookReceiver::new(verifier, Arc::clone(&sync)));

        info!(
            database = %db.path().display(),
            environment = ?qbo.environment,
            api_base = qbo.api_base(),
            "application context ready"
        );

        Ok(Self {
            records: Arc::new(RecordService::new(store)),
            config,
            db,
            tokens,
            onboarding,
            sync,
            journal,
            estimates,
            webhooks,
        })
    }

    /// Database reachability plus QuickBooks connection state.
    ///
    /// A missing QuickBooks connection is reported but does not make the
    /// service unhealthy; the local records keep working without it.
    pub async fn health_check(&self) -> HealthStatus {
        let mut status = HealthStatus::new()
            .add_component(self.check_database_health().await)
            .add_component(self.check_quickbooks_health().await);
        status.calculate_score();
        status
    }

    /// Uses spawn_blocking to keep the pool checkout off the async runtime.
    async fn check_database_health(&self) -> ComponentHealth {
        let db = Arc::clone(&self.db);
        match tokio::task::spawn_blocking(move || db.health_check()).await {
            Ok(Ok(_)) => ComponentHealth::healthy("database"),
            Ok(Err(e)) => {
                warn!(error = %e, "database health check failed");
                ComponentHealth::unhealthy("database", format!("query failed: {e}"))
            }
            Err(e) => {
                tracing::error!(error = %e, "database health check task panicked");
                ComponentHealth::unhealthy("database", format!("task panic: {e}"))
            }
        }
    }

    async fn check_quickbooks_health(&self) -> ComponentHealth {
        match self.tokens.status().await {
            Ok(status) if status.connected => ComponentHealth::healthy("quickbooks"),
            Ok(_) => ComponentHealth::healthy("quickbooks").with_message("not connected"),
            Err(e) => ComponentHealth::unhealthy("quickbooks", e.to_string()),
        }
    }
}

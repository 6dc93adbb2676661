//! OAuth2 authorization-code onboarding of a QuickBooks company.

use std::sync::Arc;

use backoffice_common::auth::pkce::PkceChallenge;
use backoffice_common::time::Clock;
use backoffice_domain::constants::{QBO_ACCOUNTING_SCOPE, QBO_AUTHORIZE_URL};
use backoffice_domain::{BackofficeError, ConnectionStatus, Result, SyncAction, SyncLogEntry};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tracing::{info, instrument, warn};
use url::Url;

use super::ports::OAuthTokenEndpoint;
use super::token_service::TokenService;
use crate::sync::SyncJournal;

/// Pending authorization requests expire after this long.
const STATE_TTL_MINUTES: i64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationRequest {
    pub authorization_url: String,
    pub state: String,
}

#[derive(Debug, Clone)]
pub struct OnboardingSettings {
    pub client_id: String,
    pub redirect_uri: String,
    pub authorize_url: String,
}

impl OnboardingSettings {
    pub fn new(client_id: impl Into<String>, redirect_uri: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            redirect_uri: redirect_uri.into(),
            authorize_url: QBO_AUTHORIZE_URL.to_string(),
        }
    }
}

struct PendingAuthorization {
    code_verifier: String,
    created_at: DateTime<Utc>,
}

/// Builds authorize URLs and completes the callback.
///
/// PKCE verifiers live in process memory keyed by `state`; each state is
/// single-use.
pub struct OAuthOnboarding {
    settings: OnboardingSettings,
    tokens: Arc<TokenService>,
    endpoint: Arc<dyn OAuthTokenEndpoint>,
    journal: SyncJournal,
    clock: Arc<dyn Clock>,
    pending: DashMap<String, PendingAuthorization>,
}

impl OAuthOnboarding {
    pub fn new(
        settings: OnboardingSettings,
        tokens: Arc<TokenService>,
        endpoint: Arc<dyn OAuthTokenEndpoint>,
        journal: SyncJournal,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { settings, tokens, endpoint, journal, clock, pending: DashMap::new() }
    }

    pub fn authorization_url(&self) -> Result<AuthorizationRequest> {
        let now = self.clock.now();
        self.pending
            .retain(|_, pending| now - pending.created_at < Duration::minutes(STATE_TTL_MINUTES));

        let challenge = PkceChallenge::generate();
        let url = Url::parse_with_params(
            &self.settings.authorize_url,
            &[
                ("client_id", self.settings.client_id.as_str()),
                ("response_type", "code"),
                ("scope", QBO_ACCOUNTING_SCOPE),
                ("redirect_uri", self.settings.redirect_uri.as_str()),
                ("state", challenge.state.as_str()),
                ("code_challenge", challenge.code_challenge.as_str()),
                ("code_challenge_method", challenge.challenge_method()),
            ],
        )
        .map_err(|e| BackofficeError::Config(format!("invalid authorize URL: {e}")))?;

        self.pending.insert(
            challenge.state.clone(),
            PendingAuthorization { code_verifier: challenge.code_verifier, created_at: now },
        );

        Ok(AuthorizationRequest { authorization_url: url.into(), state: challenge.state })
    }

    /// Exchange the callback `code` and make `realm_id` the active connection.
    #[instrument(skip(self, code, state), fields(realm_id = %realm_id))]
    pub async fn complete_authorization(
        &self,
        code: &str,
        realm_id: &str,
        state: &str,
    ) -> Result<ConnectionStatus> {
        if code.trim().is_empty() || realm_id.trim().is_empty() {
            return Err(BackofficeError::Validation("code and realmId are required".into()));
        }

        let now = self.clock.now();
        let pending = self
            .pending
            .remove(state)
            .map(|(_, pending)| pending)
            .filter(|pending| now - pending.created_at < Duration::minutes(STATE_TTL_MINUTES))
            .ok_or_else(|| {
                warn!("OAuth callback with unknown or expired state");
                BackofficeError::Validation("unknown or expired OAuth state".into())
            })?;

        let grant = match self.endpoint.exchange_code(code, Some(&pending.code_verifier)).await {
            Ok(grant) => grant,
            Err(err) => {
                self.journal
                    .record(
                        SyncLogEntry::error("connection", SyncAction::Create, err.to_string(), now)
                            .with_quickbooks_id(realm_id),
                    )
                    .await;
                return Err(err);
            }
        };

        let status = self.tokens.store_grant(realm_id, &grant).await?;
        self.journal
            .record(
                SyncLogEntry::success("connection", SyncAction::Create, self.clock.now())
                    .with_quickbooks_id(realm_id),
            )
            .await;
        info!(expires_at = ?status.expires_at, "QuickBooks company connected");

        Ok(status)
    }
}

//! QuickBooks change notifications.

use std::sync::Arc;

use backoffice_domain::{BackofficeError, Result, SyncEntity, WebhookPayload};
use serde::Serialize;
use tracing::{info, instrument, warn};

use super::ports::WebhookSignatureVerifier;
use crate::sync::SyncManager;

/// Entity collections resynced for one delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookOutcome {
    pub processed: Vec<SyncEntity>,
}

/// Verifies a delivery and resyncs every affected collection once.
///
/// A change resyncs the whole page of that entity type rather than the one
/// record. Notifications are handled sequentially; the first sync failure
/// aborts the delivery so QuickBooks retries it.
pub struct WebhookReceiver {
    verifier: Option<Arc<dyn WebhookSignatureVerifier>>,
    sync: Arc<SyncManager>,
}

impl WebhookReceiver {
    /// Without a verifier every delivery is rejected.
    pub fn new(
        verifier: Option<Arc<dyn WebhookSignatureVerifier>>,
        sync: Arc<SyncManager>,
    ) -> Self {
        Self { verifier, sync }
    }

    #[instrument(skip(self, body, signature), fields(body_len = body.len()))]
    pub async fn handle(&self, body: &[u8], signature: Option<&str>) -> Result<WebhookOutcome> {
        self.authenticate(body, signature)?;

        let payload: WebhookPayload = serde_json::from_slice(body)
            .map_err(|e| BackofficeError::Validation(format!("malformed webhook payload: {e}")))?;
        let entities = payload.affected_entities();
        info!(
            notifications = payload.event_notifications.len(),
            entity_types = ?entities,
            "Webhook accepted"
        );

        for entity in &entities {
            self.sync.sync_entity(*entity, None).await.map_err(|err| {
                BackofficeError::Internal(format!("webhook sync of {entity} failed: {err}"))
            })?;
        }

        Ok(WebhookOutcome { processed: entities })
    }

    fn authenticate(&self, body: &[u8], signature: Option<&str>) -> Result<()> {
        let Some(verifier) = &self.verifier else {
            warn!("Webhook rejected: verifier token not configured");
            return Err(BackofficeError::Auth("webhook verifier token not configured".into()));
        };
        let Some(signature) = signature.map(str::trim).filter(|s| !s.is_empty()) else {
            warn!("Webhook rejected: missing signature");
            return Err(BackofficeError::Auth("missing webhook signature".into()));
        };
        if !verifier.verify(body, signature) {
            warn!("Webhook rejected: signature mismatch");
            return Err(BackofficeError::Auth("invalid webhook signature".into()));
        }
        Ok(())
    }
}

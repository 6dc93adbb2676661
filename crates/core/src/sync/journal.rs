//! Sync log writer shared by every integration service.

use std::sync::Arc;

use backoffice_domain::{Result, SyncLogEntry, SyncLogFilter};
use tracing::{error, warn};

use super::ports::SyncLogRepository;

/// Thin handle over the sync log store.
///
/// Writing an audit row never changes the outcome of the operation being
/// audited: a failed append is reported through tracing and dropped.
#[derive(Clone)]
pub struct SyncJournal {
    repository: Arc<dyn SyncLogRepository>,
}

impl SyncJournal {
    pub fn new(repository: Arc<dyn SyncLogRepository>) -> Self {
        Self { repository }
    }

    pub async fn record(&self, entry: SyncLogEntry) {
        if let Some(message) = &entry.error_message {
            warn!(
                entity_type = %entry.entity_type,
                action = %entry.action,
                entity_id = ?entry.entity_id,
                quickbooks_id = ?entry.quickbooks_id,
                error = %message,
                "Sync operation failed"
            );
        }
        if let Err(err) = self.repository.append(&entry).await {
            error!(
                entity_type = %entry.entity_type,
                action = %entry.action,
                error = %err,
                "Failed to append sync log entry"
            );
        }
    }

    pub async fn list(&self, filter: &SyncLogFilter) -> Result<Vec<SyncLogEntry>> {
        self.repository.list(filter).await
    }
}

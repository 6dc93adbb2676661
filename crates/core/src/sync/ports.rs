//! Port interfaces for the sync log

use async_trait::async_trait;
use backoffice_domain::{Result, SyncLogEntry, SyncLogFilter};

/// Append-only audit trail. No update or delete.
#[async_trait]
pub trait SyncLogRepository: Send + Sync {
    async fn append(&self, entry: &SyncLogEntry) -> Result<()>;

    /// Newest first, at most `filter.effective_limit()` rows.
    async fn list(&self, filter: &SyncLogFilter) -> Result<Vec<SyncLogEntry>>;
}

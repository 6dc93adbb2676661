//! Sync bookkeeping: external references, sync log rows, batch summaries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::constants::{SYNC_LOG_DEFAULT_LIMIT, SYNC_LOG_MAX_LIMIT};
use crate::impl_domain_status_conversions;

/// Sync state of a local record that has a QuickBooks counterpart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    #[default]
    Pending,
    Synced,
    Error,
}

impl_domain_status_conversions!(SyncStatus {
    Pending => "pending",
    Synced => "synced",
    Error => "error",
});

/// External entity reference carried by every synchronisable local record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalRef {
    pub quickbooks_id: Option<String>,
    pub sync_status: SyncStatus,
    pub synced_at: Option<DateTime<Utc>>,
}

impl ExternalRef {
    pub fn synced(quickbooks_id: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            quickbooks_id: Some(quickbooks_id.into()),
            sync_status: SyncStatus::Synced,
            synced_at: Some(at),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncAction {
    Create,
    Update,
    Delete,
    Sync,
}

impl_domain_status_conversions!(SyncAction {
    Create => "create",
    Update => "update",
    Delete => "delete",
    Sync => "sync",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncLogStatus {
    Pending,
    Success,
    Error,
}

impl_domain_status_conversions!(SyncLogStatus {
    Pending => "pending",
    Success => "success",
    Error => "error",
});

/// Local entity collections reconciled against QuickBooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncEntity {
    Clientes,
    Produtos,
    Pedidos,
}

impl_domain_status_conversions!(SyncEntity {
    Clientes => "clientes",
    Produtos => "produtos",
    Pedidos => "pedidos",
});

impl SyncEntity {
    /// Order used by "sync all".
    pub const ALL: [Self; 3] = [Self::Clientes, Self::Produtos, Self::Pedidos];

    /// QuickBooks entity name backing this collection.
    pub fn quickbooks_name(self) -> &'static str {
        match self {
            Self::Clientes => "Customer",
            Self::Produtos => "Item",
            Self::Pedidos => "Invoice",
        }
    }

    /// Map a QuickBooks entity name from a webhook to a local collection.
    pub fn from_quickbooks_name(name: &str) -> Option<Self> {
        match name {
            "Customer" => Some(Self::Clientes),
            "Item" => Some(Self::Produtos),
            "Invoice" => Some(Self::Pedidos),
            _ => None,
        }
    }
}

/// Immutable audit record of one sync or integration operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncLogEntry {
    pub id: String,
    pub entity_type: String,
    pub entity_id: Option<String>,
    pub action: SyncAction,
    pub status: SyncLogStatus,
    pub quickbooks_id: Option<String>,
    pub error_message: Option<String>,
    pub details: Option<Value>,
    pub created_at: DateTime<Utc>,
}

impl SyncLogEntry {
    pub fn new(
        entity_type: impl Into<String>,
        action: SyncAction,
        status: SyncLogStatus,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            entity_type: entity_type.into(),
            entity_id: None,
            action,
            status,
            quickbooks_id: None,
            error_message: None,
            details: None,
            created_at: at,
        }
    }

    pub fn success(entity_type: impl Into<String>, action: SyncAction, at: DateTime<Utc>) -> Self {
        Self::new(entity_type, action, SyncLogStatus::Success, at)
    }

    pub fn error(
        entity_type: impl Into<String>,
        action: SyncAction,
        message: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        let mut entry = Self::new(entity_type, action, SyncLogStatus::Error, at);
        entry.error_message = Some(message.into());
        entry
    }

    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    pub fn with_quickbooks_id(mut self, id: impl Into<String>) -> Self {
        self.quickbooks_id = Some(id.into());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Read filter for the sync log viewer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncLogFilter {
    pub entity_type: Option<String>,
    pub status: Option<SyncLogStatus>,
    pub limit: Option<u32>,
}

impl SyncLogFilter {
    /// Requested limit clamped to `1..=SYNC_LOG_MAX_LIMIT`.
    pub fn effective_limit(&self) -> u32 {
        self.limit.unwrap_or(SYNC_LOG_DEFAULT_LIMIT).clamp(1, SYNC_LOG_MAX_LIMIT)
    }
}

/// Result of an upsert keyed by `quickbooks_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created(String),
    Updated(String),
}

impl UpsertOutcome {
    pub fn local_id(&self) -> &str {
        match self {
            Self::Created(id) | Self::Updated(id) => id,
        }
    }
}

/// One record that failed inside a sync batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncFailure {
    pub quickbooks_id: Option<String>,
    pub message: String,
}

/// Outcome of one entity batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSummary {
    pub entity_type: SyncEntity,
    /// Records returned by QuickBooks.
    pub total: usize,
    /// Records reconciled successfully (`created + updated`).
    pub synced: usize,
    pub created: usize,
    pub updated: usize,
    pub failed: usize,
    pub errors: Vec<SyncFailure>,
    /// QuickBooks ids, only for small batches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<Vec<String>>,
}

impl SyncSummary {
    pub fn empty(entity_type: SyncEntity) -> Self {
        Self {
            entity_type,
            total: 0,
            synced: 0,
            created: 0,
            updated: 0,
            failed: 0,
            errors: Vec::new(),
            records: None,
        }
    }
}

/// Per-entity slot of a "sync all" run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SyncBatchOutcome {
    Completed(SyncSummary),
    #[serde(rename_all = "camelCase")]
    Failed { entity_type: SyncEntity, error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncAllSummary {
    pub results: Vec<SyncBatchOutcome>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn entity_names_round_trip_with_quickbooks() {
        for entity in SyncEntity::ALL {
            assert_eq!(SyncEntity::from_quickbooks_name(entity.quickbooks_name()), Some(entity));
        }
        assert_eq!(SyncEntity::from_quickbooks_name("Estimate"), None);
    }

    #[test]
    fn empty_summary_serializes_zero_counts_without_records() {
        let value = serde_json::to_value(SyncSummary::empty(SyncEntity::Produtos)).unwrap();
        assert_eq!(value["synced"], json!(0));
        assert_eq!(value["created"], json!(0));
        assert_eq!(value["updated"], json!(0));
        assert!(value.get("records").is_none());
    }

    #[test]
    fn failed_batch_outcome_is_tagged() {
        let outcome = SyncBatchOutcome::Failed {
            entity_type: SyncEntity::Pedidos,
            error: "boom".into(),
        };
        let value = serde_json::to_value(outcome).unwrap();
        assert_eq!(value, json!({"status": "failed", "entityType": "pedidos", "error": "boom"}));
    }

    #[test]
    fn log_filter_clamps_limit() {
        assert_eq!(SyncLogFilter::default().effective_limit(), SYNC_LOG_DEFAULT_LIMIT);
        let filter = SyncLogFilter { limit: Some(10_000), ..SyncLogFilter::default() };
        assert_eq!(filter.effective_limit(), SYNC_LOG_MAX_LIMIT);
        let filter = SyncLogFilter { limit: Some(0), ..SyncLogFilter::default() };
        assert_eq!(filter.effective_limit(), 1);
    }

    #[test]
    fn error_entry_carries_message() {
        let entry = SyncLogEntry::error("clientes", SyncAction::Sync, "bad record", Utc::now())
            .with_quickbooks_id("42");
        assert_eq!(entry.status, SyncLogStatus::Error);
        assert_eq!(entry.error_message.as_deref(), Some("bad record"));
        assert_eq!(entry.quickbooks_id.as_deref(), Some("42"));
    }
}

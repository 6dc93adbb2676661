//! Append-only sync log

use std::sync::Arc;

use async_trait::async_trait;
use backoffice_core::SyncLogRepository;
use backoffice_domain::{Result, SyncLogEntry, SyncLogFilter};
use rusqlite::{params, params_from_iter, Row};
use serde_json::Value;

use super::manager::{blocking, DbManager};
use super::text_enum;
use crate::errors::map_storage_error;

const SYNC_LOG_COLUMNS: &str = "id, entity_type, entity_id, action, status, quickbooks_id, \
     error_message, details, created_at";

pub struct SqliteSyncLogRepository {
    db: Arc<DbManager>,
}

impl SqliteSyncLogRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

fn map_sync_log_row(row: &Row<'_>) -> rusqlite::Result<SyncLogEntry> {
    let action: String = row.get(3)?;
    let status: String = row.get(4)?;
    let details: Option<String> = row.get(7)?;
    let details = details
        .map(|raw| serde_json::from_str::<Value>(&raw))
        .transpose()
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(SyncLogEntry {
        id: row.get(0)?,
        entity_type: row.get(1)?,
        entity_id: row.get(2)?,
        action: text_enum(3, &action)?,
        status: text_enum(4, &status)?,
        quickbooks_id: row.get(5)?,
        error_message: row.get(6)?,
        details,
        created_at: row.get(8)?,
    })
}

#[async_trait]
impl SyncLogRepository for SqliteSyncLogRepository {
    async fn append(&self, entry: &SyncLogEntry) -> Result<()> {
        let entry = entry.clone();
        blocking(&self.db, move |conn| {
            let details = entry
                .details
                .as_ref()
                .map(serde_json::to_string)
                .transpose()
                .map_err(|e| map_storage_error(e.into()))?;
            conn.execute(
                "INSERT INTO sync_logs (id, entity_type, entity_id, action, status,
                                        quickbooks_id, error_message, details, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    entry.id,
                    entry.entity_type,
                    entry.entity_id,
                    entry.action.to_string(),
                    entry.status.to_string(),
                    entry.quickbooks_id,
                    entry.error_message,
                    details,
                    entry.created_at,
                ],
            )
            .map_err(map_storage_error)?;
            Ok(())
        })
        .await
    }

    async fn list(&self, filter: &SyncLogFilter) -> Result<Vec<SyncLogEntry>> {
        let filter = filter.clone();
        blocking(&self.db, move |conn| {
            let mut clauses = Vec::new();
            let mut values = Vec::new();
            if let Some(entity_type) = &filter.entity_type {
                values.push(entity_type.clone());
                clauses.push(format!("entity_type = ?{}", values.len()));
            }
            if let Some(status) = filter.status {
                values.push(status.to_string());
                clauses.push(format!("status = ?{}", values.len()));
            }
            let where_clause = if clauses.is_empty() {
                String::new()
            } else {
                format!("WHERE {}", clauses.join(" AND "))
            };

            let sql = format!(
                "SELECT {SYNC_LOG_COLUMNS} FROM sync_logs {where_clause} \
                 ORDER BY created_at DESC, rowid DESC LIMIT {}",
                filter.effective_limit()
            );
            let mut stmt = conn.prepare(&sql).map_err(map_storage_error)?;
            stmt.query_map(params_from_iter(values.iter()), map_sync_log_row)
                .map_err(map_storage_error)
        })
        .await
    }
}

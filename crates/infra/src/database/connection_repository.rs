//! QuickBooks connection storage
//!
//! Tokens are stored as plain columns; protect the database file itself.

use std::sync::Arc;

use async_trait::async_trait;
use backoffice_common::storage::SqliteConnection;
use backoffice_core::ConnectionRepository;
use backoffice_domain::{QuickBooksConnection, Result};
use chrono::Utc;
use rusqlite::{params, Row, TransactionBehavior};
use tracing::info;

use super::manager::{blocking, DbManager};
use super::optional;
use crate::errors::map_storage_error;

const CONNECTION_COLUMNS: &str = "realm_id, access_token, refresh_token, token_type, expires_at, \
     refresh_token_expires_at, is_active, created_at, updated_at";

pub struct SqliteConnectionRepository {
    db: Arc<DbManager>,
}

impl SqliteConnectionRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

fn map_connection_row(row: &Row<'_>) -> rusqlite::Result<QuickBooksConnection> {
    Ok(QuickBooksConnection {
        realm_id: row.get(0)?,
        access_token: row.get(1)?,
        refresh_token: row.get(2)?,
        token_type: row.get(3)?,
        expires_at: row.get(4)?,
        refresh_token_expires_at: row.get(5)?,
        is_active: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

fn select(
    conn: &SqliteConnection,
    filter: &str,
    value: Option<&str>,
) -> Result<Option<QuickBooksConnection>> {
    let sql = format!(
        "SELECT {CONNECTION_COLUMNS} FROM quickbooks_connections WHERE {filter} \
         ORDER BY updated_at DESC LIMIT 1"
    );
    let result = match value {
        Some(value) => conn.query_row(&sql, params![value], map_connection_row),
        None => conn.query_row(&sql, [], map_connection_row),
    };
    optional(result)
}

#[async_trait]
impl ConnectionRepository for SqliteConnectionRepository {
    async fn find_active(&self) -> Result<Option<QuickBooksConnection>> {
        blocking(&self.db, |conn| select(conn, "is_active = 1", None)).await
    }

    async fn find_by_realm(&self, realm_id: &str) -> Result<Option<QuickBooksConnection>> {
        let realm_id = realm_id.to_string();
        blocking(&self.db, move |conn| select(conn, "realm_id = ?1", Some(&realm_id))).await
    }

    async fn save(&self, connection: &QuickBooksConnection) -> Result<()> {
        let connection = connection.clone();
        blocking(&self.db, move |conn| {
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(|e| map_storage_error(e.into()))?;

            if connection.is_active {
                tx.execute(
                    "UPDATE quickbooks_connections SET is_active = 0
                     WHERE realm_id != ?1 AND is_active = 1",
                    params![connection.realm_id],
                )
                .map_err(|e| map_storage_error(e.into()))?;
            }

            tx.execute(
                "INSERT INTO quickbooks_connections (realm_id, access_token, refresh_token,
                     token_type, expires_at, refresh_token_expires_at, is_active, created_at,
                     updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(realm_id) DO UPDATE SET
                     access_token = excluded.access_token,
                     refresh_token = excluded.refresh_token,
                     token_type = excluded.token_type,
                     expires_at = excluded.expires_at,
                     refresh_token_expires_at = excluded.refresh_token_expires_at,
                     is_active = excluded.is_active,
                     updated_at = excluded.updated_at",
                params![
                    connection.realm_id,
                    connection.access_token,
                    connection.refresh_token,
                    connection.token_type,
                    connection.expires_at,
                    connection.refresh_token_expires_at,
                    connection.is_active,
                    connection.created_at,
                    connection.updated_at,
                ],
            )
            .map_err(|e| map_storage_error(e.into()))?;

            tx.commit().map_err(|e| map_storage_error(e.into()))?;
            info!(
                realm_id = %connection.realm_id,
                active = connection.is_active,
                "connection saved"
            );
            Ok(())
        })
        .await
    }

    async fn deactivate(&self, realm_id: &str) -> Result<()> {
        let realm_id = realm_id.to_string();
        blocking(&self.db, move |conn| {
            conn.execute(
                "UPDATE quickbooks_connections
                 SET access_token = '', refresh_token = '', is_active = 0, updated_at = ?2
                 WHERE realm_id = ?1",
                params![realm_id, Utc::now()],
            )
            .map_err(map_storage_error)?;
            Ok(())
        })
        .await
    }
}

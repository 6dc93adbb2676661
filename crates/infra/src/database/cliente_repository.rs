//! Clientes table

use std::sync::Arc;

use async_trait::async_trait;
use backoffice_common::storage::{SqliteConnection, StorageError};
use backoffice_core::ClienteRepository;
use backoffice_domain::{
    BackofficeError, Cliente, ClienteInput, ExternalRef, Result, SyncStatus, UpsertOutcome,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Row, TransactionBehavior};
use tracing::debug;

use super::manager::{blocking, DbManager};
use super::{ensure_affected, new_id, optional, text_enum};
use crate::errors::map_storage_error;

const CLIENTE_COLUMNS: &str = "id, nome, documento, email, telefone, endereco, cidade, estado, \
     cep, quickbooks_id, sync_status, synced_at, created_at, updated_at";

pub struct SqliteClienteRepository {
    db: Arc<DbManager>,
}

impl SqliteClienteRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

fn map_cliente_row(row: &Row<'_>) -> rusqlite::Result<Cliente> {
    let sync_status: String = row.get(10)?;
    Ok(Cliente {
        id: row.get(0)?,
        nome: row.get(1)?,
        documento: row.get(2)?,
        email: row.get(3)?,
        telefone: row.get(4)?,
        endereco: row.get(5)?,
        cidade: row.get(6)?,
        estado: row.get(7)?,
        cep: row.get(8)?,
        external: ExternalRef {
            quickbooks_id: row.get(9)?,
            sync_status: text_enum(10, &sync_status)?,
            synced_at: row.get(11)?,
        },
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

fn select_one(conn: &SqliteConnection, column: &str, value: &str) -> Result<Option<Cliente>> {
    let sql = format!("SELECT {CLIENTE_COLUMNS} FROM clientes WHERE {column} = ?1");
    optional(conn.query_row(&sql, params![value], map_cliente_row))
}

/// A second cliente with the same documento is a conflict, not a crash.
fn map_write_error(err: StorageError, documento: &str) -> BackofficeError {
    if err.is_unique_violation() && err.to_string().contains("clientes.documento") {
        return BackofficeError::Conflict(format!("documento {documento} is already registered"));
    }
    map_storage_error(err)
}

fn insert(
    conn: &rusqlite::Connection,
    id: &str,
    input: &ClienteInput,
    external: &ExternalRef,
    now: DateTime<Utc>,
) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO clientes (id, nome, documento, email, telefone, endereco, cidade, estado,
                               cep, quickbooks_id, sync_status, synced_at, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)",
        params![
            id,
            input.nome,
            input.documento,
            input.email,
            input.telefone,
            input.endereco,
            input.cidade,
            input.estado,
            input.cep,
            external.quickbooks_id,
            external.sync_status.to_string(),
            external.synced_at,
            now,
        ],
    )
}

#[async_trait]
impl ClienteRepository for SqliteClienteRepository {
    async fn list(&self) -> Result<Vec<Cliente>> {
        blocking(&self.db, |conn| {
            let sql =
                format!("SELECT {CLIENTE_COLUMNS} FROM clientes ORDER BY nome COLLATE NOCASE");
            let mut stmt = conn.prepare(&sql).map_err(map_storage_error)?;
            stmt.query_map([], map_cliente_row).map_err(map_storage_error)
        })
        .await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Cliente>> {
        let id = id.to_string();
        blocking(&self.db, move |conn| select_one(conn, "id", &id)).await
    }

    async fn find_by_quickbooks_id(&self, quickbooks_id: &str) -> Result<Option<Cliente>> {
        let quickbooks_id = quickbooks_id.to_string();
        blocking(&self.db, move |conn| select_one(conn, "quickbooks_id", &quickbooks_id)).await
    }

    async fn create(&self, input: ClienteInput) -> Result<Cliente> {
        blocking(&self.db, move |conn| {
            let id = new_id();
            insert(conn, &id, &input, &ExternalRef::default(), Utc::now())
                .map_err(|e| map_write_error(e.into(), &input.documento))?;
            select_one(conn, "id", &id)?
                .ok_or_else(|| BackofficeError::Internal("inserted cliente vanished".into()))
        })
        .await
    }

    async fn update(&self, id: &str, input: ClienteInput) -> Result<Cliente> {
        let id = id.to_string();
        blocking(&self.db, move |conn| {
            let changed = conn
                .execute(
                    "UPDATE clientes
                     SET nome = ?2, documento = ?3, email = ?4, telefone = ?5, endereco = ?6,
                         cidade = ?7, estado = ?8, cep = ?9, updated_at = ?10
                     WHERE id = ?1",
                    params![
                        id,
                        input.nome,
                        input.documento,
                        input.email,
                        input.telefone,
                        input.endereco,
                        input.cidade,
                        input.estado,
                        input.cep,
                        Utc::now(),
                    ],
                )
                .map_err(|e| map_write_error(e, &input.documento))?;
            ensure_affected(changed, "cliente", &id)?;
            select_one(conn, "id", &id)?
                .ok_or_else(|| BackofficeError::NotFound(format!("cliente {id} not found")))
        })
        .await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let id = id.to_string();
        blocking(&self.db, move |conn| {
            let changed = conn
                .execute("DELETE FROM clientes WHERE id = ?1", params![id])
                .map_err(map_storage_error)?;
            ensure_affected(changed, "cliente", &id)
        })
        .await
    }

    async fn upsert_by_quickbooks_id(
        &self,
        quickbooks_id: &str,
        input: ClienteInput,
        synced_at: DateTime<Utc>,
    ) -> Result<UpsertOutcome> {
        let quickbooks_id = quickbooks_id.to_string();
        blocking(&self.db, move |conn| {
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(|e| map_storage_error(e.into()))?;
            let existing: Option<String> = match tx.query_row(
                "SELECT id FROM clientes WHERE quickbooks_id = ?1",
                params![quickbooks_id],
                |row| row.get(0),
            ) {
                Ok(id) => Some(id),
                Err(rusqlite::Error::QueryReturnedNoRows) => None,
                Err(e) => return Err(map_storage_error(e.into())),
            };

            let outcome = match existing {
                Some(id) => {
                    tx.execute(
                        "UPDATE clientes
                         SET nome = ?2, email = ?3, telefone = ?4, endereco = ?5, cidade = ?6,
                             estado = ?7, cep = ?8, sync_status = ?9, synced_at = ?10,
                             updated_at = ?10
                         WHERE id = ?1",
                        params![
                            id,
                            input.nome,
                            input.email,
                            input.telefone,
                            input.endereco,
                            input.cidade,
                            input.estado,
                            input.cep,
                            SyncStatus::Synced.to_string(),
                            synced_at,
                        ],
                    )
                    .map_err(|e| map_storage_error(e.into()))?;
                    UpsertOutcome::Updated(id)
                }
                None => {
                    let id = new_id();
                    let external = ExternalRef::synced(quickbooks_id.as_str(), synced_at);
                    insert(&tx, &id, &input, &external, synced_at)
                        .map_err(|e| map_write_error(e.into(), &input.documento))?;
                    UpsertOutcome::Created(id)
                }
            };

            tx.commit().map_err(|e| map_storage_error(e.into()))?;
            debug!(quickbooks_id = %quickbooks_id, outcome = ?outcome, "cliente upserted");
            Ok(outcome)
        })
        .await
    }

    async fn mark_synced(&self, id: &str, quickbooks_id: &str, at: DateTime<Utc>) -> Result<()> {
        let (id, quickbooks_id) = (id.to_string(), quickbooks_id.to_string());
        blocking(&self.db, move |conn| {
            let changed = conn
                .execute(
                    "UPDATE clientes
                     SET quickbooks_id = ?2, sync_status = ?3, synced_at = ?4, updated_at = ?4
                     WHERE id = ?1",
                    params![id, quickbooks_id, SyncStatus::Synced.to_string(), at],
                )
                .map_err(map_storage_error)?;
            ensure_affected(changed, "cliente", &id)
        })
        .await
    }

    async fn mark_sync_error(&self, id: &str) -> Result<()> {
        let id = id.to_string();
        blocking(&self.db, move |conn| {
            let changed = conn
                .execute(
                    "UPDATE clientes SET sync_status = ?2 WHERE id = ?1",
                    params![id, SyncStatus::Error.to_string()],
                )
                .map_err(map_storage_error)?;
            ensure_affected(changed, "cliente", &id)
        })
        .await
    }
}

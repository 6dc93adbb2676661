//! Produtos table

use std::sync::Arc;

use async_trait::async_trait;
use backoffice_common::storage::SqliteConnection;
use backoffice_core::ProdutoRepository;
use backoffice_domain::{
    BackofficeError, ExternalRef, Produto, ProdutoInput, Result, SyncStatus, UpsertOutcome,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Row, TransactionBehavior};
use tracing::debug;

use super::manager::{blocking, DbManager};
use super::{ensure_affected, new_id, optional, text_enum};
use crate::errors::map_storage_error;

const PRODUTO_COLUMNS: &str = "id, codigo, nome, descricao, preco, unidade, ativo, quickbooks_id, \
     sync_status, synced_at, created_at, updated_at";

pub struct SqliteProdutoRepository {
    db: Arc<DbManager>,
}

impl SqliteProdutoRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

fn map_produto_row(row: &Row<'_>) -> rusqlite::Result<Produto> {
    let sync_status: String = row.get(8)?;
    Ok(Produto {
        id: row.get(0)?,
        codigo: row.get(1)?,
        nome: row.get(2)?,
        descricao: row.get(3)?,
        preco: row.get(4)?,
        unidade: row.get(5)?,
        ativo: row.get(6)?,
        external: ExternalRef {
            quickbooks_id: row.get(7)?,
            sync_status: text_enum(8, &sync_status)?,
            synced_at: row.get(9)?,
        },
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

fn select_one(conn: &SqliteConnection, column: &str, value: &str) -> Result<Option<Produto>> {
    let sql = format!("SELECT {PRODUTO_COLUMNS} FROM produtos WHERE {column} = ?1");
    optional(conn.query_row(&sql, params![value], map_produto_row))
}

fn insert(
    conn: &rusqlite::Connection,
    id: &str,
    input: &ProdutoInput,
    external: &ExternalRef,
    now: DateTime<Utc>,
) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO produtos (id, codigo, nome, descricao, preco, unidade, ativo, quickbooks_id,
                               sync_status, synced_at, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
        params![
            id,
            input.codigo,
            input.nome,
            input.descricao,
            input.preco,
            input.unidade,
            input.ativo,
            external.quickbooks_id,
            external.sync_status.to_string(),
            external.synced_at,
            now,
        ],
    )
}

#[async_trait]
impl ProdutoRepository for SqliteProdutoRepository {
    async fn list(&self) -> Result<Vec<Produto>> {
        blocking(&self.db, |conn| {
            let sql =
                format!("SELECT {PRODUTO_COLUMNS} FROM produtos ORDER BY nome COLLATE NOCASE");
            let mut stmt = conn.prepare(&sql).map_err(map_storage_error)?;
            stmt.query_map([], map_produto_row).map_err(map_storage_error)
        })
        .await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Produto>> {
        let id = id.to_string();
        blocking(&self.db, move |conn| select_one(conn, "id", &id)).await
    }

    async fn find_by_quickbooks_id(&self, quickbooks_id: &str) -> Result<Option<Produto>> {
        let quickbooks_id = quickbooks_id.to_string();
        blocking(&self.db, move |conn| select_one(conn, "quickbooks_id", &quickbooks_id)).await
    }

    async fn create(&self, input: ProdutoInput) -> Result<Produto> {
        blocking(&self.db, move |conn| {
            let id = new_id();
            insert(conn, &id, &input, &ExternalRef::default(), Utc::now())
                .map_err(|e| map_storage_error(e.into()))?;
            select_one(conn, "id", &id)?
                .ok_or_else(|| BackofficeError::Internal("inserted produto vanished".into()))
        })
        .await
    }

    async fn update(&self, id: &str, input: ProdutoInput) -> Result<Produto> {
        let id = id.to_string();
        blocking(&self.db, move |conn| {
            let changed = conn
                .execute(
                    "UPDATE produtos
                     SET codigo = ?2, nome = ?3, descricao = ?4, preco = ?5, unidade = ?6,
                         ativo = ?7, updated_at = ?8
                     WHERE id = ?1",
                    params![
                        id,
                        input.codigo,
                        input.nome,
                        input.descricao,
                        input.preco,
                        input.unidade,
                        input.ativo,
                        Utc::now(),
                    ],
                )
                .map_err(map_storage_error)?;
            ensure_affected(changed, "produto", &id)?;
            select_one(conn, "id", &id)?
                .ok_or_else(|| BackofficeError::NotFound(format!("produto {id} not found")))
        })
        .await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let id = id.to_string();
        blocking(&self.db, move |conn| {
            let changed = conn
                .execute("DELETE FROM produtos WHERE id = ?1", params![id])
                .map_err(map_storage_error)?;
            ensure_affected(changed, "produto", &id)
        })
        .await
    }

    async fn upsert_by_quickbooks_id(
        &self,
        quickbooks_id: &str,
        input: ProdutoInput,
        synced_at: DateTime<Utc>,
    ) -> Result<UpsertOutcome> {
        let quickbooks_id = quickbooks_id.to_string();
        blocking(&self.db, move |conn| {
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(|e| map_storage_error(e.into()))?;
            let existing: Option<String> = match tx.query_row(
                "SELECT id FROM produtos WHERE quickbooks_id = ?1",
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
                        "UPDATE produtos
                         SET nome = ?2, descricao = ?3, preco = ?4, unidade = ?5, ativo = ?6,
                             sync_status = ?7, synced_at = ?8, updated_at = ?8
                         WHERE id = ?1",
                        params![
                            id,
                            input.nome,
                            input.descricao,
                            input.preco,
                            input.unidade,
                            input.ativo,
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
                        .map_err(|e| map_storage_error(e.into()))?;
                    UpsertOutcome::Created(id)
                }
            };

            tx.commit().map_err(|e| map_storage_error(e.into()))?;
            debug!(quickbooks_id = %quickbooks_id, outcome = ?outcome, "produto upserted");
            Ok(outcome)
        })
        .await
    }
}

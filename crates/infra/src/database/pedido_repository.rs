//! Pedidos and pedido_itens tables
//!
//! Order numbers are allocated inside a `BEGIN IMMEDIATE` transaction, so
//! two writers never read the same maximum. The UNIQUE index on `numero`
//! backs that up; a collision is retried a bounded number of times.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use backoffice_common::storage::{SqliteConnection, StorageError, StorageResult};
use backoffice_core::PedidoRepository;
use backoffice_domain::constants::{ORDER_NUMBER_MAX_ATTEMPTS, ORDER_NUMBER_WIDTH};
use backoffice_domain::{
    BackofficeError, ExternalRef, NewPedido, Pedido, PedidoItem, PedidoUpdate, Result, SyncStatus,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Row, TransactionBehavior};
use tracing::{debug, warn};

use super::manager::{blocking, DbManager};
use super::{ensure_affected, new_id, optional, text_enum};
use crate::errors::map_storage_error;

const PEDIDO_COLUMNS: &str = "id, numero, cliente_id, status, valor_total, observacoes, \
     estimate_id, quickbooks_id, sync_status, synced_at, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, pedido_id, produto_id, descricao, quantidade, preco_unitario, \
     posicao";

pub struct SqlitePedidoRepository {
    db: Arc<DbManager>,
}

impl SqlitePedidoRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

fn map_pedido_row(row: &Row<'_>) -> rusqlite::Result<Pedido> {
    let status: String = row.get(3)?;
    let sync_status: String = row.get(8)?;
    Ok(Pedido {
        id: row.get(0)?,
        numero: row.get(1)?,
        cliente_id: row.get(2)?,
        status: text_enum(3, &status)?,
        valor_total: row.get(4)?,
        observacoes: row.get(5)?,
        estimate_id: row.get(6)?,
        external: ExternalRef {
            quickbooks_id: row.get(7)?,
            sync_status: text_enum(8, &sync_status)?,
            synced_at: row.get(9)?,
        },
        itens: Vec::new(),
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

fn map_item_row(row: &Row<'_>) -> rusqlite::Result<PedidoItem> {
    Ok(PedidoItem {
        id: row.get(0)?,
        pedido_id: row.get(1)?,
        produto_id: row.get(2)?,
        descricao: row.get(3)?,
        quantidade: row.get(4)?,
        preco_unitario: row.get(5)?,
        posicao: row.get(6)?,
    })
}

fn load_itens(conn: &SqliteConnection, pedido_id: &str) -> Result<Vec<PedidoItem>> {
    let sql = format!(
        "SELECT {ITEM_COLUMNS} FROM pedido_itens WHERE pedido_id = ?1 ORDER BY posicao ASC"
    );
    let mut stmt = conn.prepare(&sql).map_err(map_storage_error)?;
    stmt.query_map(params![pedido_id], map_item_row).map_err(map_storage_error)
}

fn select_one(conn: &SqliteConnection, column: &str, value: &str) -> Result<Option<Pedido>> {
    let sql = format!("SELECT {PEDIDO_COLUMNS} FROM pedidos WHERE {column} = ?1");
    let Some(mut pedido) = optional(conn.query_row(&sql, params![value], map_pedido_row))? else {
        return Ok(None);
    };
    pedido.itens = load_itens(conn, &pedido.id)?;
    Ok(Some(pedido))
}

fn format_numero(sequence: i64) -> String {
    format!("{sequence:0width$}", width = ORDER_NUMBER_WIDTH)
}

fn is_numero_collision(err: &StorageError) -> bool {
    err.is_unique_violation() && err.to_string().contains("pedidos.numero")
}

/// One allocation attempt: read the highest number, insert the order and
/// its items, commit. Returns the allocated number.
fn try_insert(
    conn: &mut rusqlite::Connection,
    id: &str,
    pedido: &NewPedido,
    now: DateTime<Utc>,
) -> StorageResult<String> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let highest: i64 = tx.query_row(
        "SELECT COALESCE(MAX(CAST(numero AS INTEGER)), 0) FROM pedidos",
        [],
        |row| row.get(0),
    )?;
    let numero = format_numero(highest + 1);

    tx.execute(
        "INSERT INTO pedidos (id, numero, cliente_id, status, valor_total, observacoes,
                              estimate_id, quickbooks_id, sync_status, synced_at,
                              created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
        params![
            id,
            numero,
            pedido.cliente_id,
            pedido.status.to_string(),
            pedido.total(),
            pedido.observacoes,
            pedido.estimate_id,
            pedido.external.quickbooks_id,
            pedido.external.sync_status.to_string(),
            pedido.external.synced_at,
            now,
        ],
    )?;

    {
        let mut stmt = tx.prepare(
            "INSERT INTO pedido_itens (id, pedido_id, produto_id, descricao, quantidade,
                                       preco_unitario, posicao)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for (posicao, item) in pedido.itens.iter().enumerate() {
            stmt.execute(params![
                new_id(),
                id,
                item.produto_id,
                item.descricao,
                item.quantidade,
                item.preco_unitario,
                posicao as u32,
            ])?;
        }
    }

    tx.commit()?;
    Ok(numero)
}

#[async_trait]
impl PedidoRepository for SqlitePedidoRepository {
    async fn list(&self) -> Result<Vec<Pedido>> {
        blocking(&self.db, |conn| {
            let sql = format!("SELECT {PEDIDO_COLUMNS} FROM pedidos ORDER BY numero DESC");
            let mut pedidos = {
                let mut stmt = conn.prepare(&sql).map_err(map_storage_error)?;
                stmt.query_map([], map_pedido_row).map_err(map_storage_error)?
            };

            let sql =
                format!("SELECT {ITEM_COLUMNS} FROM pedido_itens ORDER BY pedido_id, posicao");
            let itens = {
                let mut stmt = conn.prepare(&sql).map_err(map_storage_error)?;
                stmt.query_map([], map_item_row).map_err(map_storage_error)?
            };

            let mut by_pedido: HashMap<String, Vec<PedidoItem>> = HashMap::new();
            for item in itens {
                by_pedido.entry(item.pedido_id.clone()).or_default().push(item);
            }
            for pedido in &mut pedidos {
                pedido.itens = by_pedido.remove(&pedido.id).unwrap_or_default();
            }
            Ok(pedidos)
        })
        .await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Pedido>> {
        let id = id.to_string();
        blocking(&self.db, move |conn| select_one(conn, "id", &id)).await
    }

    async fn find_by_quickbooks_id(&self, quickbooks_id: &str) -> Result<Option<Pedido>> {
        let quickbooks_id = quickbooks_id.to_string();
        blocking(&self.db, move |conn| select_one(conn, "quickbooks_id", &quickbooks_id)).await
    }

    async fn create(&self, pedido: NewPedido) -> Result<Pedido> {
        blocking(&self.db, move |conn| {
            let id = new_id();
            let now = Utc::now();

            for attempt in 1..=ORDER_NUMBER_MAX_ATTEMPTS {
                match try_insert(conn, &id, &pedido, now) {
                    Ok(numero) => {
                        debug!(pedido_id = %id, numero = %numero, "pedido created");
                        return select_one(conn, "id", &id)?.ok_or_else(|| {
                            BackofficeError::Internal("inserted pedido vanished".into())
                        });
                    }
                    Err(err) if is_numero_collision(&err) => {
                        warn!(attempt, "order number collision, retrying");
                    }
                    Err(err) => return Err(map_storage_error(err)),
                }
            }

            Err(BackofficeError::Conflict(format!(
                "could not allocate an order number after {ORDER_NUMBER_MAX_ATTEMPTS} attempts"
            )))
        })
        .await
    }

    async fn update(&self, id: &str, update: PedidoUpdate) -> Result<Pedido> {
        let id = id.to_string();
        blocking(&self.db, move |conn| {
            let changed = conn
                .execute(
                    "UPDATE pedidos
                     SET status = COALESCE(?2, status),
                         observacoes = COALESCE(?3, observacoes),
                         updated_at = ?4
                     WHERE id = ?1",
                    params![
                        id,
                        update.status.map(|status| status.to_string()),
                        update.observacoes,
                        Utc::now(),
                    ],
                )
                .map_err(map_storage_error)?;
            ensure_affected(changed, "pedido", &id)?;
            select_one(conn, "id", &id)?
                .ok_or_else(|| BackofficeError::NotFound(format!("pedido {id} not found")))
        })
        .await
    }

    async fn refresh_from_quickbooks(
        &self,
        id: &str,
        valor_total: f64,
        synced_at: DateTime<Utc>,
    ) -> Result<()> {
        let id = id.to_string();
        blocking(&self.db, move |conn| {
            let changed = conn
                .execute(
                    "UPDATE pedidos
                     SET valor_total = ?2, sync_status = ?3, synced_at = ?4, updated_at = ?4
                     WHERE id = ?1",
                    params![id, valor_total, SyncStatus::Synced.to_string(), synced_at],
                )
                .map_err(map_storage_error)?;
            ensure_affected(changed, "pedido", &id)
        })
        .await
    }
}

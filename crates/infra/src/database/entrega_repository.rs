//! Entregas table

use std::sync::Arc;

use async_trait::async_trait;
use backoffice_common::storage::SqliteConnection;
use backoffice_core::EntregaRepository;
use backoffice_domain::{
    BackofficeError, Entrega, EntregaStatus, EntregaUpdate, NewEntrega, Result,
};
use chrono::Utc;
use rusqlite::{params, Row};

use super::manager::{blocking, DbManager};
use super::{ensure_affected, new_id, optional, text_enum};
use crate::errors::map_storage_error;

const ENTREGA_COLUMNS: &str = "id, pedido_id, motorista_id, veiculo_id, data_entrega, \
     endereco_entrega, status, observacoes, estimate_id, invoice_id, created_at, updated_at";

pub struct SqliteEntregaRepository {
    db: Arc<DbManager>,
}

impl SqliteEntregaRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

fn map_entrega_row(row: &Row<'_>) -> rusqlite::Result<Entrega> {
    let status: String = row.get(6)?;
    Ok(Entrega {
        id: row.get(0)?,
        pedido_id: row.get(1)?,
        motorista_id: row.get(2)?,
        veiculo_id: row.get(3)?,
        data_entrega: row.get(4)?,
        endereco_entrega: row.get(5)?,
        status: text_enum(6, &status)?,
        observacoes: row.get(7)?,
        estimate_id: row.get(8)?,
        invoice_id: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

fn select_one(conn: &SqliteConnection, id: &str) -> Result<Option<Entrega>> {
    let sql = format!("SELECT {ENTREGA_COLUMNS} FROM entregas WHERE id = ?1");
    optional(conn.query_row(&sql, params![id], map_entrega_row))
}

#[async_trait]
impl EntregaRepository for SqliteEntregaRepository {
    async fn list(&self) -> Result<Vec<Entrega>> {
        blocking(&self.db, |conn| {
            let sql = format!(
                "SELECT {ENTREGA_COLUMNS} FROM entregas \
                 ORDER BY data_entrega DESC, created_at DESC"
            );
            let mut stmt = conn.prepare(&sql).map_err(map_storage_error)?;
            stmt.query_map([], map_entrega_row).map_err(map_storage_error)
        })
        .await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Entrega>> {
        let id = id.to_string();
        blocking(&self.db, move |conn| select_one(conn, &id)).await
    }

    async fn create(&self, entrega: NewEntrega) -> Result<Entrega> {
        blocking(&self.db, move |conn| {
            let id = new_id();
            conn.execute(
                "INSERT INTO entregas (id, pedido_id, motorista_id, veiculo_id, data_entrega,
                                       endereco_entrega, status, observacoes, estimate_id,
                                       invoice_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
                params![
                    id,
                    entrega.pedido_id,
                    entrega.motorista_id,
                    entrega.veiculo_id,
                    entrega.data_entrega,
                    entrega.endereco_entrega,
                    EntregaStatus::Agendada.to_string(),
                    entrega.observacoes,
                    entrega.estimate_id,
                    entrega.invoice_id,
                    Utc::now(),
                ],
            )
            .map_err(map_storage_error)?;
            select_one(conn, &id)?
                .ok_or_else(|| BackofficeError::Internal("inserted entrega vanished".into()))
        })
        .await
    }

    async fn update(&self, id: &str, update: EntregaUpdate) -> Result<Entrega> {
        let id = id.to_string();
        blocking(&self.db, move |conn| {
            let changed = conn
                .execute(
                    "UPDATE entregas
                     SET status = COALESCE(?2, status),
                         motorista_id = COALESCE(?3, motorista_id),
                         veiculo_id = COALESCE(?4, veiculo_id),
                         data_entrega = COALESCE(?5, data_entrega),
                         endereco_entrega = COALESCE(?6, endereco_entrega),
                         observacoes = COALESCE(?7, observacoes),
                         updated_at = ?8
                     WHERE id = ?1",
                    params![
                        id,
                        update.status.map(|status| status.to_string()),
                        update.motorista_id,
                        update.veiculo_id,
                        update.data_entrega,
                        update.endereco_entrega,
                        update.observacoes,
                        Utc::now(),
                    ],
                )
                .map_err(map_storage_error)?;
            ensure_affected(changed, "entrega", &id)?;
            select_one(conn, &id)?
                .ok_or_else(|| BackofficeError::NotFound(format!("entrega {id} not found")))
        })
        .await
    }
}

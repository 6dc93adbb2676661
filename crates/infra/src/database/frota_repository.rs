//! Motoristas and veiculos tables

use std::sync::Arc;

use async_trait::async_trait;
use backoffice_common::storage::SqliteConnection;
use backoffice_core::{MotoristaRepository, VeiculoRepository};
use backoffice_domain::{BackofficeError, Motorista, MotoristaInput, Result, Veiculo, VeiculoInput};
use chrono::Utc;
use rusqlite::{params, Row};

use super::manager::{blocking, DbManager};
use super::{ensure_affected, new_id, optional};
use crate::errors::map_storage_error;

const MOTORISTA_COLUMNS: &str = "id, nome, cpf, cnh, telefone, ativo, created_at, updated_at";
const VEICULO_COLUMNS: &str = "id, placa, modelo, capacidade_kg, ativo, created_at, updated_at";

pub struct SqliteMotoristaRepository {
    db: Arc<DbManager>,
}

impl SqliteMotoristaRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

pub struct SqliteVeiculoRepository {
    db: Arc<DbManager>,
}

impl SqliteVeiculoRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

fn map_motorista_row(row: &Row<'_>) -> rusqlite::Result<Motorista> {
    Ok(Motorista {
        id: row.get(0)?,
        nome: row.get(1)?,
        cpf: row.get(2)?,
        cnh: row.get(3)?,
        telefone: row.get(4)?,
        ativo: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn map_veiculo_row(row: &Row<'_>) -> rusqlite::Result<Veiculo> {
    Ok(Veiculo {
        id: row.get(0)?,
        placa: row.get(1)?,
        modelo: row.get(2)?,
        capacidade_kg: row.get(3)?,
        ativo: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn select_motorista(conn: &SqliteConnection, id: &str) -> Result<Option<Motorista>> {
    let sql = format!("SELECT {MOTORISTA_COLUMNS} FROM motoristas WHERE id = ?1");
    optional(conn.query_row(&sql, params![id], map_motorista_row))
}

fn select_veiculo(conn: &SqliteConnection, id: &str) -> Result<Option<Veiculo>> {
    let sql = format!("SELECT {VEICULO_COLUMNS} FROM veiculos WHERE id = ?1");
    optional(conn.query_row(&sql, params![id], map_veiculo_row))
}

fn delete_row(conn: &SqliteConnection, table: &str, kind: &str, id: &str) -> Result<()> {
    let changed = conn
        .execute(&format!("DELETE FROM {table} WHERE id = ?1"), params![id])
        .map_err(map_storage_error)?;
    ensure_affected(changed, kind, id)
}

#[async_trait]
impl MotoristaRepository for SqliteMotoristaRepository {
    async fn list(&self) -> Result<Vec<Motorista>> {
        blocking(&self.db, |conn| {
            let sql =
                format!("SELECT {MOTORISTA_COLUMNS} FROM motoristas ORDER BY nome COLLATE NOCASE");
            let mut stmt = conn.prepare(&sql).map_err(map_storage_error)?;
            stmt.query_map([], map_motorista_row).map_err(map_storage_error)
        })
        .await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Motorista>> {
        let id = id.to_string();
        blocking(&self.db, move |conn| select_motorista(conn, &id)).await
    }

    async fn create(&self, input: MotoristaInput) -> Result<Motorista> {
        blocking(&self.db, move |conn| {
            let id = new_id();
            conn.execute(
                "INSERT INTO motoristas (id, nome, cpf, cnh, telefone, ativo, created_at,
                                         updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
                params![
                    id,
                    input.nome,
                    input.cpf,
                    input.cnh,
                    input.telefone,
                    input.ativo,
                    Utc::now(),
                ],
            )
            .map_err(map_storage_error)?;
            select_motorista(conn, &id)?
                .ok_or_else(|| BackofficeError::Internal("inserted motorista vanished".into()))
        })
        .await
    }

    async fn update(&self, id: &str, input: MotoristaInput) -> Result<Motorista> {
        let id = id.to_string();
        blocking(&self.db, move |conn| {
            let changed = conn
                .execute(
                    "UPDATE motoristas
                     SET nome = ?2, cpf = ?3, cnh = ?4, telefone = ?5, ativo = ?6,
                         updated_at = ?7
                     WHERE id = ?1",
                    params![
                        id,
                        input.nome,
                        input.cpf,
                        input.cnh,
                        input.telefone,
                        input.ativo,
                        Utc::now(),
                    ],
                )
                .map_err(map_storage_error)?;
            ensure_affected(changed, "motorista", &id)?;
            select_motorista(conn, &id)?
                .ok_or_else(|| BackofficeError::NotFound(format!("motorista {id} not found")))
        })
        .await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let id = id.to_string();
        blocking(&self.db, move |conn| delete_row(conn, "motoristas", "motorista", &id)).await
    }
}

#[async_trait]
impl VeiculoRepository for SqliteVeiculoRepository {
    async fn list(&self) -> Result<Vec<Veiculo>> {
        blocking(&self.db, |conn| {
            let sql = format!("SELECT {VEICULO_COLUMNS} FROM veiculos ORDER BY placa");
            let mut stmt = conn.prepare(&sql).map_err(map_storage_error)?;
            stmt.query_map([], map_veiculo_row).map_err(map_storage_error)
        })
        .await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Veiculo>> {
        let id = id.to_string();
        blocking(&self.db, move |conn| select_veiculo(conn, &id)).await
    }

    async fn create(&self, input: VeiculoInput) -> Result<Veiculo> {
        blocking(&self.db, move |conn| {
            let id = new_id();
            conn.execute(
                "INSERT INTO veiculos (id, placa, modelo, capacidade_kg, ativo, created_at,
                                       updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                params![
                    id,
                    input.placa,
                    input.modelo,
                    input.capacidade_kg,
                    input.ativo,
                    Utc::now(),
                ],
            )
            .map_err(map_storage_error)?;
            select_veiculo(conn, &id)?
                .ok_or_else(|| BackofficeError::Internal("inserted veiculo vanished".into()))
        })
        .await
    }

    async fn update(&self, id: &str, input: VeiculoInput) -> Result<Veiculo> {
        let id = id.to_string();
        blocking(&self.db, move |conn| {
            let changed = conn
                .execute(
                    "UPDATE veiculos
                     SET placa = ?2, modelo = ?3, capacidade_kg = ?4, ativo = ?5, updated_at = ?6
                     WHERE id = ?1",
                    params![
                        id,
                        input.placa,
                        input.modelo,
                        input.capacidade_kg,
                        input.ativo,
                        Utc::now(),
                    ],
                )
                .map_err(map_storage_error)?;
            ensure_affected(changed, "veiculo", &id)?;
            select_veiculo(conn, &id)?
                .ok_or_else(|| BackofficeError::NotFound(format!("veiculo {id} not found")))
        })
        .await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let id = id.to_string();
        blocking(&self.db, move |conn| delete_row(conn, "veiculos", "veiculo", &id)).await
    }
}

//! SQLite implementations of the storage ports

pub mod cliente_repository;
pub mod connection_repository;
pub mod entrega_repository;
pub mod frota_repository;
pub mod manager;
pub mod pedido_repository;
pub mod produto_repository;
pub mod sync_log_repository;

use std::str::FromStr;
use std::sync::Arc;

use backoffice_common::storage::StorageError;
use backoffice_core::LocalStore;
use backoffice_domain::{BackofficeError, Result};
use rusqlite::types::Type;

pub use cliente_repository::SqliteClienteRepository;
pub use connection_repository::SqliteConnectionRepository;
pub use entrega_repository::SqliteEntregaRepository;
pub use frota_repository::{SqliteMotoristaRepository, SqliteVeiculoRepository};
pub use manager::DbManager;
pub use pedido_repository::SqlitePedidoRepository;
pub use produto_repository::SqliteProdutoRepository;
pub use sync_log_repository::SqliteSyncLogRepository;

/// Every record repository over one database.
pub fn local_store(db: &Arc<DbManager>) -> LocalStore {
    LocalStore {
        clientes: Arc::new(SqliteClienteRepository::new(Arc::clone(db))),
        produtos: Arc::new(SqliteProdutoRepository::new(Arc::clone(db))),
        pedidos: Arc::new(SqlitePedidoRepository::new(Arc::clone(db))),
        entregas: Arc::new(SqliteEntregaRepository::new(Arc::clone(db))),
        motoristas: Arc::new(SqliteMotoristaRepository::new(Arc::clone(db))),
        veiculos: Arc::new(SqliteVeiculoRepository::new(Arc::clone(db))),
    }
}

/// Parse a lowercase status column.
pub(crate) fn text_enum<T>(index: usize, raw: &str) -> rusqlite::Result<T>
where
    T: FromStr<Err = String>,
{
    raw.parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, e.into()))
}

/// `query_row` miss becomes `None`.
pub(crate) fn optional<T>(result: std::result::Result<T, StorageError>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(StorageError::Rusqlite(rusqlite::Error::QueryReturnedNoRows)) => Ok(None),
        Err(err) => Err(crate::errors::map_storage_error(err)),
    }
}

/// An UPDATE or DELETE that touched no row.
pub(crate) fn ensure_affected(changed: usize, kind: &str, id: &str) -> Result<()> {
    if changed == 0 {
        return Err(BackofficeError::NotFound(format!("{kind} {id} not found")));
    }
    Ok(())
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::now_v7().to_string()
}

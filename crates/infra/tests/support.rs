#![allow(dead_code)]

use std::sync::Arc;

use backoffice_core::{LocalStore, RecordService};
use backoffice_domain::{ClienteInput, NewPedidoItem, PedidoInput};
use backoffice_infra::database::{local_store, DbManager};
use tempfile::TempDir;

/// Temporary database wrapper that keeps the underlying file alive for the
/// duration of a test run.
pub struct TestDatabase {
    pub manager: Arc<DbManager>,
    _temp_dir: TempDir,
}

impl TestDatabase {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let manager = DbManager::open(temp_dir.path().join("test.db"), 4)
            .expect("db manager should be created");
        Self { manager, _temp_dir: temp_dir }
    }

    pub fn store(&self) -> LocalStore {
        local_store(&self.manager)
    }

    pub fn records(&self) -> RecordService {
        RecordService::new(self.store())
    }

    /// Execute a batch of SQL statements against the database.
    pub fn execute_batch(&self, sql: &str) {
        let conn = self
            .manager
            .get_connection()
            .expect("connection should be available for execute_batch");
        conn.execute_batch(sql).expect("SQL batch execution should succeed");
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}

pub fn cliente_input(nome: &str, documento: &str) -> ClienteInput {
    ClienteInput { nome: nome.into(), documento: documento.into(), ..Default::default() }
}

pub fn pedido_input(cliente_id: &str, itens: &[(&str, f64, f64)]) -> PedidoInput {
    PedidoInput {
        cliente_id: cliente_id.into(),
        observacoes: None,
        itens: itens
            .iter()
            .map(|(descricao, quantidade, preco_unitario)| NewPedidoItem {
                produto_id: None,
                descricao: (*descricao).into(),
                quantidade: *quantidade,
                preco_unitario: *preco_unitario,
            })
            .collect(),
    }
}

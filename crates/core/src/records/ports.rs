//! Port interfaces for the local relational store

use async_trait::async_trait;
use backoffice_domain::{
    Cliente, ClienteInput, Entrega, EntregaUpdate, Motorista, MotoristaInput, NewEntrega,
    NewPedido, Pedido, PedidoUpdate, Produto, ProdutoInput, Result, UpsertOutcome, Veiculo,
    VeiculoInput,
};
use chrono::{DateTime, Utc};

/// Clientes, mirrored as QuickBooks customers.
#[async_trait]
pub trait ClienteRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Cliente>>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Cliente>>;

    async fn find_by_quickbooks_id(&self, quickbooks_id: &str) -> Result<Option<Cliente>>;

    /// Insert with `syncStatus = pending`.
    async fn create(&self, input: ClienteInput) -> Result<Cliente>;

    async fn update(&self, id: &str, input: ClienteInput) -> Result<Cliente>;

    async fn delete(&self, id: &str) -> Result<()>;

    /// Update the row carrying `quickbooks_id`, or insert one. `documento`
    /// is only written on insert. Either way the row ends `synced` at
    /// `synced_at`.
    async fn upsert_by_quickbooks_id(
        &self,
        quickbooks_id: &str,
        input: ClienteInput,
        synced_at: DateTime<Utc>,
    ) -> Result<UpsertOutcome>;

    async fn mark_synced(&self, id: &str, quickbooks_id: &str, at: DateTime<Utc>) -> Result<()>;

    /// Flip to `error`; `synced_at` is left untouched.
    async fn mark_sync_error(&self, id: &str) -> Result<()>;
}

/// Produtos, mirrored as QuickBooks items.
#[async_trait]
pub trait ProdutoRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Produto>>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Produto>>;

    async fn find_by_quickbooks_id(&self, quickbooks_id: &str) -> Result<Option<Produto>>;

    async fn create(&self, input: ProdutoInput) -> Result<Produto>;

    async fn update(&self, id: &str, input: ProdutoInput) -> Result<Produto>;

    async fn delete(&self, id: &str) -> Result<()>;

    /// Same contract as [`ClienteRepository::upsert_by_quickbooks_id`];
    /// `codigo` is only written on insert.
    async fn upsert_by_quickbooks_id(
        &self,
        quickbooks_id: &str,
        input: ProdutoInput,
        synced_at: DateTime<Utc>,
    ) -> Result<UpsertOutcome>;
}

/// Pedidos and their items.
#[async_trait]
pub trait PedidoRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Pedido>>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Pedido>>;

    async fn find_by_quickbooks_id(&self, quickbooks_id: &str) -> Result<Option<Pedido>>;

    /// Allocate the next order number (highest + 1, zero-padded) and insert
    /// the order with its items in one serialized transaction.
    async fn create(&self, pedido: NewPedido) -> Result<Pedido>;

    async fn update(&self, id: &str, update: PedidoUpdate) -> Result<Pedido>;

    /// Pull-side refresh of an order already linked to an invoice.
    async fn refresh_from_quickbooks(
        &self,
        id: &str,
        valor_total: f64,
        synced_at: DateTime<Utc>,
    ) -> Result<()>;
}

#[async_trait]
pub trait EntregaRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Entrega>>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Entrega>>;

    async fn create(&self, entrega: NewEntrega) -> Result<Entrega>;

    async fn update(&self, id: &str, update: EntregaUpdate) -> Result<Entrega>;
}

#[async_trait]
pub trait MotoristaRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Motorista>>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Motorista>>;

    async fn create(&self, input: MotoristaInput) -> Result<Motorista>;

    async fn update(&self, id: &str, input: MotoristaInput) -> Result<Motorista>;

    async fn delete(&self, id: &str) -> Result<()>;
}

#[async_trait]
pub trait VeiculoRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Veiculo>>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Veiculo>>;

    async fn create(&self, input: VeiculoInput) -> Result<Veiculo>;

    async fn update(&self, id: &str, input: VeiculoInput) -> Result<Veiculo>;

    async fn delete(&self, id: &str) -> Result<()>;
}

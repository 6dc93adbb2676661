//! Local CRUD with input validation and reference checks.

use std::sync::Arc;

use backoffice_domain::{
    BackofficeError, Cliente, ClienteInput, Entrega, EntregaInput, EntregaUpdate, Motorista,
    MotoristaInput, Pedido, PedidoInput, PedidoUpdate, Produto, ProdutoInput, Result, Veiculo,
    VeiculoInput,
};
use tracing::instrument;

use super::ports::{
    ClienteRepository, EntregaRepository, MotoristaRepository, PedidoRepository,
    ProdutoRepository, VeiculoRepository,
};

/// Every repository the back office reads and writes.
#[derive(Clone)]
pub struct LocalStore {
    pub clientes: Arc<dyn ClienteRepository>,
    pub produtos: Arc<dyn ProdutoRepository>,
    pub pedidos: Arc<dyn PedidoRepository>,
    pub entregas: Arc<dyn EntregaRepository>,
    pub motoristas: Arc<dyn MotoristaRepository>,
    pub veiculos: Arc<dyn VeiculoRepository>,
}

/// Validation runs before any write; a reference to a missing record is an
/// integrity error.
pub struct RecordService {
    store: LocalStore,
}

impl RecordService {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    // Clientes -------------------------------------------------------------

    pub async fn list_clientes(&self) -> Result<Vec<Cliente>> {
        self.store.clientes.list().await
    }

    pub async fn get_cliente(&self, id: &str) -> Result<Cliente> {
        self.store.clientes.find_by_id(id).await?.ok_or_else(|| not_found("cliente", id))
    }

    #[instrument(skip(self, input))]
    pub async fn create_cliente(&self, input: ClienteInput) -> Result<Cliente> {
        input.validate()?;
        self.store.clientes.create(input).await
    }

    #[instrument(skip(self, input))]
    pub async fn update_cliente(&self, id: &str, input: ClienteInput) -> Result<Cliente> {
        input.validate()?;
        self.store.clientes.update(id, input).await
    }

    pub async fn delete_cliente(&self, id: &str) -> Result<()> {
        self.store.clientes.delete(id).await
    }

    // Produtos -------------------------------------------------------------

    pub async fn list_produtos(&self) -> Result<Vec<Produto>> {
        self.store.produtos.list().await
    }

    pub async fn get_produto(&self, id: &str) -> Result<Produto> {
        self.store.produtos.find_by_id(id).await?.ok_or_else(|| not_found("produto", id))
    }

    pub async fn create_produto(&self, input: ProdutoInput) -> Result<Produto> {
        input.validate()?;
        self.store.produtos.create(input).await
    }

    pub async fn update_produto(&self, id: &str, input: ProdutoInput) -> Result<Produto> {
        input.validate()?;
        self.store.produtos.update(id, input).await
    }

    pub async fn delete_produto(&self, id: &str) -> Result<()> {
        self.store.produtos.delete(id).await
    }

    // Pedidos --------------------------------------------------------------

    pub async fn list_pedidos(&self) -> Result<Vec<Pedido>> {
        self.store.pedidos.list().await
    }

    pub async fn get_pedido(&self, id: &str) -> Result<Pedido> {
        self.store.pedidos.find_by_id(id).await?.ok_or_else(|| not_found("pedido", id))
    }

    #[instrument(skip(self, input))]
    pub async fn create_pedido(&self, input: PedidoInput) -> Result<Pedido> {
        input.validate()?;
        if self.store.clientes.find_by_id(&input.cliente_id).await?.is_none() {
            return Err(missing_reference("cliente", &input.cliente_id));
        }
        for produto_id in input.itens.iter().filter_map(|item| item.produto_id.as_deref()) {
            if self.store.produtos.find_by_id(produto_id).await?.is_none() {
                return Err(missing_reference("produto", produto_id));
            }
        }
        self.store.pedidos.create(input.into_new_pedido()).await
    }

    pub async fn update_pedido(&self, id: &str, update: PedidoUpdate) -> Result<Pedido> {
        self.store.pedidos.update(id, update).await
    }

    // Entregas -------------------------------------------------------------

    pub async fn list_entregas(&self) -> Result<Vec<Entrega>> {
        self.store.entregas.list().await
    }

    pub async fn get_entrega(&self, id: &str) -> Result<Entrega> {
        self.store.entregas.find_by_id(id).await?.ok_or_else(|| not_found("entrega", id))
    }

    #[instrument(skip(self, input))]
    pub async fn create_entrega(&self, input: EntregaInput) -> Result<Entrega> {
        input.validate()?;
        if self.store.pedidos.find_by_id(&input.pedido_id).await?.is_none() {
            return Err(missing_reference("pedido", &input.pedido_id));
        }
        self.check_fleet(input.motorista_id.as_deref(), input.veiculo_id.as_deref()).await?;
        self.store.entregas.create(input.into_new_entrega()).await
    }

    pub async fn update_entrega(&self, id: &str, update: EntregaUpdate) -> Result<Entrega> {
        self.check_fleet(update.motorista_id.as_deref(), update.veiculo_id.as_deref()).await?;
        self.store.entregas.update(id, update).await
    }

    // Frota ----------------------------------------------------------------

    pub async fn list_motoristas(&self) -> Result<Vec<Motorista>> {
        self.store.motoristas.list().await
    }

    pub async fn get_motorista(&self, id: &str) -> Result<Motorista> {
        self.store.motoristas.find_by_id(id).await?.ok_or_else(|| not_found("motorista", id))
    }

    pub async fn create_motorista(&self, input: MotoristaInput) -> Result<Motorista> {
        input.validate()?;
        self.store.motoristas.create(input).await
    }

    pub async fn update_motorista(&self, id: &str, input: MotoristaInput) -> Result<Motorista> {
        input.validate()?;
        self.store.motoristas.update(id, input).await
    }

    pub async fn delete_motorista(&self, id: &str) -> Result<()> {
        self.store.motoristas.delete(id).await
    }

    pub async fn list_veiculos(&self) -> Result<Vec<Veiculo>> {
        self.store.veiculos.list().await
    }

    pub async fn get_veiculo(&self, id: &str) -> Result<Veiculo> {
        self.store.veiculos.find_by_id(id).await?.ok_or_else(|| not_found("veiculo", id))
    }

    pub async fn create_veiculo(&self, input: VeiculoInput) -> Result<Veiculo> {
        input.validate()?;
        self.store.veiculos.create(input).await
    }

    pub async fn update_veiculo(&self, id: &str, input: VeiculoInput) -> Result<Veiculo> {
        input.validate()?;
        self.store.veiculos.update(id, input).await
    }

    pub async fn delete_veiculo(&self, id: &str) -> Result<()> {
        self.store.veiculos.delete(id).await
    }

    async fn check_fleet(
        &self,
        motorista_id: Option<&str>,
        veiculo_id: Option<&str>,
    ) -> Result<()> {
        if let Some(id) = motorista_id {
            if self.store.motoristas.find_by_id(id).await?.is_none() {
                return Err(missing_reference("motorista", id));
            }
        }
        if let Some(id) = veiculo_id {
            if self.store.veiculos.find_by_id(id).await?.is_none() {
                return Err(missing_reference("veiculo", id));
            }
        }
        Ok(())
    }
}

pub(crate) fn not_found(kind: &str, id: &str) -> BackofficeError {
    BackofficeError::NotFound(format!("{kind} {id} not found"))
}

pub(crate) fn missing_reference(kind: &str, id: &str) -> BackofficeError {
    BackofficeError::Integrity(format!("{kind} {id} does not exist"))
}

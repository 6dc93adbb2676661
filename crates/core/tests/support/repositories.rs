//! In-memory implementations of the storage ports.
//!
//! Behaviour mirrors the SQLite adapters closely enough for service tests:
//! upserts key on `quickbooks_id`, order numbers are highest + 1 padded to
//! six digits, and missing rows are `NotFound`.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use backoffice_core::{
    ClienteRepository, ConnectionRepository, EntregaRepository, LocalStore, MotoristaRepository,
    PedidoRepository, ProdutoRepository, SyncLogRepository, VeiculoRepository,
};
use backoffice_domain::{
    BackofficeError, Cliente, ClienteInput, Entrega, EntregaStatus, EntregaUpdate, ExternalRef,
    Motorista, MotoristaInput, NewEntrega, NewPedido, Pedido, PedidoItem, PedidoUpdate, Produto,
    ProdutoInput, QuickBooksConnection, Result, SyncLogEntry, SyncLogFilter, SyncLogStatus,
    SyncStatus, UpsertOutcome, Veiculo, VeiculoInput,
};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

static NEXT_ID: AtomicUsize = AtomicUsize::new(1);

fn next_id(prefix: &str) -> String {
    format!("{prefix}-{}", NEXT_ID.fetch_add(1, Ordering::Relaxed))
}

fn missing(kind: &str, id: &str) -> BackofficeError {
    BackofficeError::NotFound(format!("{kind} {id} not found"))
}

// Clientes ------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryClientes {
    rows: Mutex<Vec<Cliente>>,
}

impl InMemoryClientes {
    pub fn all(&self) -> Vec<Cliente> {
        self.rows.lock().clone()
    }

    pub fn insert(&self, cliente: Cliente) {
        self.rows.lock().push(cliente);
    }
}

pub fn cliente(id: &str, nome: &str, quickbooks_id: Option<&str>) -> Cliente {
    Cliente {
        id: id.to_string(),
        nome: nome.to_string(),
        documento: format!("DOC-{id}"),
        email: None,
        telefone: None,
        endereco: Some("Rua A, 10".into()),
        cidade: Some("Recife".into()),
        estado: Some("PE".into()),
        cep: None,
        external: ExternalRef {
            quickbooks_id: quickbooks_id.map(ToOwned::to_owned),
            sync_status: if quickbooks_id.is_some() {
                SyncStatus::Synced
            } else {
                SyncStatus::Pending
            },
            synced_at: None,
        },
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn apply_cliente(row: &mut Cliente, input: ClienteInput) {
    row.nome = input.nome;
    row.email = input.email;
    row.telefone = input.telefone;
    row.endereco = input.endereco;
    row.cidade = input.cidade;
    row.estado = input.estado;
    row.cep = input.cep;
    row.updated_at = Utc::now();
}

#[async_trait]
impl ClienteRepository for InMemoryClientes {
    async fn list(&self) -> Result<Vec<Cliente>> {
        Ok(self.all())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Cliente>> {
        Ok(self.rows.lock().iter().find(|c| c.id == id).cloned())
    }

    async fn find_by_quickbooks_id(&self, quickbooks_id: &str) -> Result<Option<Cliente>> {
        Ok(self
            .rows
            .lock()
            .iter()
            .find(|c| c.external.quickbooks_id.as_deref() == Some(quickbooks_id))
            .cloned())
    }

    async fn create(&self, input: ClienteInput) -> Result<Cliente> {
        let mut row = cliente(&next_id("cli"), &input.nome, None);
        row.documento = input.documento.clone();
        apply_cliente(&mut row, input);
        self.rows.lock().push(row.clone());
        Ok(row)
    }

    async fn update(&self, id: &str, input: ClienteInput) -> Result<Cliente> {
        let mut rows = self.rows.lock();
        let row = rows.iter_mut().find(|c| c.id == id).ok_or_else(|| missing("cliente", id))?;
        row.documento = input.documento.clone();
        apply_cliente(row, input);
        Ok(row.clone())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut rows = self.rows.lock();
        let before = rows.len();
        rows.retain(|c| c.id != id);
        if rows.len() == before {
            return Err(missing("cliente", id));
        }
        Ok(())
    }

    async fn upsert_by_quickbooks_id(
        &self,
        quickbooks_id: &str,
        input: ClienteInput,
        synced_at: DateTime<Utc>,
    ) -> Result<UpsertOutcome> {
        let mut rows = self.rows.lock();
        if let Some(row) =
            rows.iter_mut().find(|c| c.external.quickbooks_id.as_deref() == Some(quickbooks_id))
        {
            apply_cliente(row, input);
            row.external = ExternalRef::synced(quickbooks_id, synced_at);
            return Ok(UpsertOutcome::Updated(row.id.clone()));
        }
        let mut row = cliente(&next_id("cli"), &input.nome, Some(quickbooks_id));
        row.documento = input.documento.clone();
        apply_cliente(&mut row, input);
        row.external = ExternalRef::synced(quickbooks_id, synced_at);
        let id = row.id.clone();
        rows.push(row);
        Ok(UpsertOutcome::Created(id))
    }

    async fn mark_synced(&self, id: &str, quickbooks_id: &str, at: DateTime<Utc>) -> Result<()> {
        let mut rows = self.rows.lock();
        let row = rows.iter_mut().find(|c| c.id == id).ok_or_else(|| missing("cliente", id))?;
        row.external = ExternalRef::synced(quickbooks_id, at);
        Ok(())
    }

    async fn mark_sync_error(&self, id: &str) -> Result<()> {
        let mut rows = self.rows.lock();
        let row = rows.iter_mut().find(|c| c.id == id).ok_or_else(|| missing("cliente", id))?;
        row.external.sync_status = SyncStatus::Error;
        Ok(())
    }
}

// Produtos ------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryProdutos {
    rows: Mutex<Vec<Produto>>,
}

impl InMemoryProdutos {
    pub fn all(&self) -> Vec<Produto> {
        self.rows.lock().clone()
    }
}

fn produto_row(id: String, input: ProdutoInput, external: ExternalRef) -> Produto {
    Produto {
        id,
        codigo: input.codigo,
        nome: input.nome,
        descricao: input.descricao,
        preco: input.preco,
        unidade: input.unidade,
        ativo: input.ativo,
        external,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[async_trait]
impl ProdutoRepository for InMemoryProdutos {
    async fn list(&self) -> Result<Vec<Produto>> {
        Ok(self.all())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Produto>> {
        Ok(self.rows.lock().iter().find(|p| p.id == id).cloned())
    }

    async fn find_by_quickbooks_id(&self, quickbooks_id: &str) -> Result<Option<Produto>> {
        Ok(self
            .rows
            .lock()
            .iter()
            .find(|p| p.external.quickbooks_id.as_deref() == Some(quickbooks_id))
            .cloned())
    }

    async fn create(&self, input: ProdutoInput) -> Result<Produto> {
        let row = produto_row(next_id("prod"), input, ExternalRef::default());
        self.rows.lock().push(row.clone());
        Ok(row)
    }

    async fn update(&self, id: &str, input: ProdutoInput) -> Result<Produto> {
        let mut rows = self.rows.lock();
        let row = rows.iter_mut().find(|p| p.id == id).ok_or_else(|| missing("produto", id))?;
        *row = produto_row(row.id.clone(), input, row.external.clone());
        Ok(row.clone())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.rows.lock().retain(|p| p.id != id);
        Ok(())
    }

    async fn upsert_by_quickbooks_id(
        &self,
        quickbooks_id: &str,
        input: ProdutoInput,
        synced_at: DateTime<Utc>,
    ) -> Result<UpsertOutcome> {
        let mut rows = self.rows.lock();
        let external = ExternalRef::synced(quickbooks_id, synced_at);
        if let Some(row) =
            rows.iter_mut().find(|p| p.external.quickbooks_id.as_deref() == Some(quickbooks_id))
        {
            let codigo = row.codigo.clone();
            *row = produto_row(row.id.clone(), ProdutoInput { codigo, ..input }, external);
            return Ok(UpsertOutcome::Updated(row.id.clone()));
        }
        let row = produto_row(next_id("prod"), input, external);
        let id = row.id.clone();
        rows.push(row);
        Ok(UpsertOutcome::Created(id))
    }
}

// Pedidos -------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryPedidos {
    rows: Mutex<Vec<Pedido>>,
}

impl InMemoryPedidos {
    pub fn all(&self) -> Vec<Pedido> {
        self.rows.lock().clone()
    }

    pub fn seed_numero(&self, numero: &str) {
        let pedido = pedido_row(
            next_id("ped"),
            numero.to_string(),
            NewPedido {
                cliente_id: "seed".into(),
                status: Default::default(),
                observacoes: None,
                estimate_id: None,
                external: ExternalRef::default(),
                itens: Vec::new(),
                valor_total: Some(0.0),
            },
        );
        self.rows.lock().push(pedido);
    }
}

fn pedido_row(id: String, numero: String, new: NewPedido) -> Pedido {
    let valor_total = new.total();
    let itens = new
        .itens
        .into_iter()
        .enumerate()
        .map(|(posicao, item)| PedidoItem {
            id: format!("{id}-item-{posicao}"),
            pedido_id: id.clone(),
            produto_id: item.produto_id,
            descricao: item.descricao,
            quantidade: item.quantidade,
            preco_unitario: item.preco_unitario,
            posicao: posicao as u32,
        })
        .collect();
    Pedido {
        id,
        numero,
        cliente_id: new.cliente_id,
        status: new.status,
        valor_total,
        observacoes: new.observacoes,
        estimate_id: new.estimate_id,
        external: new.external,
        itens,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[async_trait]
impl PedidoRepository for InMemoryPedidos {
    async fn list(&self) -> Result<Vec<Pedido>> {
        Ok(self.all())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Pedido>> {
        Ok(self.rows.lock().iter().find(|p| p.id == id).cloned())
    }

    async fn find_by_quickbooks_id(&self, quickbooks_id: &str) -> Result<Option<Pedido>> {
        Ok(self
            .rows
            .lock()
            .iter()
            .find(|p| p.external.quickbooks_id.as_deref() == Some(quickbooks_id))
            .cloned())
    }

    async fn create(&self, pedido: NewPedido) -> Result<Pedido> {
        let mut rows = self.rows.lock();
        let highest = rows.iter().filter_map(|p| p.numero.parse::<u64>().ok()).max().unwrap_or(0);
        let row = pedido_row(next_id("ped"), format!("{:06}", highest + 1), pedido);
        rows.push(row.clone());
        Ok(row)
    }

    async fn update(&self, id: &str, update: PedidoUpdate) -> Result<Pedido> {
        let mut rows = self.rows.lock();
        let row = rows.iter_mut().find(|p| p.id == id).ok_or_else(|| missing("pedido", id))?;
        if let Some(status) = update.status {
            row.status = status;
        }
        if update.observacoes.is_some() {
            row.observacoes = update.observacoes;
        }
        Ok(row.clone())
    }

    async fn refresh_from_quickbooks(
        &self,
        id: &str,
        valor_total: f64,
        synced_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut rows = self.rows.lock();
        let row = rows.iter_mut().find(|p| p.id == id).ok_or_else(|| missing("pedido", id))?;
        row.valor_total = valor_total;
        row.external.sync_status = SyncStatus::Synced;
        row.external.synced_at = Some(synced_at);
        Ok(())
    }
}

// Entregas ------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryEntregas {
    rows: Mutex<Vec<Entrega>>,
}

impl InMemoryEntregas {
    pub fn all(&self) -> Vec<Entrega> {
        self.rows.lock().clone()
    }
}

#[async_trait]
impl EntregaRepository for InMemoryEntregas {
    async fn list(&self) -> Result<Vec<Entrega>> {
        Ok(self.all())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Entrega>> {
        Ok(self.rows.lock().iter().find(|e| e.id == id).cloned())
    }

    async fn create(&self, entrega: NewEntrega) -> Result<Entrega> {
        let row = Entrega {
            id: next_id("ent"),
            pedido_id: entrega.pedido_id,
            motorista_id: entrega.motorista_id,
            veiculo_id: entrega.veiculo_id,
            data_entrega: entrega.data_entrega,
            endereco_entrega: entrega.endereco_entrega,
            status: EntregaStatus::Agendada,
            observacoes: entrega.observacoes,
            estimate_id: entrega.estimate_id,
            invoice_id: entrega.invoice_id,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.rows.lock().push(row.clone());
        Ok(row)
    }

    async fn update(&self, id: &str, update: EntregaUpdate) -> Result<Entrega> {
        let mut rows = self.rows.lock();
        let row = rows.iter_mut().find(|e| e.id == id).ok_or_else(|| missing("entrega", id))?;
        if let Some(status) = update.status {
            row.status = status;
        }
        if update.motorista_id.is_some() {
            row.motorista_id = update.motorista_id;
        }
        if update.veiculo_id.is_some() {
            row.veiculo_id = update.veiculo_id;
        }
        if let Some(data) = update.data_entrega {
            row.data_entrega = data;
        }
        Ok(row.clone())
    }
}

// Frota ---------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryMotoristas {
    rows: Mutex<Vec<Motorista>>,
}

impl InMemoryMotoristas {
    pub fn seed(&self, id: &str, nome: &str) {
        self.rows.lock().push(Motorista {
            id: id.to_string(),
            nome: nome.to_string(),
            cpf: None,
            cnh: None,
            telefone: None,
            ativo: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        });
    }
}

#[async_trait]
impl MotoristaRepository for InMemoryMotoristas {
    async fn list(&self) -> Result<Vec<Motorista>> {
        Ok(self.rows.lock().clone())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Motorista>> {
        Ok(self.rows.lock().iter().find(|m| m.id == id).cloned())
    }

    async fn create(&self, input: MotoristaInput) -> Result<Motorista> {
        let id = next_id("mot");
        self.seed(&id, &input.nome);
        self.find_by_id(&id).await?.ok_or_else(|| missing("motorista", &id))
    }

    async fn update(&self, id: &str, input: MotoristaInput) -> Result<Motorista> {
        let mut rows = self.rows.lock();
        let row = rows.iter_mut().find(|m| m.id == id).ok_or_else(|| missing("motorista", id))?;
        row.nome = input.nome;
        row.ativo = input.ativo;
        Ok(row.clone())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.rows.lock().retain(|m| m.id != id);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryVeiculos {
    rows: Mutex<Vec<Veiculo>>,
}

impl InMemoryVeiculos {
    pub fn seed(&self, id: &str, placa: &str) {
        self.rows.lock().push(Veiculo {
            id: id.to_string(),
            placa: placa.to_string(),
            modelo: None,
            capacidade_kg: None,
            ativo: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        });
    }
}

#[async_trait]
impl VeiculoRepository for InMemoryVeiculos {
    async fn list(&self) -> Result<Vec<Veiculo>> {
        Ok(self.rows.lock().clone())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Veiculo>> {
        Ok(self.rows.lock().iter().find(|v| v.id == id).cloned())
    }

    async fn create(&self, input: VeiculoInput) -> Result<Veiculo> {
        let id = next_id("vei");
        self.seed(&id, &input.placa);
        self.find_by_id(&id).await?.ok_or_else(|| missing("veiculo", &id))
    }

    async fn update(&self, id: &str, input: VeiculoInput) -> Result<Veiculo> {
        let mut rows = self.rows.lock();
        let row = rows.iter_mut().find(|v| v.id == id).ok_or_else(|| missing("veiculo", id))?;
        row.placa = input.placa;
        row.ativo = input.ativo;
        Ok(row.clone())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.rows.lock().retain(|v| v.id != id);
        Ok(())
    }
}

// Connection and sync log ---------------------------------------------------

#[derive(Default)]
pub struct InMemoryConnections {
    rows: Mutex<Vec<QuickBooksConnection>>,
    saves: AtomicUsize,
}

impl InMemoryConnections {
    pub fn with(connection: QuickBooksConnection) -> Self {
        let repo = Self::default();
        repo.rows.lock().push(connection);
        repo
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn get(&self, realm_id: &str) -> Option<QuickBooksConnection> {
        self.rows.lock().iter().find(|c| c.realm_id == realm_id).cloned()
    }
}

#[async_trait]
impl ConnectionRepository for InMemoryConnections {
    async fn find_active(&self) -> Result<Option<QuickBooksConnection>> {
        Ok(self.rows.lock().iter().find(|c| c.is_active).cloned())
    }

    async fn find_by_realm(&self, realm_id: &str) -> Result<Option<QuickBooksConnection>> {
        Ok(self.get(realm_id))
    }

    async fn save(&self, connection: &QuickBooksConnection) -> Result<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.rows.lock();
        if connection.is_active {
            rows.iter_mut().for_each(|c| c.is_active = false);
        }
        rows.retain(|c| c.realm_id != connection.realm_id);
        rows.push(connection.clone());
        Ok(())
    }

    async fn deactivate(&self, realm_id: &str) -> Result<()> {
        let mut rows = self.rows.lock();
        if let Some(row) = rows.iter_mut().find(|c| c.realm_id == realm_id) {
            row.is_active = false;
            row.access_token.clear();
            row.refresh_token.clear();
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemorySyncLog {
    entries: Mutex<Vec<SyncLogEntry>>,
    fail_appends: AtomicBool,
}

impl InMemorySyncLog {
    pub fn entries(&self) -> Vec<SyncLogEntry> {
        self.entries.lock().clone()
    }

    pub fn errors(&self) -> Vec<SyncLogEntry> {
        self.entries().into_iter().filter(|e| e.status == SyncLogStatus::Error).collect()
    }

    /// Make every later append fail.
    pub fn break_appends(&self) {
        self.fail_appends.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl SyncLogRepository for InMemorySyncLog {
    async fn append(&self, entry: &SyncLogEntry) -> Result<()> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(BackofficeError::Database("sync_logs is read-only".into()));
        }
        self.entries.lock().push(entry.clone());
        Ok(())
    }

    async fn list(&self, filter: &SyncLogFilter) -> Result<Vec<SyncLogEntry>> {
        let mut entries: Vec<SyncLogEntry> = self
            .entries()
            .into_iter()
            .rev()
            .filter(|e| filter.entity_type.as_ref().map_or(true, |t| &e.entity_type == t))
            .filter(|e| filter.status.map_or(true, |s| e.status == s))
            .collect();
        entries.truncate(filter.effective_limit() as usize);
        Ok(entries)
    }
}

/// Every in-memory repository, plus the [`LocalStore`] view over them.
#[derive(Clone)]
pub struct MemoryStore {
    pub clientes: Arc<InMemoryClientes>,
    pub produtos: Arc<InMemoryProdutos>,
    pub pedidos: Arc<InMemoryPedidos>,
    pub entregas: Arc<InMemoryEntregas>,
    pub motoristas: Arc<InMemoryMotoristas>,
    pub veiculos: Arc<InMemoryVeiculos>,
    pub sync_log: Arc<InMemorySyncLog>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            clientes: Arc::default(),
            produtos: Arc::default(),
            pedidos: Arc::default(),
            entregas: Arc::default(),
            motoristas: Arc::default(),
            veiculos: Arc::default(),
            sync_log: Arc::default(),
        }
    }

    pub fn local_store(&self) -> LocalStore {
        LocalStore {
            clientes: self.clientes.clone(),
            produtos: self.produtos.clone(),
            pedidos: self.pedidos.clone(),
            entregas: self.entregas.clone(),
            motoristas: self.motoristas.clone(),
            veiculos: self.veiculos.clone(),
        }
    }
}

//! Entity sync manager: pull QuickBooks records into the local store.

use std::sync::Arc;

use backoffice_common::time::Clock;
use backoffice_domain::constants::SYNC_SUMMARY_RECORD_LIMIT;
use backoffice_domain::quickbooks::{Customer, Invoice, Item};
use backoffice_domain::{
    BackofficeError, Cliente, ExternalRef, NewPedido, PedidoStatus, Result, SyncAction,
    SyncAllSummary, SyncBatchOutcome, SyncEntity, SyncFailure, SyncLogEntry, SyncSummary,
    UpsertOutcome,
};
use serde_json::json;
use tracing::{info, instrument, warn};

use super::journal::SyncJournal;
use super::mapping::{
    cliente_from_customer, customer_from_cliente, produto_from_item, require_id,
    resolve_order_items,
};
use crate::quickbooks::QuickBooksGateway;
use crate::records::service::not_found;
use crate::records::{ClienteRepository, LocalStore, PedidoRepository, ProdutoRepository};

/// Reconciles clientes, produtos and pedidos with QuickBooks customers,
/// items and invoices.
///
/// Each batch fetches one page (up to 1000 records) and upserts by
/// `quickbooksId` in the order QuickBooks returned them. A record that fails
/// is logged and skipped; the batch carries on.
pub struct SyncManager {
    gateway: Arc<QuickBooksGateway>,
    clientes: Arc<dyn ClienteRepository>,
    produtos: Arc<dyn ProdutoRepository>,
    pedidos: Arc<dyn PedidoRepository>,
    journal: SyncJournal,
    clock: Arc<dyn Clock>,
}

impl SyncManager {
    pub fn new(
        gateway: Arc<QuickBooksGateway>,
        store: &LocalStore,
        journal: SyncJournal,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            gateway,
            clientes: Arc::clone(&store.clientes),
            produtos: Arc::clone(&store.produtos),
            pedidos: Arc::clone(&store.pedidos),
            journal,
            clock,
        }
    }

    pub async fn sync_entity(&self, entity: SyncEntity, id: Option<&str>) -> Result<SyncSummary> {
        match entity {
            SyncEntity::Clientes => self.sync_clientes(id).await,
            SyncEntity::Produtos => self.sync_produtos(id).await,
            SyncEntity::Pedidos => self.sync_pedidos(id).await,
        }
    }

    #[instrument(skip(self))]
    pub async fn sync_clientes(&self, id: Option<&str>) -> Result<SyncSummary> {
        let customers = self.fetch(SyncEntity::Clientes, self.gateway.customers(id).await).await?;
        let mut tally = BatchTally::new(SyncEntity::Clientes, customers.len());
        for customer in &customers {
            let result = self.upsert_customer(customer).await;
            self.settle(&mut tally, customer.id.clone(), result).await;
        }
        Ok(self.finish(tally).await)
    }

    #[instrument(skip(self))]
    pub async fn sync_produtos(&self, id: Option<&str>) -> Result<SyncSummary> {
        let items = self.fetch(SyncEntity::Produtos, self.gateway.items(id).await).await?;
        let mut tally = BatchTally::new(SyncEntity::Produtos, items.len());
        for item in &items {
            let result = self.upsert_item(item).await;
            self.settle(&mut tally, item.id.clone(), result).await;
        }
        Ok(self.finish(tally).await)
    }

    #[instrument(skip(self))]
    pub async fn sync_pedidos(&self, id: Option<&str>) -> Result<SyncSummary> {
        let invoices = self.fetch(SyncEntity::Pedidos, self.gateway.invoices(id).await).await?;
        let mut tally = BatchTally::new(SyncEntity::Pedidos, invoices.len());
        for invoice in &invoices {
            let result = self.upsert_invoice(invoice).await;
            self.settle(&mut tally, invoice.id.clone(), result).await;
        }
        Ok(self.finish(tally).await)
    }

    /// Clientes, produtos, pedidos in that order. Not atomic: a failed entity
    /// is reported in its slot and the next one still runs.
    #[instrument(skip(self))]
    pub async fn sync_all(&self) -> SyncAllSummary {
        let mut results = Vec::with_capacity(SyncEntity::ALL.len());
        for entity in SyncEntity::ALL {
            let outcome = match self.sync_entity(entity, None).await {
                Ok(summary) => SyncBatchOutcome::Completed(summary),
                Err(err) => {
                    SyncBatchOutcome::Failed { entity_type: entity, error: err.to_string() }
                }
            };
            results.push(outcome);
        }
        SyncAllSummary { results }
    }

    /// Push one local cliente to QuickBooks (create, or sparse update of the
    /// linked customer). The local row is never rolled back; a failure only
    /// flips its sync status to `error`.
    #[instrument(skip(self))]
    pub async fn push_cliente(&self, id: &str) -> Result<Cliente> {
        let cliente = self
            .clientes
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found("cliente", id))?;
        let action = match cliente.external.quickbooks_id {
            Some(_) => SyncAction::Update,
            None => SyncAction::Create,
        };

        match self.push_customer(&cliente).await {
            Ok(quickbooks_id) => {
                let now = self.clock.now();
                self.clientes.mark_synced(id, &quickbooks_id, now).await?;
                self.journal
                    .record(
                        SyncLogEntry::success(SyncEntity::Clientes.to_string(), action, now)
                            .with_entity_id(id)
                            .with_quickbooks_id(&quickbooks_id),
                    )
                    .await;
                info!(cliente_id = %id, quickbooks_id = %quickbooks_id, "Cliente pushed");
                self.clientes
                    .find_by_id(id)
                    .await?
                    .ok_or_else(|| not_found("cliente", id))
            }
            Err(err) => {
                if let Err(mark_err) = self.clientes.mark_sync_error(id).await {
                    warn!(cliente_id = %id, error = %mark_err, "Failed to flag cliente sync error");
                }
                let mut entry = SyncLogEntry::error(
                    SyncEntity::Clientes.to_string(),
                    action,
                    err.to_string(),
                    self.clock.now(),
                )
                .with_entity_id(id);
                if let Some(quickbooks_id) = &cliente.external.quickbooks_id {
                    entry = entry.with_quickbooks_id(quickbooks_id);
                }
                self.journal.record(entry).await;
                Err(err)
            }
        }
    }

    async fn push_customer(&self, cliente: &Cliente) -> Result<String> {
        let mut body = customer_from_cliente(cliente);
        let saved = match &cliente.external.quickbooks_id {
            Some(quickbooks_id) => {
                let current = self.gateway.get_customer(quickbooks_id).await?;
                body.id = Some(quickbooks_id.clone());
                body.sync_token = current.sync_token;
                body.sparse = Some(true);
                self.gateway.update_customer(&body).await?
            }
            None => self.gateway.create_customer(&body).await?,
        };
        require_id(saved.id.as_ref()).map(str::to_string)
    }

    async fn upsert_customer(&self, customer: &Customer) -> Result<UpsertOutcome> {
        let quickbooks_id = require_id(customer.id.as_ref())?;
        let input = cliente_from_customer(customer, quickbooks_id)?;
        self.clientes.upsert_by_quickbooks_id(quickbooks_id, input, self.clock.now()).await
    }

    async fn upsert_item(&self, item: &Item) -> Result<UpsertOutcome> {
        let quickbooks_id = require_id(item.id.as_ref())?;
        let input = produto_from_item(item, quickbooks_id)?;
        self.produtos.upsert_by_quickbooks_id(quickbooks_id, input, self.clock.now()).await
    }

    async fn upsert_invoice(&self, invoice: &Invoice) -> Result<UpsertOutcome> {
        let quickbooks_id = require_id(invoice.id.as_ref())?;
        let now = self.clock.now();

        if let Some(existing) = self.pedidos.find_by_quickbooks_id(quickbooks_id).await? {
            let total = invoice.total_amt.unwrap_or(existing.valor_total);
            self.pedidos.refresh_from_quickbooks(&existing.id, total, now).await?;
            return Ok(UpsertOutcome::Updated(existing.id));
        }

        let customer_ref = invoice.customer_ref.as_ref().ok_or_else(|| {
            BackofficeError::Validation(format!("invoice {quickbooks_id} has no CustomerRef"))
        })?;
        let cliente = self.clientes.find_by_quickbooks_id(&customer_ref.value).await?.ok_or_else(
            || {
                BackofficeError::Integrity(format!(
                    "customer {} is not synced locally",
                    customer_ref.value
                ))
            },
        )?;
        let estimate_id = invoice
            .linked_txn
            .iter()
            .find(|txn| txn.txn_type == "Estimate")
            .map(|txn| txn.txn_id.clone());

        let pedido = self
            .pedidos
            .create(NewPedido {
                cliente_id: cliente.id,
                status: PedidoStatus::Confirmado,
                observacoes: invoice.private_note.clone(),
                estimate_id,
                external: ExternalRef::synced(quickbooks_id, now),
                itens: resolve_order_items(self.produtos.as_ref(), &invoice.line).await?,
                valor_total: invoice.total_amt,
            })
            .await?;
        Ok(UpsertOutcome::Created(pedido.id))
    }

    async fn fetch<T>(&self, entity: SyncEntity, fetched: Result<Vec<T>>) -> Result<Vec<T>> {
        match fetched {
            Ok(records) => Ok(records),
            Err(err) => {
                self.journal
                    .record(SyncLogEntry::error(
                        entity.to_string(),
                        SyncAction::Sync,
                        err.to_string(),
                        self.clock.now(),
                    ))
                    .await;
                Err(err)
            }
        }
    }

    async fn settle(
        &self,
        tally: &mut BatchTally,
        quickbooks_id: Option<String>,
        result: Result<UpsertOutcome>,
    ) {
        match result {
            Ok(outcome) => tally.succeeded(quickbooks_id, &outcome),
            Err(err) => {
                let mut entry = SyncLogEntry::error(
                    tally.summary.entity_type.to_string(),
                    SyncAction::Sync,
                    err.to_string(),
                    self.clock.now(),
                );
                if let Some(id) = &quickbooks_id {
                    entry = entry.with_quickbooks_id(id);
                }
                self.journal.record(entry).await;
                tally.failed(quickbooks_id, err.to_string());
            }
        }
    }

    async fn finish(&self, tally: BatchTally) -> SyncSummary {
        let summary = tally.into_summary();
        self.journal
            .record(
                SyncLogEntry::success(
                    summary.entity_type.to_string(),
                    SyncAction::Sync,
                    self.clock.now(),
                )
                .with_details(json!({
                    "total": summary.total,
                    "created": summary.created,
                    "updated": summary.updated,
                    "failed": summary.failed,
                })),
            )
            .await;
        info!(
            entity_type = %summary.entity_type,
            total = summary.total,
            created = summary.created,
            updated = summary.updated,
            failed = summary.failed,
            "Sync batch finished"
        );
        summary
    }
}

struct BatchTally {
    summary: SyncSummary,
    seen: Vec<String>,
}

impl BatchTally {
    fn new(entity: SyncEntity, total: usize) -> Self {
        let mut summary = SyncSummary::empty(entity);
        summary.total = total;
        Self { summary, seen: Vec::with_capacity(total) }
    }

    fn succeeded(&mut self, quickbooks_id: Option<String>, outcome: &UpsertOutcome) {
        match outcome {
            UpsertOutcome::Created(_) => self.summary.created += 1,
            UpsertOutcome::Updated(_) => self.summary.updated += 1,
        }
        self.summary.synced += 1;
        self.seen.extend(quickbooks_id);
    }

    fn failed(&mut self, quickbooks_id: Option<String>, message: String) {
        self.summary.failed += 1;
        self.summary.errors.push(SyncFailure { quickbooks_id: quickbooks_id.clone(), message });
        self.seen.extend(quickbooks_id);
    }

    fn into_summary(mut self) -> SyncSummary {
        if self.summary.total <= SYNC_SUMMARY_RECORD_LIMIT {
            self.summary.records = Some(self.seen);
        }
        self.summary
    }
}

//! Estimate operations and the estimate → invoice conversion.

use std::sync::Arc;

use backoffice_common::time::Clock;
use backoffice_domain::quickbooks::{Estimate, EstimateStatus, Invoice, Line, LinkedTxn};
use backoffice_domain::{
    validate_email, BackofficeError, Cliente, ExternalRef, NewEntrega, NewPedido, PedidoStatus,
    Result, SyncAction, SyncLogEntry,
};
use serde_json::{json, Value};
use tracing::{info, instrument, warn};

use super::forms::{ConversionResult, DeliveryDetails, EstimateFilter, EstimateForm, EstimatePatch};
use crate::quickbooks::QuickBooksGateway;
use crate::records::service::missing_reference;
use crate::records::LocalStore;
use crate::sync::mapping::{require_id, resolve_order_items};
use crate::sync::SyncJournal;

/// `entityType` of every sync log row written here.
pub const ESTIMATE_LOG_ENTITY: &str = "estimate";

/// QuickBooks estimates, always read and written upstream.
///
/// Input is validated before any remote call. Every mutation that reaches
/// QuickBooks leaves one sync log row.
pub struct EstimateService {
    gateway: Arc<QuickBooksGateway>,
    store: LocalStore,
    journal: SyncJournal,
    clock: Arc<dyn Clock>,
}

impl EstimateService {
    pub fn new(
        gateway: Arc<QuickBooksGateway>,
        store: LocalStore,
        journal: SyncJournal,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { gateway, store, journal, clock }
    }

    #[instrument(skip(self))]
    pub async fn list_estimates(&self, filter: &EstimateFilter) -> Result<Vec<Estimate>> {
        let query = filter.to_query()?;
        self.gateway.query(&query, "Estimate").await
    }

    pub async fn get_estimate(&self, id: &str) -> Result<Estimate> {
        require_estimate_id(id)?;
        self.gateway.get_estimate(id).await
    }

    #[instrument(skip(self, form))]
    pub async fn create_estimate(&self, form: &EstimateForm) -> Result<Estimate> {
        form.validate()?;
        let result = self.gateway.create_estimate(&form.to_estimate()).await;
        let quickbooks_id = result.as_ref().ok().and_then(|estimate| estimate.id.clone());
        self.audit(SyncAction::Create, quickbooks_id.as_deref(), &result, None).await;
        result
    }

    #[instrument(skip(self, patch, sync_token))]
    pub async fn update_estimate(
        &self,
        id: &str,
        patch: &EstimatePatch,
        sync_token: &str,
    ) -> Result<Estimate> {
        require_estimate_id(id)?;
        require_sync_token(sync_token)?;
        patch.validate()?;

        let result = self.gateway.update_estimate(&patch.to_sparse_estimate(id, sync_token)).await;
        self.audit(SyncAction::Update, Some(id), &result, None).await;
        result
    }

    /// Full replacement. `Id` and `SyncToken` come from the body itself.
    #[instrument(skip(self, estimate), fields(estimate_id = ?estimate.id))]
    pub async fn full_update_estimate(&self, estimate: Estimate) -> Result<Estimate> {
        let id = estimate
            .id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| BackofficeError::Validation("Id is required".into()))?;
        require_sync_token(estimate.sync_token.as_deref().unwrap_or_default())?;

        let body = Estimate { sparse: None, ..estimate };
        let result = self.gateway.update_estimate(&body).await;
        self.audit(SyncAction::Update, Some(&id), &result, None).await;
        result
    }

    /// `status` must be one of Pending, Accepted, Closed, Rejected
    /// (case-insensitive); anything else fails without a remote call.
    #[instrument(skip(self, sync_token))]
    pub async fn update_estimate_status(
        &self,
        id: &str,
        status: &str,
        sync_token: &str,
    ) -> Result<Estimate> {
        let status: EstimateStatus = status.parse().map_err(BackofficeError::Validation)?;
        require_estimate_id(id)?;
        require_sync_token(sync_token)?;

        let result = self.mark_status(id, sync_token, status).await;
        self.audit(SyncAction::Update, Some(id), &result, Some(json!({ "status": status }))).await;
        result
    }

    #[instrument(skip(self))]
    pub async fn send_estimate(&self, id: &str, email: Option<&str>) -> Result<Estimate> {
        require_estimate_id(id)?;
        let email = email.map(str::trim).filter(|email| !email.is_empty());
        if let Some(email) = email {
            validate_email(email)?;
        }

        let result = self.gateway.send_estimate(id, email).await;
        let details = json!({ "operation": "send", "sendTo": email });
        self.audit(SyncAction::Update, Some(id), &result, Some(details)).await;
        result
    }

    pub async fn download_pdf(&self, id: &str) -> Result<Vec<u8>> {
        require_estimate_id(id)?;
        self.gateway.estimate_pdf(id).await
    }

    #[instrument(skip(self, sync_token))]
    pub async fn delete_estimate(&self, id: &str, sync_token: &str) -> Result<Value> {
        require_estimate_id(id)?;
        require_sync_token(sync_token)?;

        let result = self.gateway.delete_estimate(id, sync_token).await;
        self.audit(SyncAction::Delete, Some(id), &result, None).await;
        result
    }

    /// Turn an estimate into an invoice plus a local pedido and entrega.
    ///
    /// Every reference (customer, motorista, veiculo) is checked before the
    /// invoice is created. Steps after the invoice are not compensated: a
    /// failure leaves what was already written in place and is logged.
    #[instrument(skip(self, details))]
    pub async fn convert_to_invoice(
        &self,
        id: &str,
        details: &DeliveryDetails,
    ) -> Result<ConversionResult> {
        require_estimate_id(id)?;
        details.validate()?;

        match self.run_conversion(id, details).await {
            Ok(result) => Ok(result),
            Err(err) => {
                self.journal
                    .record(
                        SyncLogEntry::error(
                            ESTIMATE_LOG_ENTITY,
                            SyncAction::Create,
                            err.to_string(),
                            self.clock.now(),
                        )
                        .with_quickbooks_id(id)
                        .with_details(json!({ "operation": "convert-to-invoice" })),
                    )
                    .await;
                Err(err)
            }
        }
    }

    async fn run_conversion(
        &self,
        id: &str,
        details: &DeliveryDetails,
    ) -> Result<ConversionResult> {
        let estimate = self.gateway.get_estimate(id).await?;
        if let Some(status @ (EstimateStatus::Closed | EstimateStatus::Rejected)) =
            estimate.txn_status
        {
            return Err(BackofficeError::Validation(format!(
                "estimate {} is {status} and cannot be converted",
                estimate.label()
            )));
        }

        let cliente = self.resolve_cliente(&estimate).await?;
        if self.store.motoristas.find_by_id(&details.motorista_id).await?.is_none() {
            return Err(missing_reference("motorista", &details.motorista_id));
        }
        if self.store.veiculos.find_by_id(&details.veiculo_id).await?.is_none() {
            return Err(missing_reference("veiculo", &details.veiculo_id));
        }

        let invoice = self.gateway.create_invoice(&invoice_from_estimate(id, &estimate)).await?;
        let invoice_id = require_id(invoice.id.as_ref())?.to_string();
        info!(estimate_id = %id, invoice_id = %invoice_id, "Invoice created from estimate");

        let estimate_marked_accepted = self.accept_converted(&estimate, id, &invoice_id).await;

        let now = self.clock.now();
        let pedido = self
            .store
            .pedidos
            .create(NewPedido {
                cliente_id: cliente.id.clone(),
                status: PedidoStatus::Confirmado,
                observacoes: estimate.private_note.clone(),
                estimate_id: Some(id.to_string()),
                external: ExternalRef::synced(&invoice_id, now),
                itens: resolve_order_items(self.store.produtos.as_ref(), &estimate.line).await?,
                valor_total: invoice.total_amt.or(estimate.total_amt),
            })
            .await?;

        let endereco_entrega = details
            .endereco_entrega
            .clone()
            .filter(|address| !address.trim().is_empty())
            .or_else(|| estimate.ship_addr.as_ref().and_then(|addr| addr.one_line()))
            .or_else(|| estimate.bill_addr.as_ref().and_then(|addr| addr.one_line()))
            .or_else(|| cliente.endereco_completo());
        let entrega = self
            .store
            .entregas
            .create(NewEntrega {
                pedido_id: pedido.id.clone(),
                motorista_id: Some(details.motorista_id.clone()),
                veiculo_id: Some(details.veiculo_id.clone()),
                data_entrega: details.data_entrega,
                endereco_entrega,
                observacoes: details.observacoes.clone(),
                estimate_id: Some(id.to_string()),
                invoice_id: Some(invoice_id.clone()),
            })
            .await?;

        self.journal
            .record(
                SyncLogEntry::success(ESTIMATE_LOG_ENTITY, SyncAction::Create, self.clock.now())
                    .with_entity_id(&pedido.id)
                    .with_quickbooks_id(id)
                    .with_details(json!({
                        "operation": "convert-to-invoice",
                        "estimateDocNumber": estimate.label(),
                        "invoiceId": invoice_id,
                        "invoiceDocNumber": invoice.label(),
                        "pedidoNumero": pedido.numero,
                        "estimateMarkedAccepted": estimate_marked_accepted,
                    })),
            )
            .await;
        info!(
            estimate_id = %id,
            invoice_id = %invoice_id,
            pedido_numero = %pedido.numero,
            "Estimate converted"
        );

        Ok(ConversionResult { invoice, pedido, entrega, estimate_marked_accepted })
    }

    async fn resolve_cliente(&self, estimate: &Estimate) -> Result<Cliente> {
        let customer_id = estimate.customer_ref.as_ref().map(|r| r.value.as_str()).ok_or_else(|| {
            BackofficeError::Validation(format!("estimate {} has no CustomerRef", estimate.label()))
        })?;
        self.store.clientes.find_by_quickbooks_id(customer_id).await?.ok_or_else(|| {
            BackofficeError::Integrity(format!(
                "customer {customer_id} is not synced locally; sync clientes first"
            ))
        })
    }

    /// Best effort. Failure is logged and reported, never propagated.
    async fn accept_converted(&self, estimate: &Estimate, id: &str, invoice_id: &str) -> bool {
        if estimate.txn_status == Some(EstimateStatus::Accepted) {
            return true;
        }
        let sync_token = estimate.sync_token.as_deref().unwrap_or_default();
        match self.mark_status(id, sync_token, EstimateStatus::Accepted).await {
            Ok(_) => true,
            Err(err) => {
                warn!(
                    estimate_id = %id,
                    invoice_id = %invoice_id,
                    error = %err,
                    "Invoice created but estimate not marked Accepted"
                );
                self.journal
                    .record(
                        SyncLogEntry::error(
                            ESTIMATE_LOG_ENTITY,
                            SyncAction::Update,
                            format!(
                                "estimate {} not marked Accepted after invoice {invoice_id}: {err}",
                                estimate.label()
                            ),
                            self.clock.now(),
                        )
                        .with_quickbooks_id(id)
                        .with_details(json!({ "invoiceId": invoice_id })),
                    )
                    .await;
                false
            }
        }
    }

    async fn mark_status(
        &self,
        id: &str,
        sync_token: &str,
        status: EstimateStatus,
    ) -> Result<Estimate> {
        let body = Estimate {
            id: Some(id.to_string()),
            sync_token: Some(sync_token.to_string()),
            txn_status: Some(status),
            sparse: Some(true),
            ..Estimate::default()
        };
        self.gateway.update_estimate(&body).await
    }

    async fn audit<T>(
        &self,
        action: SyncAction,
        quickbooks_id: Option<&str>,
        result: &Result<T>,
        details: Option<Value>,
    ) {
        let now = self.clock.now();
        let mut entry = match result {
            Ok(_) => SyncLogEntry::success(ESTIMATE_LOG_ENTITY, action, now),
            Err(err) => SyncLogEntry::error(ESTIMATE_LOG_ENTITY, action, err.to_string(), now),
        };
        if let Some(id) = quickbooks_id {
            entry = entry.with_quickbooks_id(id);
        }
        if let Some(details) = details {
            entry = entry.with_details(details);
        }
        self.journal.record(entry).await;
    }
}

/// Lines and addresses copied as-is; line ids belong to the estimate and
/// are dropped.
fn invoice_from_estimate(id: &str, estimate: &Estimate) -> Invoice {
    Invoice {
        customer_ref: estimate.customer_ref.clone(),
        line: estimate.line.iter().cloned().map(|line| Line { id: None, ..line }).collect(),
        bill_addr: estimate.bill_addr.clone(),
        ship_addr: estimate.ship_addr.clone(),
        bill_email: estimate.bill_email.clone(),
        customer_memo: estimate.customer_memo.clone(),
        linked_txn: vec![LinkedTxn { txn_id: id.to_string(), txn_type: "Estimate".to_string() }],
        ..Invoice::default()
    }
}

fn require_estimate_id(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(BackofficeError::Validation("estimate id is required".into()));
    }
    Ok(())
}

fn require_sync_token(sync_token: &str) -> Result<()> {
    if sync_token.trim().is_empty() {
        return Err(BackofficeError::Validation("syncToken is required".into()));
    }
    Ok(())
}

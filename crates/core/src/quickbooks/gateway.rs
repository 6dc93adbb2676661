//! Typed QuickBooks operations over a [`QuickBooksTransport`].
//!
//! Responses arrive wrapped in an envelope named after the entity
//! (`{"Estimate": {...}, "time": ...}`); queries come back as
//! `{"QueryResponse": {"Customer": [...]}}`. The gateway unwraps both.

use std::sync::Arc;

use backoffice_domain::quickbooks::{Customer, Estimate, Invoice, Item};
use backoffice_domain::{BackofficeError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::ports::QuickBooksTransport;
use super::query::QueryBuilder;

pub struct QuickBooksGateway {
    transport: Arc<dyn QuickBooksTransport>,
}

impl QuickBooksGateway {
    pub fn new(transport: Arc<dyn QuickBooksTransport>) -> Self {
        Self { transport }
    }

    pub async fn query<T: DeserializeOwned>(
        &self,
        query: &QueryBuilder,
        entity: &str,
    ) -> Result<Vec<T>> {
        let response = self.transport.query(&query.build()?).await?;
        unwrap_query(response, entity)
    }

    /// Up to one page of customers, or the single `Id` when given.
    pub async fn customers(&self, id: Option<&str>) -> Result<Vec<Customer>> {
        self.query(&single_or_page("Customer", id), "Customer").await
    }

    pub async fn items(&self, id: Option<&str>) -> Result<Vec<Item>> {
        self.query(&single_or_page("Item", id), "Item").await
    }

    pub async fn invoices(&self, id: Option<&str>) -> Result<Vec<Invoice>> {
        self.query(&single_or_page("Invoice", id), "Invoice").await
    }

    pub async fn get_customer(&self, id: &str) -> Result<Customer> {
        self.read("customer", id, "Customer").await
    }

    pub async fn create_customer(&self, customer: &Customer) -> Result<Customer> {
        self.write("customer", None, customer, "Customer").await
    }

    pub async fn update_customer(&self, customer: &Customer) -> Result<Customer> {
        self.write("customer", Some("update"), customer, "Customer").await
    }

    pub async fn get_estimate(&self, id: &str) -> Result<Estimate> {
        self.read("estimate", id, "Estimate").await
    }

    pub async fn create_estimate(&self, estimate: &Estimate) -> Result<Estimate> {
        self.write("estimate", None, estimate, "Estimate").await
    }

    /// Sparse or full update; the body decides via its `sparse` flag.
    pub async fn update_estimate(&self, estimate: &Estimate) -> Result<Estimate> {
        self.write("estimate", Some("update"), estimate, "Estimate").await
    }

    /// Returns the provider's deletion acknowledgement
    /// (`{"Id", "status": "Deleted"}`).
    pub async fn delete_estimate(&self, id: &str, sync_token: &str) -> Result<Value> {
        let body = serde_json::json!({ "Id": id, "SyncToken": sync_token });
        let response = self.transport.post("estimate", &[("operation", "delete")], &body).await?;
        unwrap_entity(response, "Estimate")
    }

    pub async fn send_estimate(&self, id: &str, send_to: Option<&str>) -> Result<Estimate> {
        let path = format!("estimate/{id}/send");
        let params: Vec<(&str, &str)> =
            send_to.map(|email| vec![("sendTo", email)]).unwrap_or_default();
        let response = self.transport.post(&path, &params, &Value::Null).await?;
        unwrap_entity(response, "Estimate")
    }

    pub async fn estimate_pdf(&self, id: &str) -> Result<Vec<u8>> {
        self.transport.get_pdf(&format!("estimate/{id}/pdf")).await
    }

    pub async fn create_invoice(&self, invoice: &Invoice) -> Result<Invoice> {
        self.write("invoice", None, invoice, "Invoice").await
    }

    async fn read<T: DeserializeOwned>(&self, resource: &str, id: &str, entity: &str) -> Result<T> {
        let response = self.transport.get(&format!("{resource}/{id}"), &[]).await?;
        unwrap_entity(response, entity)
    }

    async fn write<B, T>(
        &self,
        resource: &str,
        operation: Option<&str>,
        body: &B,
        entity: &str,
    ) -> Result<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)
            .map_err(|e| BackofficeError::Internal(format!("failed to encode {entity}: {e}")))?;
        let params: Vec<(&str, &str)> =
            operation.map(|op| vec![("operation", op)]).unwrap_or_default();
        let response = self.transport.post(resource, &params, &body).await?;
        unwrap_entity(response, entity)
    }
}

fn single_or_page(entity: &str, id: Option<&str>) -> QueryBuilder {
    match id {
        Some(id) => QueryBuilder::select(entity).filter_eq("Id", id),
        None => QueryBuilder::select(entity),
    }
}

fn unwrap_entity<T: DeserializeOwned>(mut response: Value, entity: &str) -> Result<T> {
    let payload = response.get_mut(entity).map(Value::take).ok_or_else(|| {
        BackofficeError::Internal(format!("QuickBooks response has no {entity} object"))
    })?;
    serde_json::from_value(payload)
        .map_err(|e| BackofficeError::Internal(format!("malformed {entity} from QuickBooks: {e}")))
}

fn unwrap_query<T: DeserializeOwned>(mut response: Value, entity: &str) -> Result<Vec<T>> {
    let rows = response
        .get_mut("QueryResponse")
        .and_then(|query| query.get_mut(entity))
        .map(Value::take)
        .unwrap_or_else(|| Value::Array(Vec::new()));
    serde_json::from_value(rows).map_err(|e| {
        BackofficeError::Internal(format!("malformed {entity} list from QuickBooks: {e}"))
    })
}

//! Entregas (deliveries).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::require_text;
use crate::errors::Result;
use crate::impl_domain_status_conversions;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntregaStatus {
    #[default]
    Agendada,
    EmRota,
    Entregue,
    Cancelada,
}

impl_domain_status_conversions!(EntregaStatus {
    Agendada => "agendada",
    EmRota => "em_rota",
    Entregue => "entregue",
    Cancelada => "cancelada",
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entrega {
    pub id: String,
    pub pedido_id: String,
    pub motorista_id: Option<String>,
    pub veiculo_id: Option<String>,
    pub data_entrega: NaiveDate,
    pub endereco_entrega: Option<String>,
    pub status: EntregaStatus,
    pub observacoes: Option<String>,
    pub estimate_id: Option<String>,
    pub invoice_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Delivery ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEntrega {
    pub pedido_id: String,
    pub motorista_id: Option<String>,
    pub veiculo_id: Option<String>,
    pub data_entrega: NaiveDate,
    pub endereco_entrega: Option<String>,
    pub observacoes: Option<String>,
    pub estimate_id: Option<String>,
    pub invoice_id: Option<String>,
}

/// Payload for scheduling a delivery through the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntregaInput {
    pub pedido_id: String,
    #[serde(default)]
    pub motorista_id: Option<String>,
    #[serde(default)]
    pub veiculo_id: Option<String>,
    pub data_entrega: NaiveDate,
    #[serde(default)]
    pub endereco_entrega: Option<String>,
    #[serde(default)]
    pub observacoes: Option<String>,
}

impl EntregaInput {
    pub fn validate(&self) -> Result<()> {
        require_text("pedidoId", &self.pedido_id)
    }

    pub fn into_new_entrega(self) -> NewEntrega {
        NewEntrega {
            pedido_id: self.pedido_id,
            motorista_id: self.motorista_id,
            veiculo_id: self.veiculo_id,
            data_entrega: self.data_entrega,
            endereco_entrega: self.endereco_entrega,
            observacoes: self.observacoes,
            estimate_id: None,
            invoice_id: None,
        }
    }
}

/// Partial update of a delivery (scheduling and status).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntregaUpdate {
    #[serde(default)]
    pub status: Option<EntregaStatus>,
    #[serde(default)]
    pub motorista_id: Option<String>,
    #[serde(default)]
    pub veiculo_id: Option<String>,
    #[serde(default)]
    pub data_entrega: Option<NaiveDate>,
    #[serde(default)]
    pub endereco_entrega: Option<String>,
    #[serde(default)]
    pub observacoes: Option<String>,
}

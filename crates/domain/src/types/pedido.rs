//! Pedidos (orders) and their line items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{require_text, round_cents, ExternalRef};
use crate::errors::{BackofficeError, Result};
use crate::impl_domain_status_conversions;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PedidoStatus {
    #[default]
    Pendente,
    Confirmado,
    EmEntrega,
    Entregue,
    Cancelado,
}

impl_domain_status_conversions!(PedidoStatus {
    Pendente => "pendente",
    Confirmado => "confirmado",
    EmEntrega => "em_entrega",
    Entregue => "entregue",
    Cancelado => "cancelado",
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pedido {
    pub id: String,
    /// Sequential, zero-padded order number.
    pub numero: String,
    pub cliente_id: String,
    pub status: PedidoStatus,
    pub valor_total: f64,
    pub observacoes: Option<String>,
    /// Source estimate when the order came from a conversion.
    pub estimate_id: Option<String>,
    #[serde(flatten)]
    pub external: ExternalRef,
    pub itens: Vec<PedidoItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PedidoItem {
    pub id: String,
    pub pedido_id: String,
    pub produto_id: Option<String>,
    pub descricao: String,
    pub quantidade: f64,
    pub preco_unitario: f64,
    /// Zero-based position inside the order.
    pub posicao: u32,
}

impl PedidoItem {
    pub fn subtotal(&self) -> f64 {
        round_cents(self.quantidade * self.preco_unitario)
    }
}

/// Order ready to be inserted; the number is allocated by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPedido {
    pub cliente_id: String,
    pub status: PedidoStatus,
    pub observacoes: Option<String>,
    pub estimate_id: Option<String>,
    pub external: ExternalRef,
    pub itens: Vec<NewPedidoItem>,
    /// Total when known upstream; otherwise the sum of item subtotals.
    pub valor_total: Option<f64>,
}

impl NewPedido {
    pub fn total(&self) -> f64 {
        self.valor_total.unwrap_or_else(|| {
            round_cents(self.itens.iter().map(|item| item.quantidade * item.preco_unitario).sum())
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPedidoItem {
    #[serde(default)]
    pub produto_id: Option<String>,
    pub descricao: String,
    pub quantidade: f64,
    pub preco_unitario: f64,
}

impl NewPedidoItem {
    pub fn validate(&self) -> Result<()> {
        require_text("descricao", &self.descricao)?;
        if !self.quantidade.is_finite() || self.quantidade <= 0.0 {
            return Err(BackofficeError::Validation("quantidade must be positive".into()));
        }
        if !self.preco_unitario.is_finite() || self.preco_unitario < 0.0 {
            return Err(BackofficeError::Validation(
                "precoUnitario must be zero or positive".into(),
            ));
        }
        Ok(())
    }
}

/// Payload for creating a local order through the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PedidoInput {
    pub cliente_id: String,
    #[serde(default)]
    pub observacoes: Option<String>,
    pub itens: Vec<NewPedidoItem>,
}

impl PedidoInput {
    pub fn validate(&self) -> Result<()> {
        require_text("clienteId", &self.cliente_id)?;
        if self.itens.is_empty() {
            return Err(BackofficeError::Validation("pedido needs at least one item".into()));
        }
        self.itens.iter().try_for_each(NewPedidoItem::validate)
    }

    pub fn into_new_pedido(self) -> NewPedido {
        NewPedido {
            cliente_id: self.cliente_id,
            status: PedidoStatus::Pendente,
            observacoes: self.observacoes,
            estimate_id: None,
            external: ExternalRef::default(),
            itens: self.itens,
            valor_total: None,
        }
    }
}

/// Partial update of an order's workflow fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PedidoUpdate {
    #[serde(default)]
    pub status: Option<PedidoStatus>,
    #[serde(default)]
    pub observacoes: Option<String>,
}

//! Domain types and models
//!
//! Local back office records, QuickBooks wire types, and the bookkeeping
//! that ties them together (connection, sync status, sync log).

pub mod cliente;
pub mod connection;
pub mod entrega;
pub mod frota;
pub mod pedido;
pub mod produto;
pub mod quickbooks;
pub mod sync;
pub mod webhook;

pub use cliente::{Cliente, ClienteInput};
pub use connection::{ConnectionStatus, QuickBooksConnection, TokenGrant};
pub use entrega::{Entrega, EntregaInput, EntregaStatus, EntregaUpdate, NewEntrega};
pub use frota::{Motorista, MotoristaInput, Veiculo, VeiculoInput};
pub use pedido::{
    NewPedido, NewPedidoItem, Pedido, PedidoInput, PedidoItem, PedidoStatus, PedidoUpdate,
};
pub use produto::{Produto, ProdutoInput};
pub use sync::{
    ExternalRef, SyncAction, SyncAllSummary, SyncBatchOutcome, SyncEntity, SyncFailure,
    SyncLogEntry, SyncLogFilter, SyncLogStatus, SyncStatus, SyncSummary, UpsertOutcome,
};
pub use webhook::{ChangedEntity, DataChangeEvent, EventNotification, WebhookPayload};

use crate::errors::{BackofficeError, Result};

/// Reject blank required text fields.
pub(crate) fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(BackofficeError::Validation(format!("{field} is required")));
    }
    Ok(())
}

/// Minimal shape check for e-mail addresses.
pub fn validate_email(email: &str) -> Result<()> {
    let trimmed = email.trim();
    let valid = match trimmed.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !trimmed.contains(char::is_whitespace)
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(BackofficeError::Validation(format!("invalid email format: {email}")))
    }
}

/// Round a monetary amount to cents.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

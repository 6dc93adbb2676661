//! Produtos (products / QuickBooks items).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{require_text, ExternalRef};
use crate::errors::{BackofficeError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Produto {
    pub id: String,
    pub codigo: String,
    pub nome: String,
    pub descricao: Option<String>,
    pub preco: f64,
    pub unidade: Option<String>,
    pub ativo: bool,
    #[serde(flatten)]
    pub external: ExternalRef,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProdutoInput {
    pub codigo: String,
    pub nome: String,
    #[serde(default)]
    pub descricao: Option<String>,
    #[serde(default)]
    pub preco: f64,
    #[serde(default)]
    pub unidade: Option<String>,
    #[serde(default = "default_ativo")]
    pub ativo: bool,
}

fn default_ativo() -> bool {
    true
}

impl ProdutoInput {
    pub fn validate(&self) -> Result<()> {
        require_text("codigo", &self.codigo)?;
        require_text("nome", &self.nome)?;
        if !self.preco.is_finite() || self.preco < 0.0 {
            return Err(BackofficeError::Validation("preco must be zero or positive".into()));
        }
        Ok(())
    }
}

//! Fleet records: motoristas (drivers) and veiculos (vehicles).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::require_text;
use crate::errors::{BackofficeError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Motorista {
    pub id: String,
    pub nome: String,
    pub cpf: Option<String>,
    pub cnh: Option<String>,
    pub telefone: Option<String>,
    pub ativo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotoristaInput {
    pub nome: String,
    #[serde(default)]
    pub cpf: Option<String>,
    #[serde(default)]
    pub cnh: Option<String>,
    #[serde(default)]
    pub telefone: Option<String>,
    #[serde(default = "default_ativo")]
    pub ativo: bool,
}

impl MotoristaInput {
    pub fn validate(&self) -> Result<()> {
        require_text("nome", &self.nome)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Veiculo {
    pub id: String,
    pub placa: String,
    pub modelo: Option<String>,
    pub capacidade_kg: Option<f64>,
    pub ativo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VeiculoInput {
    pub placa: String,
    #[serde(default)]
    pub modelo: Option<String>,
    #[serde(default)]
    pub capacidade_kg: Option<f64>,
    #[serde(default = "default_ativo")]
    pub ativo: bool,
}

impl VeiculoInput {
    pub fn validate(&self) -> Result<()> {
        require_text("placa", &self.placa)?;
        if let Some(capacidade) = self.capacidade_kg {
            if !capacidade.is_finite() || capacidade <= 0.0 {
                return Err(BackofficeError::Validation(
                    "capacidadeKg must be positive".into(),
                ));
            }
        }
        Ok(())
    }
}

fn default_ativo() -> bool {
    true
}

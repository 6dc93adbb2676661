//! Clientes (customers).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{require_text, validate_email, ExternalRef};
use crate::errors::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cliente {
    pub id: String,
    pub nome: String,
    /// CPF/CNPJ, or `QB-<id>` for customers first seen in QuickBooks.
    pub documento: String,
    pub email: Option<String>,
    pub telefone: Option<String>,
    pub endereco: Option<String>,
    pub cidade: Option<String>,
    pub estado: Option<String>,
    pub cep: Option<String>,
    #[serde(flatten)]
    pub external: ExternalRef,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cliente {
    /// Single-line address used when an estimate carries none.
    pub fn endereco_completo(&self) -> Option<String> {
        let parts: Vec<&str> = [&self.endereco, &self.cidade, &self.estado, &self.cep]
            .into_iter()
            .filter_map(|part| part.as_deref())
            .filter(|part| !part.trim().is_empty())
            .collect();
        (!parts.is_empty()).then(|| parts.join(", "))
    }
}

/// Create/replace payload for a cliente.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClienteInput {
    pub nome: String,
    pub documento: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub telefone: Option<String>,
    #[serde(default)]
    pub endereco: Option<String>,
    #[serde(default)]
    pub cidade: Option<String>,
    #[serde(default)]
    pub estado: Option<String>,
    #[serde(default)]
    pub cep: Option<String>,
}

impl ClienteInput {
    pub fn validate(&self) -> Result<()> {
        require_text("nome", &self.nome)?;
        require_text("documento", &self.documento)?;
        if let Some(email) = self.email.as_deref().filter(|e| !e.trim().is_empty()) {
            validate_email(email)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_requires_name_and_document() {
        let input = ClienteInput { nome: " ".into(), documento: "1".into(), ..Default::default() };
        assert!(input.validate().is_err());
        let input =
            ClienteInput { nome: "Ana".into(), documento: String::new(), ..Default::default() };
        assert!(input.validate().is_err());
        let input =
            ClienteInput { nome: "Ana".into(), documento: "1".into(), ..Default::default() };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn validate_checks_optional_email() {
        let input = ClienteInput {
            nome: "Ana".into(),
            documento: "1".into(),
            email: Some("not-an-email".into()),
            ..Default::default()
        };
        assert!(input.validate().is_err());
    }
}

//! Escaped builder for the QuickBooks query language.
//!
//! Renders `SELECT * FROM <Entity> [WHERE ...] [ORDERBY f DESC] MAXRESULTS n`.
//! Values are quoted and escaped; identifiers are checked against
//! `[A-Za-z0-9_.]`.

use backoffice_domain::constants::QBO_QUERY_LIMIT;
use backoffice_domain::{BackofficeError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Condition {
    Eq(String, String),
    Like(String, String),
    Gte(String, String),
    Lte(String, String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryBuilder {
    entity: String,
    conditions: Vec<Condition>,
    order_by: Option<(String, bool)>,
    max_results: u32,
}

impl QueryBuilder {
    pub fn select(entity: &str) -> Self {
        Self {
            entity: entity.to_string(),
            conditions: Vec::new(),
            order_by: None,
            max_results: QBO_QUERY_LIMIT,
        }
    }

    pub fn filter_eq(mut self, field: &str, value: &str) -> Self {
        self.conditions.push(Condition::Eq(field.to_string(), value.to_string()));
        self
    }

    /// `LIKE '%value%'`; `%` inside `value` is kept as a wildcard.
    pub fn filter_like(mut self, field: &str, value: &str) -> Self {
        self.conditions.push(Condition::Like(field.to_string(), format!("%{value}%")));
        self
    }

    /// `LIKE 'value%'`
    pub fn filter_prefix(mut self, field: &str, value: &str) -> Self {
        self.conditions.push(Condition::Like(field.to_string(), format!("{value}%")));
        self
    }

    pub fn filter_gte(mut self, field: &str, value: &str) -> Self {
        self.conditions.push(Condition::Gte(field.to_string(), value.to_string()));
        self
    }

    pub fn filter_lte(mut self, field: &str, value: &str) -> Self {
        self.conditions.push(Condition::Lte(field.to_string(), value.to_string()));
        self
    }

    pub fn order_by(mut self, field: &str, descending: bool) -> Self {
        self.order_by = Some((field.to_string(), descending));
        self
    }

    /// Clamped to `1..=1000`.
    pub fn max_results(mut self, n: u32) -> Self {
        self.max_results = n.clamp(1, QBO_QUERY_LIMIT);
        self
    }

    pub fn build(&self) -> Result<String> {
        check_identifier(&self.entity)?;

        let mut statement = format!("SELECT * FROM {}", self.entity);

        let mut clauses = Vec::with_capacity(self.conditions.len());
        for condition in &self.conditions {
            let (field, op, value) = match condition {
                Condition::Eq(f, v) => (f, "=", v),
                Condition::Like(f, v) => (f, "LIKE", v),
                Condition::Gte(f, v) => (f, ">=", v),
                Condition::Lte(f, v) => (f, "<=", v),
            };
            check_identifier(field)?;
            clauses.push(format!("{field} {op} '{}'", escape_value(value)));
        }
        if !clauses.is_empty() {
            statement.push_str(" WHERE ");
            statement.push_str(&clauses.join(" AND "));
        }

        if let Some((field, descending)) = &self.order_by {
            check_identifier(field)?;
            statement.push_str(&format!(" ORDERBY {field}"));
            if *descending {
                statement.push_str(" DESC");
            }
        }

        statement.push_str(&format!(" MAXRESULTS {}", self.max_results));
        Ok(statement)
    }
}

fn check_identifier(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
    if valid {
        Ok(())
    } else {
        Err(BackofficeError::Validation(format!("invalid query identifier: {name:?}")))
    }
}

fn escape_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

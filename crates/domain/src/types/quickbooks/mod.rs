//! QuickBooks Online wire types.
//!
//! Field names follow the QuickBooks JSON (PascalCase). Every field that
//! QuickBooks may omit is optional, and `None` values are left out when
//! serialising so sparse updates only carry what the caller set.

pub mod customer;
pub mod estimate;
pub mod invoice;
pub mod item;
pub mod line;

pub use customer::Customer;
pub use estimate::{Estimate, EstimateStatus};
pub use invoice::{Invoice, LinkedTxn};
pub use item::Item;
pub use line::{DiscountLineDetail, Line, LineDetail, SalesItemLineDetail, SubTotalLineDetail};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

/// Reference to another QuickBooks entity (`{"value": "42", "name": "..."}`).
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub value: String,
    pub name: Option<String>,
}

impl Reference {
    pub fn new(value: impl Into<String>) -> Self {
        Self { value: value.into(), name: None }
    }
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PhysicalAddress {
    pub id: Option<String>,
    pub line1: Option<String>,
    pub line2: Option<String>,
    pub line3: Option<String>,
    pub city: Option<String>,
    pub country_sub_division_code: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

impl PhysicalAddress {
    /// Street lines joined with ", ".
    pub fn street(&self) -> Option<String> {
        let lines: Vec<&str> = [&self.line1, &self.line2, &self.line3]
            .into_iter()
            .filter_map(|line| line.as_deref())
            .filter(|line| !line.trim().is_empty())
            .collect();
        (!lines.is_empty()).then(|| lines.join(", "))
    }

    /// Whole address on one line.
    pub fn one_line(&self) -> Option<String> {
        let mut parts: Vec<String> = self.street().into_iter().collect();
        parts.extend(
            [&self.city, &self.country_sub_division_code, &self.postal_code]
                .into_iter()
                .filter_map(|part| part.clone())
                .filter(|part| !part.trim().is_empty()),
        );
        (!parts.is_empty()).then(|| parts.join(", "))
    }
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EmailAddress {
    pub address: Option<String>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TelephoneNumber {
    pub free_form_number: Option<String>,
}

/// Free-text memo (`{"value": "..."}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoRef {
    pub value: String,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetaData {
    pub create_time: Option<String>,
    pub last_updated_time: Option<String>,
}

/// Sales tax summary of a transaction.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TxnTaxDetail {
    pub txn_tax_code_ref: Option<Reference>,
    pub total_tax: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tax_line: Vec<serde_json::Value>,
}

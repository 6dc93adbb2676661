use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_with::skip_serializing_none;

use super::{EmailAddress, Line, MemoRef, MetaData, PhysicalAddress, Reference, TxnTaxDetail};

/// Lifecycle of a QuickBooks estimate (`TxnStatus`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EstimateStatus {
    Pending,
    Accepted,
    Closed,
    Rejected,
}

impl EstimateStatus {
    pub const ALL: [Self; 4] = [Self::Pending, Self::Accepted, Self::Closed, Self::Rejected];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Accepted => "Accepted",
            Self::Closed => "Closed",
            Self::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for EstimateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EstimateStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "Invalid estimate status: {s} (expected Pending, Accepted, Closed or Rejected)"
                )
            })
    }
}

/// QuickBooks `Estimate`.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Estimate {
    pub id: Option<String>,
    pub sync_token: Option<String>,
    pub doc_number: Option<String>,
    pub txn_date: Option<NaiveDate>,
    pub expiration_date: Option<NaiveDate>,
    pub accepted_date: Option<NaiveDate>,
    pub accepted_by: Option<String>,
    pub txn_status: Option<EstimateStatus>,
    pub customer_ref: Option<Reference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub line: Vec<Line>,
    pub txn_tax_detail: Option<TxnTaxDetail>,
    pub total_amt: Option<f64>,
    pub bill_addr: Option<PhysicalAddress>,
    pub ship_addr: Option<PhysicalAddress>,
    pub bill_email: Option<EmailAddress>,
    pub customer_memo: Option<MemoRef>,
    pub private_note: Option<String>,
    pub email_status: Option<String>,
    /// Lower-case on the wire, unlike every other field.
    #[serde(rename = "sparse")]
    pub sparse: Option<bool>,
    pub meta_data: Option<MetaData>,
    /// Fields not modelled here (`SalesTermRef`, `CustomField`, `ClassRef`,
    /// ...). A full update must send them back or QuickBooks clears them.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Estimate {
    /// Document number, falling back to the id.
    pub fn label(&self) -> String {
        self.doc_number
            .clone()
            .or_else(|| self.id.clone())
            .unwrap_or_else(|| "<new>".to_string())
    }
}

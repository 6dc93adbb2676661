use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_with::skip_serializing_none;

use super::{EmailAddress, Line, MemoRef, MetaData, PhysicalAddress, Reference, TxnTaxDetail};

/// Link between transactions (an invoice created from an estimate).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LinkedTxn {
    pub txn_id: String,
    pub txn_type: String,
}

/// QuickBooks `Invoice`.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Invoice {
    pub id: Option<String>,
    pub sync_token: Option<String>,
    pub doc_number: Option<String>,
    pub txn_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub customer_ref: Option<Reference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub line: Vec<Line>,
    pub txn_tax_detail: Option<TxnTaxDetail>,
    pub total_amt: Option<f64>,
    pub balance: Option<f64>,
    pub bill_addr: Option<PhysicalAddress>,
    pub ship_addr: Option<PhysicalAddress>,
    pub bill_email: Option<EmailAddress>,
    pub customer_memo: Option<MemoRef>,
    pub private_note: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub linked_txn: Vec<LinkedTxn>,
    pub meta_data: Option<MetaData>,
    /// Provider fields without a typed counterpart, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Invoice {
    pub fn label(&self) -> String {
        self.doc_number
            .clone()
            .or_else(|| self.id.clone())
            .unwrap_or_else(|| "<new>".to_string())
    }
}

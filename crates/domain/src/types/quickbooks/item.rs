use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use super::{MetaData, Reference};

/// QuickBooks `Item` (product or service).
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Item {
    pub id: Option<String>,
    pub sync_token: Option<String>,
    pub name: Option<String>,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub unit_price: Option<f64>,
    #[serde(rename = "Type")]
    pub item_type: Option<String>,
    pub active: Option<bool>,
    pub income_account_ref: Option<Reference>,
    pub meta_data: Option<MetaData>,
}

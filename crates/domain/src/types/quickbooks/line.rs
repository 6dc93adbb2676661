//! Transaction lines.
//!
//! QuickBooks encodes the line variant twice: a `DetailType` tag and a
//! sibling object named after it (`"SalesItemLineDetail": {...}`). [`Line`]
//! exposes that as a single [`LineDetail`] enum and converts through
//! a private wire struct at the serde boundary.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_with::skip_serializing_none;

use super::Reference;

const SALES_ITEM: &str = "SalesItemLineDetail";
const SUB_TOTAL: &str = "SubTotalLineDetail";
const DISCOUNT: &str = "DiscountLineDetail";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawLine", into = "RawLine")]
pub struct Line {
    pub id: Option<String>,
    pub line_num: Option<u32>,
    pub description: Option<String>,
    pub amount: Option<f64>,
    pub detail: LineDetail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LineDetail {
    SalesItem(SalesItemLineDetail),
    SubTotal(SubTotalLineDetail),
    Discount(DiscountLineDetail),
    /// Any other detail type; its sibling fields are kept verbatim.
    Other { detail_type: String, fields: Map<String, Value> },
}

impl LineDetail {
    pub fn detail_type(&self) -> &str {
        match self {
            Self::SalesItem(_) => SALES_ITEM,
            Self::SubTotal(_) => SUB_TOTAL,
            Self::Discount(_) => DISCOUNT,
            Self::Other { detail_type, .. } => detail_type,
        }
    }
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SalesItemLineDetail {
    pub item_ref: Option<Reference>,
    pub qty: Option<f64>,
    pub unit_price: Option<f64>,
    pub tax_code_ref: Option<Reference>,
    pub service_date: Option<String>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SubTotalLineDetail {
    pub item_ref: Option<Reference>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DiscountLineDetail {
    pub percent_based: Option<bool>,
    pub discount_percent: Option<f64>,
    pub discount_account_ref: Option<Reference>,
}

impl Line {
    pub fn sales_item(
        item_ref: Reference,
        description: Option<String>,
        qty: f64,
        unit_price: f64,
        amount: f64,
    ) -> Self {
        Self {
            id: None,
            line_num: None,
            description,
            amount: Some(amount),
            detail: LineDetail::SalesItem(SalesItemLineDetail {
                item_ref: Some(item_ref),
                qty: Some(qty),
                unit_price: Some(unit_price),
                tax_code_ref: None,
                service_date: None,
            }),
        }
    }

    pub fn as_sales_item(&self) -> Option<&SalesItemLineDetail> {
        match &self.detail {
            LineDetail::SalesItem(detail) => Some(detail),
            _ => None,
        }
    }
}

/// Wire shape of a line.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawLine {
    id: Option<String>,
    line_num: Option<u32>,
    description: Option<String>,
    amount: Option<f64>,
    detail_type: String,
    sales_item_line_detail: Option<SalesItemLineDetail>,
    sub_total_line_detail: Option<SubTotalLineDetail>,
    discount_line_detail: Option<DiscountLineDetail>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl TryFrom<RawLine> for Line {
    type Error = String;

    fn try_from(mut raw: RawLine) -> Result<Self, Self::Error> {
        let detail = match raw.detail_type.as_str() {
            SALES_ITEM => LineDetail::SalesItem(raw.sales_item_line_detail.unwrap_or_default()),
            SUB_TOTAL => LineDetail::SubTotal(raw.sub_total_line_detail.unwrap_or_default()),
            DISCOUNT => LineDetail::Discount(raw.discount_line_detail.unwrap_or_default()),
            "" => return Err("line is missing DetailType".to_string()),
            other => LineDetail::Other {
                detail_type: other.to_string(),
                fields: std::mem::take(&mut raw.extra),
            },
        };

        Ok(Self {
            id: raw.id,
            line_num: raw.line_num,
            description: raw.description,
            amount: raw.amount,
            detail,
        })
    }
}

impl From<Line> for RawLine {
    fn from(line: Line) -> Self {
        let mut raw = Self {
            id: line.id,
            line_num: line.line_num,
            description: line.description,
            amount: line.amount,
            detail_type: line.detail.detail_type().to_string(),
            sales_item_line_detail: None,
            sub_total_line_detail: None,
            discount_line_detail: None,
            extra: Map::new(),
        };

        match line.detail {
            LineDetail::SalesItem(detail) => raw.sales_item_line_detail = Some(detail),
            LineDetail::SubTotal(detail) => raw.sub_total_line_detail = Some(detail),
            LineDetail::Discount(detail) => raw.discount_line_detail = Some(detail),
            LineDetail::Other { fields, .. } => raw.extra = fields,
        }

        raw
    }
}

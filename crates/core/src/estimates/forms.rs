//! Request shapes for the estimate service.

use backoffice_domain::constants::DEFAULT_ESTIMATE_PAGE_SIZE;
use backoffice_domain::quickbooks::{
    EmailAddress, Estimate, EstimateStatus, Invoice, Line, MemoRef, PhysicalAddress, Reference,
};
use backoffice_domain::{round_cents, validate_email, BackofficeError, Entrega, Pedido, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::quickbooks::QueryBuilder;

/// One sales line of an estimate form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateLineInput {
    pub item_id: String,
    #[serde(default)]
    pub description: Option<String>,
    pub quantity: f64,
    pub unit_price: f64,
}

impl EstimateLineInput {
    pub fn validate(&self, index: usize) -> Result<()> {
        if self.item_id.trim().is_empty() {
            return Err(BackofficeError::Validation(format!("line {index}: itemId is required")));
        }
        if !self.quantity.is_finite() || self.quantity <= 0.0 {
            return Err(BackofficeError::Validation(format!(
                "line {index}: quantity must be positive"
            )));
        }
        if !self.unit_price.is_finite() || self.unit_price < 0.0 {
            return Err(BackofficeError::Validation(format!(
                "line {index}: unitPrice must be zero or positive"
            )));
        }
        Ok(())
    }

    /// `Amount` is `quantity * unitPrice` rounded to cents.
    pub fn to_line(&self) -> Line {
        Line::sales_item(
            Reference::new(self.item_id.trim()),
            self.description.clone(),
            self.quantity,
            self.unit_price,
            round_cents(self.quantity * self.unit_price),
        )
    }
}

fn validate_lines(lines: &[EstimateLineInput]) -> Result<()> {
    if lines.is_empty() {
        return Err(BackofficeError::Validation("at least one line is required".into()));
    }
    lines.iter().enumerate().try_for_each(|(index, line)| line.validate(index + 1))
}

fn email_address(email: Option<&str>) -> Option<EmailAddress> {
    email.map(|address| EmailAddress { address: Some(address.trim().to_string()) })
}

fn validate_optional_email(email: Option<&str>) -> Result<()> {
    email.map_or(Ok(()), validate_email)
}

/// New estimate as submitted by the back office.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateForm {
    pub customer_id: String,
    pub lines: Vec<EstimateLineInput>,
    #[serde(default)]
    pub txn_date: Option<NaiveDate>,
    #[serde(default)]
    pub expiration_date: Option<NaiveDate>,
    #[serde(default)]
    pub bill_email: Option<String>,
    #[serde(default)]
    pub customer_memo: Option<String>,
    #[serde(default)]
    pub private_note: Option<String>,
    #[serde(default)]
    pub bill_addr: Option<PhysicalAddress>,
    #[serde(default)]
    pub ship_addr: Option<PhysicalAddress>,
}

impl EstimateForm {
    pub fn validate(&self) -> Result<()> {
        if self.customer_id.trim().is_empty() {
            return Err(BackofficeError::Validation("customerId is required".into()));
        }
        validate_lines(&self.lines)?;
        validate_optional_email(self.bill_email.as_deref())
    }

    pub fn to_estimate(&self) -> Estimate {
        Estimate {
            customer_ref: Some(Reference::new(self.customer_id.trim())),
            line: self.lines.iter().map(EstimateLineInput::to_line).collect(),
            txn_date: self.txn_date,
            expiration_date: self.expiration_date,
            bill_email: email_address(self.bill_email.as_deref()),
            customer_memo: self.customer_memo.clone().map(|value| MemoRef { value }),
            private_note: self.private_note.clone(),
            bill_addr: self.bill_addr.clone(),
            ship_addr: self.ship_addr.clone(),
            ..Estimate::default()
        }
    }
}

/// Partial estimate change. Only the fields present are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimatePatch {
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub lines: Option<Vec<EstimateLineInput>>,
    #[serde(default)]
    pub txn_date: Option<NaiveDate>,
    #[serde(default)]
    pub expiration_date: Option<NaiveDate>,
    #[serde(default)]
    pub bill_email: Option<String>,
    #[serde(default)]
    pub customer_memo: Option<String>,
    #[serde(default)]
    pub private_note: Option<String>,
    #[serde(default)]
    pub bill_addr: Option<PhysicalAddress>,
    #[serde(default)]
    pub ship_addr: Option<PhysicalAddress>,
}

impl EstimatePatch {
    pub fn validate(&self) -> Result<()> {
        if let Some(lines) = &self.lines {
            validate_lines(lines)?;
        }
        if matches!(&self.customer_id, Some(id) if id.trim().is_empty()) {
            return Err(BackofficeError::Validation("customerId cannot be blank".into()));
        }
        validate_optional_email(self.bill_email.as_deref())
    }

    /// Sparse update body: `Id`, `SyncToken`, `sparse: true` plus the
    /// fields present in the patch.
    pub fn to_sparse_estimate(&self, id: &str, sync_token: &str) -> Estimate {
        Estimate {
            id: Some(id.to_string()),
            sync_token: Some(sync_token.to_string()),
            sparse: Some(true),
            customer_ref: self.customer_id.as_deref().map(|id| Reference::new(id.trim())),
            line: self
                .lines
                .as_deref()
                .map(|lines| lines.iter().map(EstimateLineInput::to_line).collect())
                .unwrap_or_default(),
            txn_date: self.txn_date,
            expiration_date: self.expiration_date,
            bill_email: email_address(self.bill_email.as_deref()),
            customer_memo: self.customer_memo.clone().map(|value| MemoRef { value }),
            private_note: self.private_note.clone(),
            bill_addr: self.bill_addr.clone(),
            ship_addr: self.ship_addr.clone(),
            ..Estimate::default()
        }
    }
}

/// Estimate list filter. `status` stays textual so an unknown value can be
/// rejected locally with a readable message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateFilter {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub doc_number: Option<String>,
    #[serde(default)]
    pub from_date: Option<NaiveDate>,
    #[serde(default)]
    pub to_date: Option<NaiveDate>,
    #[serde(default)]
    pub max_results: Option<u32>,
}

impl EstimateFilter {
    pub fn to_query(&self) -> Result<QueryBuilder> {
        let mut query = QueryBuilder::select("Estimate");
        if let Some(status) = non_blank(&self.status) {
            let status: EstimateStatus = status.parse().map_err(BackofficeError::Validation)?;
            query = query.filter_eq("TxnStatus", status.as_str());
        }
        if let Some(customer_id) = non_blank(&self.customer_id) {
            query = query.filter_eq("CustomerRef", customer_id);
        }
        if let Some(doc_number) = non_blank(&self.doc_number) {
            query = query.filter_prefix("DocNumber", doc_number);
        }
        if let Some(from) = self.from_date {
            query = query.filter_gte("TxnDate", &from.to_string());
        }
        if let Some(to) = self.to_date {
            query = query.filter_lte("TxnDate", &to.to_string());
        }
        Ok(query
            .order_by("TxnDate", true)
            .max_results(self.max_results.unwrap_or(DEFAULT_ESTIMATE_PAGE_SIZE)))
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|value| !value.is_empty())
}

/// Delivery scheduling supplied with a conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryDetails {
    pub motorista_id: String,
    pub veiculo_id: String,
    pub data_entrega: NaiveDate,
    /// Falls back to the estimate ShipAddr, then BillAddr, then the
    /// customer's local address.
    #[serde(default)]
    pub endereco_entrega: Option<String>,
    #[serde(default)]
    pub observacoes: Option<String>,
}

impl DeliveryDetails {
    pub fn validate(&self) -> Result<()> {
        if self.motorista_id.trim().is_empty() {
            return Err(BackofficeError::Validation("motoristaId is required".into()));
        }
        if self.veiculo_id.trim().is_empty() {
            return Err(BackofficeError::Validation("veiculoId is required".into()));
        }
        Ok(())
    }
}

/// Everything a conversion produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    pub invoice: Invoice,
    pub pedido: Pedido,
    pub entrega: Entrega,
    /// False when the invoice exists but the estimate could not be marked
    /// `Accepted`.
    pub estimate_marked_accepted: bool,
}

#[cfg(test)]
mod tests {
    use backoffice_domain::quickbooks::LineDetail;

    use super::*;

    fn line(item: &str, quantity: f64, unit_price: f64) -> EstimateLineInput {
        EstimateLineInput { item_id: item.into(), description: None, quantity, unit_price }
    }

    fn form() -> EstimateForm {
        EstimateForm {
            customer_id: "58".into(),
            lines: vec![line("5", 3.0, 19.99)],
            txn_date: None,
            expiration_date: None,
            bill_email: None,
            customer_memo: None,
            private_note: None,
            bill_addr: None,
            ship_addr: None,
        }
    }

    #[test]
    fn form_requires_customer_and_lines() {
        assert!(form().validate().is_ok());

        let mut blank_customer = form();
        blank_customer.customer_id = "  ".into();
        assert!(matches!(blank_customer.validate(), Err(BackofficeError::Validation(_))));

        let mut no_lines = form();
        no_lines.lines.clear();
        assert!(matches!(no_lines.validate(), Err(BackofficeError::Validation(_))));
    }

    #[test]
    fn form_rejects_bad_lines_and_email() {
        let mut zero_qty = form();
        zero_qty.lines.push(line("6", 0.0, 1.0));
        let err = zero_qty.validate().unwrap_err();
        assert!(err.to_string().contains("line 2"));

        let mut negative_price = form();
        negative_price.lines[0].unit_price = -1.0;
        assert!(negative_price.validate().is_err());

        let mut bad_email = form();
        bad_email.bill_email = Some("not-an-email".into());
        assert!(bad_email.validate().is_err());
    }

    #[test]
    fn line_amount_is_rounded_to_cents() {
        let estimate = form().to_estimate();
        assert_eq!(estimate.line.len(), 1);
        assert_eq!(estimate.line[0].amount, Some(59.97));
        assert!(matches!(estimate.line[0].detail, LineDetail::SalesItem(_)));
        assert_eq!(estimate.customer_ref.unwrap().value, "58");
    }

    #[test]
    fn sparse_patch_only_carries_present_fields() {
        let patch = EstimatePatch {
            private_note: Some("call before delivery".into()),
            ..EstimatePatch::default()
        };
        let value = serde_json::to_value(patch.to_sparse_estimate("41", "3")).unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "Id": "41",
                "SyncToken": "3",
                "PrivateNote": "call before delivery",
                "sparse": true
            })
        );
    }

    #[test]
    fn filter_renders_every_clause() {
        let filter = EstimateFilter {
            status: Some("accepted".into()),
            customer_id: Some("58".into()),
            doc_number: Some("10".into()),
            from_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            to_date: NaiveDate::from_ymd_opt(2024, 1, 31),
            max_results: None,
        };

        assert_eq!(
            filter.to_query().unwrap().build().unwrap(),
            "SELECT * FROM Estimate WHERE TxnStatus = 'Accepted' AND CustomerRef = '58' \
             AND DocNumber LIKE '10%' AND TxnDate >= '2024-01-01' AND TxnDate <= '2024-01-31' \
             ORDERBY TxnDate DESC MAXRESULTS 100"
        );
    }

    #[test]
    fn filter_rejects_unknown_status() {
        let filter =
            EstimateFilter { status: Some("Archived".into()), ..EstimateFilter::default() };
        assert!(matches!(filter.to_query(), Err(BackofficeError::Validation(_))));
    }

    #[test]
    fn delivery_requires_fleet_ids() {
        let details = DeliveryDetails {
            motorista_id: String::new(),
            veiculo_id: "v1".into(),
            data_entrega: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            endereco_entrega: None,
            observacoes: None,
        };
        assert!(details.validate().is_err());
    }
}

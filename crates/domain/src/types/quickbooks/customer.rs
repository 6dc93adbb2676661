use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use super::{EmailAddress, MetaData, PhysicalAddress, TelephoneNumber};

/// QuickBooks `Customer`.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Customer {
    pub id: Option<String>,
    pub sync_token: Option<String>,
    pub display_name: Option<String>,
    pub company_name: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub primary_email_addr: Option<EmailAddress>,
    pub primary_phone: Option<TelephoneNumber>,
    pub bill_addr: Option<PhysicalAddress>,
    pub ship_addr: Option<PhysicalAddress>,
    pub active: Option<bool>,
    pub notes: Option<String>,
    /// Lower-case on the wire, unlike every other field.
    #[serde(rename = "sparse")]
    pub sparse: Option<bool>,
    pub meta_data: Option<MetaData>,
}

impl Customer {
    /// Best available display name.
    pub fn name(&self) -> Option<String> {
        self.display_name
            .clone()
            .or_else(|| self.company_name.clone())
            .or_else(|| match (&self.given_name, &self.family_name) {
                (Some(given), Some(family)) => Some(format!("{given} {family}")),
                (Some(given), None) => Some(given.clone()),
                (None, Some(family)) => Some(family.clone()),
                (None, None) => None,
            })
    }

    pub fn email(&self) -> Option<String> {
        self.primary_email_addr.as_ref().and_then(|email| email.address.clone())
    }

    pub fn phone(&self) -> Option<String> {
        self.primary_phone.as_ref().and_then(|phone| phone.free_form_number.clone())
    }
}

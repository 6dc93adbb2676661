//! QuickBooks estimates: CRUD, status, e-mail, PDF and conversion.

pub mod forms;
pub mod service;

pub use forms::{
    ConversionResult, DeliveryDetails, EstimateFilter, EstimateForm, EstimateLineInput,
    EstimatePatch,
};
pub use service::{EstimateService, ESTIMATE_LOG_ENTITY};

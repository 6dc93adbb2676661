//! # Backoffice Core
//!
//! Business logic of the QuickBooks integration boundary. No I/O lives here.
//!
//! This crate contains:
//! - Port interfaces (traits) for storage, the QuickBooks API and webhooks
//! - Services: token refresh, onboarding, entity sync, estimates, webhooks
//! - Local CRUD rules for the back office records
//!
//! ## Architecture Principles
//! - Depends only on `backoffice-domain` and `backoffice-common`
//! - No database, HTTP, or platform code
//! - All external effects go through traits implemented in `backoffice-infra`

pub mod estimates;
pub mod quickbooks;
pub mod records;
pub mod sync;
pub mod webhook;

pub use estimates::{
    ConversionResult, DeliveryDetails, EstimateFilter, EstimateForm, EstimateLineInput,
    EstimatePatch, EstimateService,
};
pub use quickbooks::{
    AccessTokenProvider, ActiveCredential, AuthorizationRequest, ConnectionRepository,
    OAuthOnboarding, OAuthTokenEndpoint, OnboardingSettings, QueryBuilder, QuickBooksGateway,
    QuickBooksTransport, TokenService,
};
pub use records::{
    ClienteRepository, EntregaRepository, LocalStore, MotoristaRepository, PedidoRepository,
    ProdutoRepository, RecordService, VeiculoRepository,
};
pub use sync::{SyncJournal, SyncLogRepository, SyncManager};
pub use webhook::{WebhookOutcome, WebhookReceiver, WebhookSignatureVerifier};

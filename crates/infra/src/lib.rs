//! # Backoffice Infrastructure
//!
//! Adapters for the ports defined in `backoffice-core`.
//!
//! This crate contains:
//! - SQLite repositories for the local records, the QuickBooks connection
//!   and the sync log
//! - The QuickBooks REST transport, OAuth token endpoint and webhook
//!   signature verifier
//! - Configuration loading and tracing initialisation
//!
//! ## Architecture
//! - Implements traits defined in `backoffice-core`
//! - Depends on `backoffice-common`, `backoffice-domain` and `backoffice-core`
//! - Contains all "impure" code (database and network I/O)

pub mod config;
pub mod database;
pub mod errors;
pub mod http;
pub mod integrations;
pub mod observability;

pub use database::{local_store, DbManager};
pub use errors::InfraError;
pub use http::HttpClient;
pub use integrations::{HmacWebhookVerifier, IntuitTokenEndpoint, QuickBooksClient};
pub use observability::{init_tracing, LogFormat};

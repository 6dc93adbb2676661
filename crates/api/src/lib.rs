//! # Backoffice API
//!
//! HTTP layer of the back office: axum routes over the core services.
//!
//! This crate contains:
//! - Routes for QuickBooks onboarding, sync, webhooks and estimates
//! - CRUD routes for the local records
//! - Application context (dependency injection)
//! - Server entry point
//!
//! ## Architecture
//! - Depends on `common`, `domain`, `core`, and `infra`
//! - Wires the infra adapters into the core services
//! - Maps domain errors onto HTTP status codes

pub mod caller;
pub mod context;
pub mod error;
pub mod extract;
pub mod routes;
pub mod utils;

pub use caller::{Caller, Role};
pub use context::AppContext;
pub use error::{ApiError, ApiResult};
pub use routes::build_router;

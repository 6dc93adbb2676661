//! # Backoffice Domain
//!
//! Business domain types for the back office and its QuickBooks Online
//! integration.
//!
//! This crate contains:
//! - Local records (clientes, produtos, pedidos, entregas, frota)
//! - QuickBooks wire types (Customer, Item, Estimate, Invoice)
//! - Domain error types and Result definitions
//! - Configuration structures and constants
//!
//! ## Architecture
//! - No dependencies on other backoffice crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;

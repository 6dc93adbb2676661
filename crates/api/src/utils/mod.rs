//! Shared helpers for the HTTP layer.

pub mod health;
pub mod logging;
pub mod route_helpers;

pub use route_helpers::execute;

//! Shared plumbing for the backoffice crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: PKCE helpers and other pure functions
//! - `runtime`: clock abstraction (adds tracing)
//! - `platform`: SQLite connection pool
//! - `observability`: tracing only

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod auth;

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod time;

// Platform tier
// -------------------------------------------------------------------
#[cfg(feature = "platform")]
pub mod storage;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "foundation")]
pub use auth::pkce::PkceChallenge;
#[cfg(feature = "platform")]
pub use storage::{SqliteConnection, SqlitePool, SqlitePoolConfig, StorageError, StorageResult};
#[cfg(feature = "runtime")]
pub use time::{Clock, MockClock, SystemClock};

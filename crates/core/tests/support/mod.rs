//! Shared test helpers for `backoffice-core` integration tests.
//!
//! In-memory stores and a scripted QuickBooks transport, so service tests
//! can assert on rows written and on every remote call made (or not made).

#![allow(dead_code)]

pub mod quickbooks;
pub mod repositories;

use std::sync::Arc;

use backoffice_common::time::{Clock, MockClock};
use backoffice_core::SyncJournal;
use chrono::{TimeZone, Utc};

pub use quickbooks::{gateway, grant, FixedSignature, MockTokenEndpoint, MockTransport};
pub use repositories::{cliente, MemoryStore};

pub fn clock() -> MockClock {
    MockClock::at(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).single().unwrap_or_else(Utc::now))
}

pub fn shared_clock(clock: &MockClock) -> Arc<dyn Clock> {
    Arc::new(clock.clone())
}

pub fn journal(store: &MemoryStore) -> SyncJournal {
    SyncJournal::new(store.sync_log.clone())
}

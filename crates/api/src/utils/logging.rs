use std::time::Duration;

use tracing::{info, warn};

/// Log the outcome of a handler with structured fields.
///
/// `route` is a stable identifier such as `"estimates::convert_to_invoice"`;
/// never put identifiers or payload values in it.
#[inline]
pub fn log_route_execution(route: &str, elapsed: Duration, outcome: Result<(), &str>) {
    let duration_ms = elapsed.as_millis() as u64;

    match outcome {
        Ok(()) => info!(route, duration_ms, "route_execution_success"),
        Err(error_kind) => warn!(route, duration_ms, error_kind, "route_execution_failure"),
    }
}

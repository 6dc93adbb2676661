//! Tracing subscriber setup
//!
//! `RUST_LOG` wins when set; otherwise the caller's default directive is
//! used. `BACKOFFICE_LOG_FORMAT=json` switches the output to JSON lines.

use tracing_subscriber::{fmt, EnvFilter};

/// Output format of the process-wide subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    /// Reads `BACKOFFICE_LOG_FORMAT`; anything other than `json` is pretty.
    pub fn from_env() -> Self {
        Self::parse(std::env::var("BACKOFFICE_LOG_FORMAT").ok().as_deref())
    }

    fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(value) if value.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Install the global subscriber. Calling it twice is harmless; the second
/// call reports `false`.
pub fn init_tracing(default_directive: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let installed = match LogFormat::from_env() {
        LogFormat::Json => {
            fmt().json().with_env_filter(filter).with_current_span(true).try_init().is_ok()
        }
        LogFormat::Pretty => fmt().with_env_filter(filter).with_target(true).try_init().is_ok(),
    };

    if installed {
        tracing::debug!("tracing initialised");
    }
    installed
}

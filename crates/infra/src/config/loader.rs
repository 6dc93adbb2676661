//! Configuration loader
//!
//! ## Loading Strategy
//! 1. A `.env` file in the working directory (if any) is merged into the
//!    process environment without overriding variables already set
//! 2. Attempt to load from `BACKOFFICE_*` environment variables
//! 3. If a required variable is missing, fall back to a config file
//! 4. JSON and TOML are supported, chosen by extension
//!
//! ## Environment Variables
//! Required:
//! - `BACKOFFICE_DB_PATH`: SQLite database file
//! - `BACKOFFICE_QBO_CLIENT_ID`, `BACKOFFICE_QBO_CLIENT_SECRET`,
//!   `BACKOFFICE_QBO_REDIRECT_URI`: Intuit app credentials
//!
//! Optional:
//! - `BACKOFFICE_DB_POOL_SIZE` (default 8)
//! - `BACKOFFICE_QBO_ENVIRONMENT`: `sandbox` (default) or `production`
//! - `BACKOFFICE_QBO_WEBHOOK_TOKEN`: webhook verifier token
//! - `BACKOFFICE_QBO_MINOR_VERSION` (default 75)
//! - `BACKOFFICE_QBO_API_BASE`, `BACKOFFICE_QBO_TOKEN_URL`: host overrides
//! - `BACKOFFICE_QBO_TIMEOUT_SECS` (default 30)
//! - `BACKOFFICE_QBO_REFRESH_MARGIN_SECS` (default 300)
//! - `BACKOFFICE_BIND_ADDR` (default `0.0.0.0:8080`)
//! - `BACKOFFICE_CORS_ORIGINS`: comma separated list
//!
//! ## File Locations
//! `config.{json,toml}` then `backoffice.{json,toml}` in the working
//! directory, its two parents, and next to the executable.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use backoffice_domain::constants::{
    DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_REFRESH_MARGIN_SECS, QBO_DEFAULT_MINOR_VERSION,
};
use backoffice_domain::{
    BackofficeError, Config, DatabaseConfig, QuickBooksConfig, QuickBooksEnvironment, Result,
    ServerConfig,
};

const DEFAULT_POOL_SIZE: u32 = 8;

/// Load configuration with automatic fallback strategy.
///
/// # Errors
/// Returns `BackofficeError::Config` when neither the environment nor any
/// probed file yields a complete configuration.
pub fn load() -> Result<Config> {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "Ignoring unreadable .env file"),
    }

    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Environment incomplete, trying config file");
            load_from_file(None)
        }
    }
}

/// Load configuration from `BACKOFFICE_*` environment variables.
///
/// # Errors
/// Returns `BackofficeError::Config` if a required variable is missing or a
/// value does not parse.
pub fn load_from_env() -> Result<Config> {
    let database = DatabaseConfig {
        path: env_var("BACKOFFICE_DB_PATH")?,
        pool_size: env_parse("BACKOFFICE_DB_POOL_SIZE", DEFAULT_POOL_SIZE)?,
    };

    let quickbooks = QuickBooksConfig {
        client_id: env_var("BACKOFFICE_QBO_CLIENT_ID")?,
        client_secret: env_var("BACKOFFICE_QBO_CLIENT_SECRET")?,
        redirect_uri: env_var("BACKOFFICE_QBO_REDIRECT_URI")?,
        environment: env_parse("BACKOFFICE_QBO_ENVIRONMENT", QuickBooksEnvironment::Sandbox)?,
        webhook_verifier_token: env_optional("BACKOFFICE_QBO_WEBHOOK_TOKEN"),
        minor_version: env_parse("BACKOFFICE_QBO_MINOR_VERSION", QBO_DEFAULT_MINOR_VERSION)?,
        api_base_url: env_optional("BACKOFFICE_QBO_API_BASE"),
        token_url: env_optional("BACKOFFICE_QBO_TOKEN_URL"),
        request_timeout_secs: env_parse("BACKOFFICE_QBO_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?,
        refresh_margin_secs: env_parse(
            "BACKOFFICE_QBO_REFRESH_MARGIN_SECS",
            DEFAULT_REFRESH_MARGIN_SECS,
        )?,
    };

    let defaults = ServerConfig::default();
    let server = ServerConfig {
        bind_addr: env_optional("BACKOFFICE_BIND_ADDR").unwrap_or(defaults.bind_addr),
        cors_origins: env_optional("BACKOFFICE_CORS_ORIGINS")
            .map(|raw| split_list(&raw))
            .unwrap_or(defaults.cors_origins),
    };

    Ok(Config { database, quickbooks, server })
}

/// Load configuration from a file.
///
/// If `path` is `None`, probes the standard locations (see
/// [`probe_config_paths`]).
///
/// # Errors
/// Returns `BackofficeError::Config` if the file is missing, unreadable, in
/// an unsupported format, or lacks required fields.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) if p.exists() => p,
        Some(p) => {
            return Err(BackofficeError::Config(format!(
                "Config file not found: {}",
                p.display()
            )));
        }
        None => probe_config_paths().ok_or_else(|| {
            BackofficeError::Config("No config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| BackofficeError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| BackofficeError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| BackofficeError::Config(format!("Invalid JSON format: {e}"))),
        other => Err(BackofficeError::Config(format!("Unsupported config format: {other}"))),
    }
}

/// Returns the first existing config file among the standard locations.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.extend([cwd.clone(), cwd.join(".."), cwd.join("../..")]);
    }
    if let Some(exe_dir) =
        std::env::current_exe().ok().and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        roots.push(exe_dir);
    }

    roots
        .iter()
        .flat_map(|root| {
            ["config.json", "config.toml", "backoffice.json", "backoffice.toml"]
                .into_iter()
                .map(move |name| root.join(name))
        })
        .find(|candidate| candidate.exists())
}

fn env_var(key: &str) -> Result<String> {
    env_optional(key).ok_or_else(|| {
        BackofficeError::Config(format!("Missing required environment variable: {key}"))
    })
}

/// Set and non-blank.
fn env_optional(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_optional(key) {
        None => Ok(default),
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| BackofficeError::Config(format!("Invalid value for {key}: {e}"))),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(ToOwned::to_owned).collect()
}

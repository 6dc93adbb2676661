//! QuickBooks company connection and OAuth token material.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{BackofficeError, Result};

/// Stored credential for one connected QuickBooks company (realm).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickBooksConnection {
    pub realm_id: String,
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
    pub refresh_token_expires_at: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl QuickBooksConnection {
    /// Build a fresh active connection from a token grant.
    ///
    /// Fails with `Validation` when a lifetime does not fit a timestamp.
    pub fn from_grant(
        realm_id: impl Into<String>,
        grant: &TokenGrant,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let (expires_at, refresh_token_expires_at) = grant.expiries(now)?;
        Ok(Self {
            realm_id: realm_id.into(),
            access_token: grant.access_token.clone(),
            refresh_token: grant.refresh_token.clone(),
            token_type: grant.token_type.clone(),
            expires_at,
            refresh_token_expires_at,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Overwrite the token pair after a refresh. No history is kept, and
    /// nothing changes when the grant is rejected.
    pub fn apply_grant(&mut self, grant: &TokenGrant, now: DateTime<Utc>) -> Result<()> {
        let (expires_at, refresh_token_expires_at) = grant.expiries(now)?;
        self.access_token = grant.access_token.clone();
        self.refresh_token = grant.refresh_token.clone();
        self.token_type = grant.token_type.clone();
        self.expires_at = expires_at;
        self.refresh_token_expires_at = refresh_token_expires_at;
        self.is_active = true;
        self.updated_at = now;
        Ok(())
    }

    /// True while `now < expires_at - margin`.
    pub fn access_token_usable(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        !self.access_token.is_empty()
            && self.expires_at.checked_sub_signed(margin).is_some_and(|limit| now < limit)
    }

    pub fn refresh_token_expired(&self, now: DateTime<Utc>) -> bool {
        self.refresh_token.is_empty() || now >= self.refresh_token_expires_at
    }

    pub fn status(&self, now: DateTime<Utc>, margin: Duration) -> ConnectionStatus {
        ConnectionStatus {
            connected: self.is_active,
            realm_id: Some(self.realm_id.clone()),
            expires_at: Some(self.expires_at),
            refresh_token_expires_at: Some(self.refresh_token_expires_at),
            access_token_valid: self.is_active && self.access_token_usable(now, margin),
        }
    }
}

impl fmt::Debug for QuickBooksConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuickBooksConnection")
            .field("realm_id", &self.realm_id)
            .field("access_token", &format_args!("<{} chars>", self.access_token.len()))
            .field("refresh_token", &format_args!("<{} chars>", self.refresh_token.len()))
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .field("refresh_token_expires_at", &self.refresh_token_expires_at)
            .field("is_active", &self.is_active)
            .finish_non_exhaustive()
    }
}

/// Token endpoint response (`authorization_code` and `refresh_token` grants).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    /// Refresh token lifetime in seconds.
    #[serde(rename = "x_refresh_token_expires_in")]
    pub refresh_token_expires_in: i64,
}

impl fmt::Debug for TokenGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenGrant")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("refresh_token_expires_in", &self.refresh_token_expires_in)
            .finish_non_exhaustive()
    }
}

impl TokenGrant {
    /// Access and refresh token expiry instants counted from `now`.
    pub fn expiries(&self, now: DateTime<Utc>) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        Ok((expiry(now, self.expires_in)?, expiry(now, self.refresh_token_expires_in)?))
    }
}

fn expiry(now: DateTime<Utc>, lifetime_secs: i64) -> Result<DateTime<Utc>> {
    Duration::try_seconds(lifetime_secs)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .ok_or_else(|| {
            BackofficeError::Validation(format!(
                "token lifetime of {lifetime_secs}s is out of range"
            ))
        })
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Connection state exposed to operators. Never carries token values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatus {
    pub connected: bool,
    pub realm_id: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub refresh_token_expires_at: Option<DateTime<Utc>>,
    pub access_token_valid: bool,
}

impl ConnectionStatus {
    pub fn not_configured() -> Self {
        Self {
            connected: false,
            realm_id: None,
            expires_at: None,
            refresh_token_expires_at: None,
            access_token_valid: false,
        }
    }
}

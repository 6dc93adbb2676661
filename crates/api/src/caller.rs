//! Request-scoped caller identity.
//!
//! The authenticating proxy in front of the server sets `x-user-id` and
//! `x-user-role`; handlers take a [`Caller`] and check the role they need.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use backoffice_domain::BackofficeError;

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Manager,
    Operator,
}

impl Role {
    /// Unknown roles get the least privilege.
    fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "admin" => Self::Admin,
            "manager" => Self::Manager,
            _ => Self::Operator,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: String,
    pub role: Role,
}

impl Caller {
    /// QuickBooks mutations: admin or manager.
    pub fn require_manager(&self) -> Result<(), ApiError> {
        match self.role {
            Role::Admin | Role::Manager => Ok(()),
            Role::Operator => Err(forbidden(self)),
        }
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        match self.role {
            Role::Admin => Ok(()),
            Role::Manager | Role::Operator => Err(forbidden(self)),
        }
    }
}

fn forbidden(caller: &Caller) -> ApiError {
    tracing::warn!(user_id = %caller.user_id, role = ?caller.role, "caller lacks role");
    ApiError::Forbidden("insufficient role for this operation".into())
}

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = header(parts, USER_ID_HEADER).ok_or_else(|| {
            ApiError::from(BackofficeError::Auth("missing caller identity".into()))
        })?;
        let role = header(parts, USER_ROLE_HEADER).map(Role::parse).unwrap_or(Role::Operator);

        Ok(Self { user_id: user_id.to_string(), role })
    }
}

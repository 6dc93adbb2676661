//! QuickBooks Online boundary: credentials, typed API access, queries.

pub mod gateway;
pub mod onboarding;
pub mod ports;
pub mod query;
pub mod token_service;

pub use gateway::QuickBooksGateway;
pub use onboarding::{AuthorizationRequest, OAuthOnboarding, OnboardingSettings};
pub use ports::{
    AccessTokenProvider, ActiveCredential, ConnectionRepository, OAuthTokenEndpoint,
    QuickBooksTransport,
};
pub use query::QueryBuilder;
pub use token_service::TokenService;

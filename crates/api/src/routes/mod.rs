//! HTTP surface of the back office.

mod estimates;
mod health;
mod quickbooks;
mod records;
mod sync_logs;

use std::sync::Arc;

use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::caller::{USER_ID_HEADER, USER_ROLE_HEADER};
use crate::context::AppContext;

/// Every route, with CORS and request tracing applied.
pub fn build_router(ctx: Arc<AppContext>) -> Router {
    let cors = cors_layer(&ctx.config.server.cors_origins);

    Router::new()
        .merge(health::router())
        .merge(quickbooks::router())
        .merge(sync_logs::router())
        .merge(estimates::router())
        .merge(records::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

/// No configured origins allows any origin (development setups).
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(USER_ID_HEADER),
            HeaderName::from_static(USER_ROLE_HEADER),
        ]);

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(parsed))
}

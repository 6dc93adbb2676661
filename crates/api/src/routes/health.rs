use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use crate::context::AppContext;
use crate::utils::health::HealthStatus;

pub fn router() -> Router<Arc<AppContext>> {
    Router::new().route("/health", get(health))
}

/// 200 when healthy, 503 otherwise; the body is the same report either way.
async fn health(State(ctx): State<Arc<AppContext>>) -> (StatusCode, Json<HealthStatus>) {
    let status = ctx.health_check().await;
    let code = if status.is_healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (code, Json(status))
}

//! Back office HTTP server.

use std::sync::Arc;

use anyhow::Context;
use backoffice_api::{build_router, AppContext};
use backoffice_infra::{config, init_tracing};
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("info,backoffice=debug,tower_http=info");

    let config = config::load().context("failed to load configuration")?;
    let bind_addr = config.server.bind_addr.clone();

    let ctx = AppContext::new(config).context("failed to initialize application context")?;
    let app = build_router(Arc::new(ctx));

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    info!(addr = %bind_addr, "backoffice server listening");

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    info!("backoffice server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c; shutting down");
    }
    info!("shutdown signal received");
}

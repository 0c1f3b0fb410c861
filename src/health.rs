use anyhow::{Context, Result};
use axum::{routing::get, Router};
use tracing::info;

const ALIVE: &str = "Bot is running";

async fn alive() -> &'static str {
    ALIVE
}

fn router() -> Router {
    Router::new()
        .route("/", get(alive))
        .route("/health", get(alive))
}

/// Serve the liveness endpoint until the process exits.
pub async fn serve(bind: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind liveness endpoint to {bind}"))?;

    info!("Liveness endpoint listening on http://{}", bind);

    axum::serve(listener, router())
        .await
        .context("Liveness endpoint error")
}

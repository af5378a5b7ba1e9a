//! Liveness endpoint polled by the uptime monitor.

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::error::BotError;

/// Body returned by `GET /`.
pub const ALIVE_BODY: &str = "Bot is running!";

/// Router serving the liveness route.
pub fn router() -> Router {
    Router::new().route("/", get(|| async { ALIVE_BODY }))
}

/// Bind the liveness listener.
///
/// # Errors
///
/// Returns an error if the address cannot be bound.
pub async fn bind(host: &str, port: u16) -> Result<TcpListener, BotError> {
    let listener = TcpListener::bind((host, port)).await?;
    info!(addr = %listener.local_addr()?, "liveness endpoint listening");
    Ok(listener)
}

/// Serve the liveness route on its own task so it never competes with
/// gateway event handling.
pub fn spawn(listener: TcpListener) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router()).await {
            error!(error = %e, "liveness endpoint stopped");
        }
    })
}

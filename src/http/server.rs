//! HTTP server startup logic.

use std::net::SocketAddr;

use axum::Router;
use axum_server::Handle;
use tokio::runtime::Runtime;

use super::shutdown;

/// Server startup error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("Failed to bind server to {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// Build the multi-threaded runtime the server runs on.
pub fn build_runtime() -> Result<Runtime, ServerError> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(ServerError::Runtime)
}

/// Start the runtime and serve `app` on `addr` until shutdown.
///
/// Worker threads only exist from this point on, so everything that touches
/// process-wide state (environment, global subscriber) must run before.
pub fn serve(app: Router, addr: SocketAddr) -> Result<(), ServerError> {
    build_runtime()?.block_on(start_server(app, addr))
}

/// Start the HTTP server on `addr`.
///
/// This function blocks until the server shuts down.
pub async fn start_server(app: Router, addr: SocketAddr) -> Result<(), ServerError> {
    let handle = Handle::new();

    tracing::info!(%addr, "Starting HTTP server");

    shutdown::setup_shutdown_handler(handle.clone());

    axum_server::bind(addr)
        .handle(handle)
        .serve(app.into_make_service())
        .await
        .map_err(|source| ServerError::Bind { addr, source })
}

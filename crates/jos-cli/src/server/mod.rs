//! HTTP server startup with lifecycle management and graceful shutdown.

mod error;
mod http_server;
mod lifecycle;
mod shutdown;

use axum::Router;
pub use error::{Result, ServerError};
use http_server::serve_http;

use crate::TRACING_TARGET_SERVER_SHUTDOWN;
use crate::config::ServerConfig;

/// Serves `app` over plain HTTP until a shutdown signal arrives.
///
/// TLS is expected to terminate at the ingress in front of the gateway.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the address cannot be
/// bound, or the server fails while running.
pub async fn serve(app: Router, config: ServerConfig) -> Result<()> {
    serve_http(app, config).await.map_err(report)
}

/// Logs the error code and recovery suggestion of a server error.
fn report(error: ServerError) -> ServerError {
    tracing::error!(
        target: TRACING_TARGET_SERVER_SHUTDOWN,
        error_code = error.error_code(),
        suggestion = error.suggestion(),
        "Server failed"
    );
    error
}

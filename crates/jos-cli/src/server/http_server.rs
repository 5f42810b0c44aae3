//! HTTP server startup.

use std::io;
use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;

use crate::TRACING_TARGET_SERVER_STARTUP;
use crate::config::ServerConfig;
use crate::server::lifecycle::serve_with_shutdown;
use crate::server::shutdown::{drain_deadline, shutdown_signal};
use crate::server::{Result, ServerError};

/// Binds the configured address and serves `app` with graceful shutdown.
///
/// After a shutdown signal, open connections get the configured shutdown
/// timeout to finish before the server gives up on them.
pub async fn serve_http(app: Router, server_config: ServerConfig) -> Result<()> {
    server_config
        .validate()
        .map_err(|error| ServerError::invalid_config(&error))?;

    let server_addr = server_config.server_addr();
    let listener = TcpListener::bind(server_addr).await.map_err(|error| {
        tracing::error!(
            target: TRACING_TARGET_SERVER_STARTUP,
            addr = %server_addr,
            error = %error,
            "Failed to bind to address"
        );
        ServerError::bind_error(&server_addr.to_string(), error)
    })?;

    tracing::info!(
        target: TRACING_TARGET_SERVER_STARTUP,
        addr = %server_addr,
        "Server is ready and listening for connections"
    );

    let (signal, started) = shutdown_signal();
    let deadline = drain_deadline(started, server_config.shutdown_timeout());

    serve_with_shutdown(&server_config, || async move {
        let server = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(signal)
        .into_future();

        tokio::select! {
            result = server => result,
            () = deadline => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                "graceful shutdown timed out",
            )),
        }
    })
    .await
    .map_err(|error| match error.kind() {
        io::ErrorKind::TimedOut => ServerError::ShutdownTimeout(server_config.shutdown_timeout),
        _ => ServerError::Runtime(error),
    })
}

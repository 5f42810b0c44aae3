//! Graceful shutdown signal handling.

use std::future::pending;
use std::time::Duration;

use tokio::signal::ctrl_c;
#[cfg(unix)]
use tokio::signal::unix;
use tokio::sync::oneshot;

use crate::TRACING_TARGET_SERVER_SHUTDOWN;

/// Waits for SIGINT (Ctrl+C) or, on Unix, SIGTERM and returns its name.
///
/// A handler that cannot be installed is logged and never fires.
pub async fn wait_for_signal() -> &'static str {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => "SIGINT",
            Err(error) => {
                tracing::error!(
                    target: TRACING_TARGET_SERVER_SHUTDOWN,
                    error = %error,
                    "Failed to install Ctrl+C handler"
                );
                pending().await
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match unix::signal(unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
                "SIGTERM"
            }
            Err(error) => {
                tracing::error!(
                    target: TRACING_TARGET_SERVER_SHUTDOWN,
                    error = %error,
                    "Failed to install SIGTERM handler"
                );
                pending().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = pending::<&'static str>();

    tokio::select! {
        signal = ctrl_c => signal,
        signal = terminate => signal,
    }
}

/// Shutdown future for `axum::serve`, paired with a receiver that resolves
/// once the signal has been received.
pub fn shutdown_signal() -> (impl Future<Output = ()>, oneshot::Receiver<()>) {
    let (started, receiver) = oneshot::channel();

    let signal = async move {
        let signal = wait_for_signal().await;
        tracing::info!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            signal,
            "Graceful shutdown initiated"
        );
        let _ = started.send(());
    };

    (signal, receiver)
}

/// Resolves `timeout` after shutdown has started; never resolves otherwise.
pub async fn drain_deadline(started: oneshot::Receiver<()>, timeout: Duration) {
    if started.await.is_err() {
        return pending().await;
    }

    tokio::time::sleep(timeout).await;
    tracing::warn!(
        target: TRACING_TARGET_SERVER_SHUTDOWN,
        timeout_secs = timeout.as_secs(),
        "Connections still open after the shutdown timeout"
    );
}

//! Errors raised while assembling the service state.

/// Result type alias for service initialization.
pub type Result<T, E = ServiceError> = std::result::Result<T, E>;

/// Failure to build one of the gateway's collaborators.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("failed to initialize registry client: {0}")]
    Harbor(#[from] jos_harbor::Error),

    #[error("failed to connect to cluster: {0}")]
    Kube(#[from] jos_kube::Error),

    #[error("failed to initialize metrics client: {0}")]
    Prometheus(#[from] jos_prometheus::Error),
}

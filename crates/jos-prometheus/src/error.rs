//! Error types for Prometheus queries.

/// Result type alias for Prometheus operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error type for Prometheus operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Prometheus answered with a status other than 200.
    #[error("unexpected status code: {0}")]
    UnexpectedStatus(u16),

    /// Prometheus accepted the request but reported a query error.
    #[error("query failed: {0}")]
    Query(String),

    /// Transport level failure.
    #[error("error querying Prometheus: {0}")]
    Http(#[from] reqwest::Error),

    /// A sample value could not be parsed as a float.
    #[error("error decoding response: {0}")]
    Decode(String),
}

//! Error types for registry operations.

/// Result type alias for registry operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error type for all Harbor registry operations.
#[derive(Debug, thiserror::Error)]
#[must_use = "registry errors should be handled appropriately"]
pub enum Error {
    /// The chart upload endpoint answered with a non-2xx status.
    ///
    /// The upstream status code and response body are kept verbatim.
    #[error("harbor API error: status {status}, body: {body}")]
    Registry { status: u16, body: String },

    /// A Harbor v2 API call answered with a non-2xx status.
    #[error("harbor API returned status {0}")]
    UnexpectedStatus(u16),

    /// Transport level failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Local file could not be opened or read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The repository `index.yaml` or `repositories.yaml` could not be decoded.
    #[error("invalid YAML document: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Invalid client configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Returns the upstream HTTP status code, if the error carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Registry { status, .. } => Some(*status),
            Self::UnexpectedStatus(status) => Some(*status),
            Self::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

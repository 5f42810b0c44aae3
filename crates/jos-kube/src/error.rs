//! Error types for cluster operations.

/// Result type alias for cluster operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error type for all cluster operations.
#[derive(Debug, thiserror::Error)]
#[must_use = "cluster errors should be handled appropriately"]
pub enum Error {
    /// The API server rejected the request or could not be reached.
    #[error("kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    /// The client configuration could not be inferred.
    #[error("failed to infer kubernetes config: {0}")]
    Config(#[from] kube::config::InferConfigError),

    /// A request field is missing or malformed.
    #[error("{0}")]
    InvalidInput(String),

    /// The target resource already exists.
    #[error("{0}")]
    Conflict(String),

    /// A pod owner reference without the controller flag was found.
    #[error("Pod owner is not a controller")]
    NotController,

    /// Workloads can only be cloned from Deployments and StatefulSets.
    #[error("unsupported controlledBy kind")]
    UnsupportedKind(String),

    /// The owner chain did not reach a root controller in time.
    #[error("owner chain of {0} exceeds the hop limit")]
    OwnerChainTooLong(String),
}

impl Error {
    /// Returns the API server status code, if the error carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Kube(kube::Error::Api(response)) => Some(response.code),
            _ => None,
        }
    }

    /// Returns `true` if the API server reported the resource as missing.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

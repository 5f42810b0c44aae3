//! Error types for helm operations.

/// Result type alias for helm operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error type for helm operations.
#[derive(Debug, thiserror::Error)]
#[must_use = "helm errors should be handled appropriately"]
pub enum Error {
    /// The helm binary could not be started.
    #[error("failed to run helm: {0}")]
    Spawn(#[from] std::io::Error),

    /// helm exited with a non-zero status.
    #[error("helm {command} failed: {stderr}")]
    Command { command: String, stderr: String },

    /// helm did not finish within the configured timeout.
    #[error("helm {0} timed out")]
    Timeout(String),

    /// The JSON printed by helm could not be decoded.
    #[error("invalid helm output: {0}")]
    Output(#[from] serde_json::Error),

    /// A release manifest is not valid YAML.
    #[error("failed to decode manifest: {0}")]
    Manifest(#[from] serde_yaml::Error),

    /// Release values are neither a YAML nor a JSON mapping.
    #[error("invalid values: {0}")]
    Values(String),

    /// A request field is missing or malformed.
    #[error("{0}")]
    InvalidInput(String),
}

impl Error {
    /// Returns `true` if helm reported the release as missing.
    pub fn is_release_not_found(&self) -> bool {
        matches!(self, Self::Command { stderr, .. } if stderr.contains("not found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_detected_from_stderr() {
        let error = Error::Command {
            command: "status".to_owned(),
            stderr: "Error: release: not found".to_owned(),
        };
        assert!(error.is_release_not_found());
        assert_eq!(error.to_string(), "helm status failed: Error: release: not found");

        let error = Error::Command {
            command: "install".to_owned(),
            stderr: "Error: INSTALLATION FAILED: timed out".to_owned(),
        };
        assert!(!error.is_release_not_found());
    }
}

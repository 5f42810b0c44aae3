//! Cluster error to HTTP error conversion.

use jos_kube::Error as KubeError;

use super::http_error::{Error as HttpError, ErrorKind};

/// Tracing target for cluster error conversions.
const TRACING_TARGET: &str = "jos_server::handler::kube";

impl From<KubeError> for HttpError<'static> {
    fn from(error: KubeError) -> Self {
        let message = error.to_string();

        match error {
            KubeError::InvalidInput(_) | KubeError::NotController | KubeError::UnsupportedKind(_) => {
                ErrorKind::BadRequest.with_message(message)
            }
            KubeError::Conflict(_) => ErrorKind::Conflict.with_message(message),
            ref error if error.is_not_found() => {
                tracing::debug!(target: TRACING_TARGET, error = %error, "Resource not found");
                ErrorKind::NotFound.with_message(message)
            }
            ref error if error.status() == Some(409) => ErrorKind::Conflict.with_message(message),
            KubeError::OwnerChainTooLong(_) => {
                tracing::warn!(target: TRACING_TARGET, error = %message, "Owner walk aborted");
                ErrorKind::InternalServerError.with_message(message)
            }
            error => {
                tracing::error!(target: TRACING_TARGET, error = %error, "Cluster operation failed");
                ErrorKind::InternalServerError.with_message(message)
            }
        }
    }
}

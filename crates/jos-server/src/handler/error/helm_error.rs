//! Helm error to HTTP error conversion.

use jos_helm::Error as HelmError;

use super::http_error::{Error as HttpError, ErrorKind};

/// Tracing target for helm error conversions.
const TRACING_TARGET: &str = "jos_server::handler::helm";

impl From<HelmError> for HttpError<'static> {
    fn from(error: HelmError) -> Self {
        let message = error.to_string();

        match error {
            HelmError::InvalidInput(_) | HelmError::Values(_) => {
                ErrorKind::BadRequest.with_message(message)
            }
            ref error if error.is_release_not_found() => ErrorKind::NotFound.with_message(message),
            HelmError::Spawn(_) => {
                tracing::error!(target: TRACING_TARGET, error = %message, "helm binary unavailable");
                ErrorKind::ServiceUnavailable.with_message(message)
            }
            error => {
                tracing::error!(target: TRACING_TARGET, error = %error, "helm command failed");
                ErrorKind::InternalServerError.with_message(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_release_is_not_found() {
        let error: HttpError = HelmError::Command {
            command: "uninstall".to_owned(),
            stderr: "Error: uninstall: Release not loaded: web: release: not found".to_owned(),
        }
        .into();
        assert_eq!(error.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn invalid_input_is_bad_request() {
        let error: HttpError = HelmError::InvalidInput("namespace is required".to_owned()).into();
        assert_eq!(error.kind(), ErrorKind::BadRequest);
        assert_eq!(error.message(), Some("namespace is required"));
    }
}

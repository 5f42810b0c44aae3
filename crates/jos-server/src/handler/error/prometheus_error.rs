//! Metrics query error to HTTP error conversion.

use jos_prometheus::Error as PrometheusError;

use super::http_error::{Error as HttpError, ErrorKind};

impl From<PrometheusError> for HttpError<'static> {
    fn from(error: PrometheusError) -> Self {
        tracing::warn!(
            target: "jos_server::handler::prometheus",
            error = %error,
            "Metrics query failed"
        );

        ErrorKind::InternalServerError.with_message(error.to_string())
    }
}

//! Registry error to HTTP error conversion.

use jos_harbor::Error as HarborError;

use super::http_error::{Error as HttpError, ErrorKind};

/// Tracing target for registry error conversions.
const TRACING_TARGET: &str = "jos_server::handler::harbor";

impl From<HarborError> for HttpError<'static> {
    fn from(error: HarborError) -> Self {
        tracing::warn!(
            target: TRACING_TARGET,
            error = %error,
            upstream_status = error.status(),
            "Registry request failed"
        );

        ErrorKind::InternalServerError
            .with_message(error.to_string())
            .with_resource("harbor")
    }
}

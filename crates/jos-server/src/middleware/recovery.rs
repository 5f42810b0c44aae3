//! Envelope rendering for failures raised outside the handlers.
//!
//! Handlers already answer with the gateway envelope. This layer covers what
//! they never see: requests that outlive the request timeout, handler panics,
//! and bare `413`/`405` responses produced by body limits and method routing.

use std::any::Any;
use std::time::Duration;

use axum::Router;
use axum::error_handling::HandleErrorLayer;
use axum::http::{Method, StatusCode, Uri, header};
use axum::middleware::map_response;
use axum::response::{IntoResponse, Response};
#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use tower::timeout::TimeoutLayer;
use tower::timeout::error::Elapsed;
use tower::{BoxError, ServiceBuilder};
use tower_http::catch_panic::CatchPanicLayer;

use crate::handler::ErrorKind;
use crate::middleware::MAX_BODY_SIZE;

const TRACING_TARGET: &str = "jos_server::middleware::recovery";

/// Default request timeout, longer than the default helm invocation timeout
/// so an install or upgrade reports helm's own failure first.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 330;

/// Request timeout applied to every route.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct RecoveryConfig {
    /// Seconds a request may run before it is answered with `503`.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "REQUEST_TIMEOUT", default_value = "330")
    )]
    pub request_timeout: u64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl RecoveryConfig {
    /// Returns the request timeout, using the default if zero.
    pub fn request_timeout(&self) -> Duration {
        match self.request_timeout {
            0 => Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            secs => Duration::from_secs(secs),
        }
    }
}

/// Extension trait for `axum::`[`Router`] to apply recovery middleware.
pub trait RouterRecoveryExt<S> {
    /// Layers the request timeout, panic recovery and envelope rendering of
    /// bare error responses.
    fn with_recovery(self, config: &RecoveryConfig) -> Self;
}

impl<S> RouterRecoveryExt<S> for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_recovery(self, config: &RecoveryConfig) -> Self {
        let timeout = config.request_timeout();
        let middlewares = ServiceBuilder::new()
            .layer(HandleErrorLayer::new(
                move |method: Method, uri: Uri, err: BoxError| async move {
                    handle_error(&method, &uri, timeout, err)
                },
            ))
            .layer(CatchPanicLayer::custom(catch_panic))
            .layer(TimeoutLayer::new(timeout));

        self.layer(map_response(wrap_bare_errors)).layer(middlewares)
    }
}

fn handle_error(method: &Method, uri: &Uri, timeout: Duration, err: BoxError) -> Response {
    let path = uri.path();

    if err.is::<Elapsed>() {
        tracing::warn!(
            target: TRACING_TARGET,
            %method,
            path,
            timeout_secs = timeout.as_secs(),
            "Request timed out"
        );

        return ErrorKind::ServiceUnavailable
            .with_message(format!(
                "{method} {path} did not finish within {} seconds",
                timeout.as_secs()
            ))
            .into_response();
    }

    tracing::error!(target: TRACING_TARGET, %method, path, error = %err, "Middleware failed");
    ErrorKind::InternalServerError
        .with_message(format!("{method} {path} failed"))
        .with_context(err.to_string())
        .into_response()
}

fn catch_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("non-string panic payload");

    tracing::error!(target: TRACING_TARGET, detail, "Handler panicked");
    ErrorKind::InternalServerError
        .with_message("The request handler failed unexpectedly")
        .with_context(detail.to_owned())
        .into_response()
}

/// Renders `413` and `405` responses without a JSON body as envelopes.
async fn wrap_bare_errors(response: Response) -> Response {
    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .is_some_and(|value| value.as_bytes().starts_with(b"application/json"));
    if is_json {
        return response;
    }

    match response.status() {
        StatusCode::PAYLOAD_TOO_LARGE => ErrorKind::PayloadTooLarge
            .with_message(format!(
                "Request body exceeds {} MiB",
                MAX_BODY_SIZE / (1024 * 1024)
            ))
            .into_response(),
        StatusCode::METHOD_NOT_ALLOWED => ErrorKind::MethodNotAllowed.into_response(),
        _ => response,
    }
}

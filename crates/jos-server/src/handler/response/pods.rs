use std::convert::Infallible;

use axum::body::Body;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use futures::Stream;
use jiff::Timestamp;
use jos_prometheus::PodUsage;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Aggregated resource usage of the pods of a release.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReleaseMetrics {
    /// Number of applications covered, always `1`.
    pub app_num: i32,
    pub pod_num: i32,
    /// CPU usage, e.g. `0.25 cores`.
    pub cpu_usage: String,
    /// Memory working set, e.g. `128.00 MB`.
    pub mem_usage: String,
}

impl ReleaseMetrics {
    pub fn new(pod_num: usize, usage: PodUsage) -> Self {
        Self {
            app_num: 1,
            pod_num: pod_num as i32,
            cpu_usage: format!("{:.2} cores", usage.cpu_cores),
            mem_usage: format!("{:.2} MB", usage.memory_mb),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DeletedPod {
    pub deletion_timestamp: Timestamp,
}

/// Acknowledgement of a rollout strategy request.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StrategyAck {
    pub message: String,
    pub created_at: Timestamp,
}

/// Chunked `text/plain` body written line by line.
pub struct LogStream(Body);

impl LogStream {
    pub fn new<S>(lines: S) -> Self
    where
        S: Stream<Item = Result<String, Infallible>> + Send + 'static,
    {
        Self(Body::from_stream(lines))
    }
}

impl IntoResponse for LogStream {
    fn into_response(self) -> Response {
        ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], self.0).into_response()
    }
}

impl aide::OperationOutput for LogStream {
    type Inner = String;

    fn operation_response(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) -> Option<aide::openapi::Response> {
        <String as aide::OperationOutput>::operation_response(ctx, operation)
    }

    fn inferred_responses(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) -> Vec<(Option<u16>, aide::openapi::Response)> {
        <String as aide::OperationOutput>::inferred_responses(ctx, operation)
    }
}

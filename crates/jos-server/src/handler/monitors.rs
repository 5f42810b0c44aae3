//! Health check handler.
//!
//! The check is public and asks the cluster API server for its version on
//! every request.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum::http::StatusCode;
use jos_kube::KubeClient;

use crate::extract::Json;
use crate::handler::Result;
use crate::handler::response::MonitorStatus;
use crate::service::{ServiceState, check_cluster};

/// Tracing target for monitor operations.
const TRACING_TARGET: &str = "jos_server::handler::monitors";

#[tracing::instrument(skip_all)]
async fn health_status(
    State(kube): State<KubeClient>,
) -> Result<(StatusCode, Json<MonitorStatus>)> {
    let health = check_cluster(&kube).await;
    let is_healthy = health.is_healthy;

    let status_code = if is_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    tracing::debug!(
        target: TRACING_TARGET,
        is_healthy,
        status_code = status_code.as_u16(),
        "Health status response prepared"
    );

    Ok((
        status_code,
        Json(MonitorStatus {
            is_healthy,
            updated_at: health.checked_at,
        }),
    ))
}

fn health_status_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Health status")
        .description("Reports whether the cluster API server answers within five seconds.")
        .response::<200, Json<MonitorStatus>>()
        .response::<503, Json<MonitorStatus>>()
}

/// Returns a [`Router`] with all health monitoring routes.
///
/// [`Router`]: axum::routing::Router
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route("/health", get_with(health_status, health_status_docs))
        .with_path_items(|item| item.tag("Health"))
}

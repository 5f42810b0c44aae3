//! Pod telemetry, deletion and rollout strategy handlers.
//!
//! Metrics are summed over every pod of a release from two instant queries
//! per pod. The strategy routes only acknowledge their requests.

use std::convert::Infallible;
use std::time::Duration;

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum::http::StatusCode;
use jiff::Timestamp;
use jos_kube::KubeClient;
use jos_kube::query::PodRepository;
use jos_prometheus::{PodUsage, PrometheusClient};

use crate::extract::{Json, Path, Query};
use crate::handler::request::{PodPath, ReleasePods, StrategyRequest, namespace_or_default};
use crate::handler::response::{
    DeletedPod, Envelope, ErrorResponse, LogStream, ReleaseMetrics, StrategyAck,
};
use crate::handler::{ErrorKind, Result};
use crate::service::ServiceState;

/// Tracing target for pod operations.
const TRACING_TARGET: &str = "jos_server::handler::pods";

/// Lines written by the simulated log stream.
const SIMULATED_LOG_LINES: [&str; 4] = [
    "Starting container...",
    "Container started successfully",
    "Application initialized",
    "Listening on port 8080",
];

/// Delay between two simulated log lines.
const LOG_LINE_INTERVAL: Duration = Duration::from_millis(500);

/// Sums CPU and memory usage over the pods of a release.
#[tracing::instrument(skip_all, fields(release = %query.release_name))]
async fn pods_metrics(
    State(kube): State<KubeClient>,
    State(prometheus): State<PrometheusClient>,
    Query(query): Query<ReleasePods>,
) -> Result<(StatusCode, Json<Envelope<ReleaseMetrics>>)> {
    let namespace = namespace_or_default(query.namespace);
    let pods = kube
        .list_release_pods(&namespace, &query.release_name)
        .await?;

    let mut usage = PodUsage::default();
    for pod in &pods {
        let name = pod.metadata.name.as_deref().unwrap_or_default();
        let pod_usage = prometheus
            .pod_usage(&namespace, name)
            .await
            .map_err(|error| {
                tracing::error!(target: TRACING_TARGET, pod = name, error = %error, "Metrics query failed");
                ErrorKind::InternalServerError
                    .with_message(format!("Failed to get metrics for pod {name}: {error}"))
            })?;
        usage = usage + pod_usage;
    }

    tracing::debug!(
        target: TRACING_TARGET,
        pod_count = pods.len(),
        cpu_cores = usage.cpu_cores,
        memory_mb = usage.memory_mb,
        "Release metrics collected"
    );

    Ok((
        StatusCode::OK,
        Json(Envelope::new(
            "Metrics retrieved successfully",
            ReleaseMetrics::new(pods.len(), usage),
        )),
    ))
}

fn pods_metrics_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Release metrics")
        .description(
            "Sums the 5 minute CPU rate and the memory working set over every pod of the release.",
        )
        .response::<200, Json<Envelope<ReleaseMetrics>>>()
        .response::<500, Json<ErrorResponse>>()
}

/// Streams simulated container logs as chunked plain text.
#[tracing::instrument(skip_all, fields(namespace = %path.namespace, pod = %path.pod))]
async fn pod_logs(Path(path): Path<PodPath>) -> LogStream {
    tracing::debug!(target: TRACING_TARGET, "Streaming pod logs");

    LogStream::new(async_stream::stream! {
        for (index, line) in SIMULATED_LOG_LINES.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(LOG_LINE_INTERVAL).await;
            }
            yield Ok::<_, Infallible>(format!("{line}\n"));
        }
    })
}

fn pod_logs_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Stream pod logs")
        .description("Streams four simulated log lines, one every 500 ms.")
        .response::<200, LogStream>()
}

#[tracing::instrument(skip_all, fields(namespace = %path.namespace, pod = %path.pod))]
async fn delete_pod(
    State(kube): State<KubeClient>,
    Path(path): Path<PodPath>,
) -> Result<(StatusCode, Json<Envelope<DeletedPod>>)> {
    let deletion_timestamp = kube.delete_pod(&path.namespace, &path.pod).await?;

    Ok((
        StatusCode::OK,
        Json(Envelope::new(
            "Pod deleted successfully",
            DeletedPod { deletion_timestamp },
        )),
    ))
}

fn delete_pod_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Delete pod")
        .response::<200, Json<Envelope<DeletedPod>>>()
        .response::<404, Json<ErrorResponse>>()
        .response::<500, Json<ErrorResponse>>()
}

fn acknowledge(request: &StrategyRequest, message: &str) -> (StatusCode, Json<Envelope<StrategyAck>>) {
    tracing::info!(
        target: TRACING_TARGET,
        namespace = %request.namespace,
        name = %request.name,
        setting_count = request.settings.len(),
        "{message}"
    );

    let ack = StrategyAck {
        message: message.to_owned(),
        created_at: Timestamp::now(),
    };
    (StatusCode::OK, Json(Envelope::new(message, ack)))
}

async fn configure_hpa(
    Json(request): Json<StrategyRequest>,
) -> Result<(StatusCode, Json<Envelope<StrategyAck>>)> {
    Ok(acknowledge(&request, "HPA configured successfully"))
}

async fn configure_vpa(
    Json(request): Json<StrategyRequest>,
) -> Result<(StatusCode, Json<Envelope<StrategyAck>>)> {
    Ok(acknowledge(&request, "VPA configured successfully"))
}

async fn create_canary(
    Json(request): Json<StrategyRequest>,
) -> Result<(StatusCode, Json<Envelope<StrategyAck>>)> {
    Ok(acknowledge(&request, "Canary deployment created successfully"))
}

async fn create_blue_green(
    Json(request): Json<StrategyRequest>,
) -> Result<(StatusCode, Json<Envelope<StrategyAck>>)> {
    Ok(acknowledge(
        &request,
        "Blue-green deployment created successfully",
    ))
}

fn strategy_docs(op: TransformOperation) -> TransformOperation {
    op.description("Acknowledges the request; no cluster object is changed yet.")
        .response::<200, Json<Envelope<StrategyAck>>>()
        .response::<400, Json<ErrorResponse>>()
}

/// Returns a [`Router`] with all pod routes.
///
/// [`Router`]: axum::routing::Router
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route(
            "/v1alpha1/pods/metrics",
            get_with(pods_metrics, pods_metrics_docs),
        )
        .api_route(
            "/v1alpha1/pods/{namespace}/{pod}",
            delete_with(delete_pod, delete_pod_docs),
        )
        .api_route(
            "/v1alpha1/pods/{namespace}/{pod}/logs",
            get_with(pod_logs, pod_logs_docs),
        )
        .api_route(
            "/v1alpha1/pods/hpa",
            post_with(configure_hpa, |op| {
                strategy_docs(op.summary("Configure horizontal autoscaling"))
            }),
        )
        .api_route(
            "/v1alpha1/pods/vpa",
            post_with(configure_vpa, |op| {
                strategy_docs(op.summary("Configure vertical autoscaling"))
            }),
        )
        .api_route(
            "/v1alpha1/pods/canary",
            post_with(create_canary, |op| {
                strategy_docs(op.summary("Create canary deployment"))
            }),
        )
        .api_route(
            "/v1alpha1/pods/bluegreen",
            post_with(create_blue_green, |op| {
                strategy_docs(op.summary("Create blue-green deployment"))
            }),
        )
        .with_path_items(|item| item.tag("Pods"))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::Router;
    use axum::extract::Query as AxumQuery;
    use axum::routing::{delete, get};
    use serde_json::{Value, json};

    use super::*;
    use crate::handler::test::{TestContext, spawn_upstream};

    fn pod_list() -> Value {
        json!({
            "apiVersion": "v1",
            "kind": "PodList",
            "metadata": {},
            "items": [
                {"metadata": {"name": "shop-web-1", "namespace": "prod"}},
                {"metadata": {"name": "shop-web-2", "namespace": "prod"}}
            ]
        })
    }

    async fn spawn_cluster() -> anyhow::Result<String> {
        let router = Router::new()
            .route(
                "/api/v1/namespaces/{namespace}/pods",
                get(|| async { axum::Json(pod_list()) }),
            )
            .route(
                "/api/v1/namespaces/{namespace}/pods/{pod}",
                delete(|| async {
                    axum::Json(json!({
                        "apiVersion": "v1",
                        "kind": "Pod",
                        "metadata": {
                            "name": "shop-web-1",
                            "namespace": "prod",
                            "deletionTimestamp": "2024-03-01T10:00:00Z"
                        }
                    }))
                }),
            );
        spawn_upstream(router).await
    }

    async fn prometheus_query(
        AxumQuery(query): AxumQuery<HashMap<String, String>>,
    ) -> axum::Json<Value> {
        let promql = query.get("query").cloned().unwrap_or_default();
        let value = if promql.contains("container_cpu_usage_seconds_total") {
            "0.125"
        } else {
            "134217728"
        };
        axum::Json(json!({
            "status": "success",
            "data": {
                "resultType": "vector",
                "result": [{"metric": {"pod": "shop"}, "value": [1_700_000_000.0, value]}]
            }
        }))
    }

    #[tokio::test]
    async fn metrics_are_summed_over_release_pods() -> anyhow::Result<()> {
        let cluster = spawn_cluster().await?;
        let prometheus =
            spawn_upstream(Router::new().route("/api/v1/query", get(prometheus_query))).await?;
        let ctx = TestContext::builder()
            .with_kube_url(&cluster)
            .with_prometheus_url(&prometheus)
            .build()?;
        let server = ctx.server(routes())?;

        let response = server
            .get("/v1alpha1/pods/metrics")
            .add_query_param("namespace", "prod")
            .add_query_param("release_name", "shop")
            .await;
        response.assert_status_ok();

        let envelope = response.json::<Envelope<ReleaseMetrics>>();
        assert_eq!(envelope.message, "Metrics retrieved successfully");
        let metrics = envelope.data.ok_or_else(|| anyhow::anyhow!("missing metrics"))?;
        assert_eq!(metrics.app_num, 1);
        assert_eq!(metrics.pod_num, 2);
        assert_eq!(metrics.cpu_usage, "0.25 cores");
        assert_eq!(metrics.mem_usage, "256.00 MB");
        Ok(())
    }

    #[tokio::test]
    async fn metrics_failure_names_the_pod() -> anyhow::Result<()> {
        let cluster = spawn_cluster().await?;
        let prometheus = spawn_upstream(Router::new().route(
            "/api/v1/query",
            get(|| async { StatusCode::BAD_GATEWAY }),
        ))
        .await?;
        let ctx = TestContext::builder()
            .with_kube_url(&cluster)
            .with_prometheus_url(&prometheus)
            .build()?;
        let server = ctx.server(routes())?;

        let response = server
            .get("/v1alpha1/pods/metrics")
            .add_query_param("release_name", "shop")
            .await;
        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);

        let body = response.json::<Value>();
        let message = body["message"].as_str().unwrap_or_default();
        assert!(message.starts_with("Failed to get metrics for pod shop-web-1"));
        assert!(message.contains("502"));
        Ok(())
    }

    #[tokio::test]
    async fn delete_pod_returns_deletion_timestamp() -> anyhow::Result<()> {
        let cluster = spawn_cluster().await?;
        let ctx = TestContext::builder().with_kube_url(&cluster).build()?;
        let server = ctx.server(routes())?;

        let response = server.delete("/v1alpha1/pods/prod/shop-web-1").await;
        response.assert_status_ok();

        let envelope = response.json::<Envelope<DeletedPod>>();
        assert_eq!(envelope.message, "Pod deleted successfully");
        let deleted = envelope.data.ok_or_else(|| anyhow::anyhow!("missing pod"))?;
        assert_eq!(deleted.deletion_timestamp, "2024-03-01T10:00:00Z".parse::<Timestamp>()?);
        Ok(())
    }

    #[tokio::test]
    async fn logs_are_streamed_as_text() -> anyhow::Result<()> {
        let ctx = TestContext::builder().build()?;
        let server = ctx.server(routes())?;

        let response = server.get("/v1alpha1/pods/prod/shop-web-1/logs").await;
        response.assert_status_ok();
        assert!(response.header("content-type").to_str()?.starts_with("text/plain"));
        assert_eq!(
            response.text(),
            "Starting container...\nContainer started successfully\n\
             Application initialized\nListening on port 8080\n"
        );
        Ok(())
    }

    #[tokio::test]
    async fn strategies_are_acknowledged() -> anyhow::Result<()> {
        let ctx = TestContext::builder().build()?;
        let server = ctx.server(routes())?;

        let cases = [
            ("/v1alpha1/pods/hpa", "HPA configured successfully"),
            ("/v1alpha1/pods/vpa", "VPA configured successfully"),
            ("/v1alpha1/pods/canary", "Canary deployment created successfully"),
            ("/v1alpha1/pods/bluegreen", "Blue-green deployment created successfully"),
        ];

        for (path, message) in cases {
            let response = server
                .post(path)
                .json(&json!({"namespace": "prod", "name": "shop", "minReplicas": 2}))
                .await;
            response.assert_status_ok();

            let envelope = response.json::<Envelope<StrategyAck>>();
            assert_eq!(envelope.message, message);
            assert_eq!(envelope.data.map(|ack| ack.message).as_deref(), Some(message));
        }
        Ok(())
    }
}

//! Helm release lifecycle handlers.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum::http::StatusCode;
use jiff::Timestamp;
use jos_helm::{HelmClient, InstallRequest, InstalledChart, UpgradeRequest, parse_values};
use jos_kube::KubeClient;
use jos_kube::model::PodStatusInfo;
use jos_kube::query::PodRepository;

use crate::extract::{Json, Query, ValidateJson};
use crate::handler::request::{
    InstallChart, ListInstalledCharts, ReleasePods, RollbackChart, UninstallChart, UpgradeChart,
    namespace_or_default,
};
use crate::handler::response::{Envelope, ErrorResponse, InstalledRelease, UpgradedRelease};
use crate::handler::{ErrorKind, Result};
use crate::service::ServiceState;

/// Tracing target for release operations.
const TRACING_TARGET: &str = "jos_server::handler::releases";

/// Installs a chart from the registry.
///
/// An existing release with the same name is left untouched. With `dry_run`
/// only the values document is checked.
#[tracing::instrument(
    skip_all,
    fields(
        namespace = %request.namespace,
        release = %request.release_name,
        chart = %request.name,
        dry_run = request.dry_run,
    )
)]
async fn install_chart(
    State(helm): State<HelmClient>,
    ValidateJson(request): ValidateJson<InstallChart>,
) -> Result<(StatusCode, Json<Envelope<InstalledRelease>>)> {
    let values = match request.values.as_deref().filter(|v| !v.trim().is_empty()) {
        Some(values) => parse_values(values)?,
        None => Default::default(),
    };

    if request.dry_run {
        tracing::debug!(target: TRACING_TARGET, "Values accepted, dry run only");
        let release = InstalledRelease {
            release_name: request.release_name,
            ..InstalledRelease::default()
        };
        return Ok((
            StatusCode::OK,
            Json(Envelope::new("Dry run succeeded", release)),
        ));
    }

    helm.refresh_repository().await?;

    if helm
        .status(&request.namespace, &request.release_name)
        .await?
        .is_some()
    {
        tracing::info!(target: TRACING_TARGET, "Release already exists, skipping installation");
        let release = InstalledRelease {
            release_name: request.release_name,
            ..InstalledRelease::default()
        };
        return Ok((
            StatusCode::OK,
            Json(Envelope::new(
                "Release already exists, skipping installation",
                release,
            )),
        ));
    }

    let mut install = InstallRequest::new(&request.namespace, &request.release_name, &request.name)
        .with_values(values);
    if let Some(version) = request.version.filter(|v| !v.is_empty()) {
        install = install.with_version(version);
    }

    let release = helm.install(&install).await.map_err(|error| {
        ErrorKind::InternalServerError
            .with_message(format!("Failed to install chart: {error}"))
            .with_resource("release")
    })?;
    let resources = release.resources()?;

    tracing::info!(
        target: TRACING_TARGET,
        revision = release.version,
        resource_count = resources.len(),
        "Chart installed"
    );

    let message = release.info.description.clone();
    let release = InstalledRelease::new(&release, resources);
    Ok((StatusCode::OK, Json(Envelope::new(message, release))))
}

fn install_chart_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Install chart")
        .description(
            "Installs a registry chart as a new release and lists the objects its manifest \
             renders. A failed install is rolled back by uninstalling the release.",
        )
        .response::<200, Json<Envelope<InstalledRelease>>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<500, Json<ErrorResponse>>()
}

/// Uninstalls a release and waits for its resources to be deleted.
#[tracing::instrument(skip_all, fields(namespace = %query.namespace, release = %query.release_name))]
async fn uninstall_chart(
    State(helm): State<HelmClient>,
    Query(query): Query<UninstallChart>,
) -> Result<(StatusCode, Json<Envelope<()>>)> {
    if query.namespace.is_empty() {
        return Err(ErrorKind::BadRequest.with_message("namespace is required"));
    }

    helm.uninstall(&query.namespace, &query.release_name).await?;

    tracing::info!(target: TRACING_TARGET, "Chart uninstalled");
    Ok((
        StatusCode::OK,
        Json(Envelope::message("Chart uninstalled successfully")),
    ))
}

fn uninstall_chart_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Uninstall chart")
        .response::<200, Json<Envelope<()>>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

#[tracing::instrument(skip_all, fields(release = %request.release_name, force = request.force))]
async fn upgrade_chart(
    State(helm): State<HelmClient>,
    ValidateJson(request): ValidateJson<UpgradeChart>,
) -> Result<(StatusCode, Json<Envelope<UpgradedRelease>>)> {
    let namespace = namespace_or_default(request.namespace);
    let chart = request.chart;

    let upgrade = UpgradeRequest::new(&namespace, &request.release_name, &chart.chart_name)
        .with_version(chart.chart_version)
        .with_force(request.force)
        .with_values(chart.values);
    let release = helm.upgrade(&upgrade).await?;

    tracing::info!(target: TRACING_TARGET, revision = release.version, "Chart upgraded");
    Ok((
        StatusCode::OK,
        Json(Envelope::new(
            "Chart upgraded successfully",
            UpgradedRelease::from(&release),
        )),
    ))
}

fn upgrade_chart_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Upgrade chart")
        .description("Upgrades a release to another chart version with flat string values.")
        .response::<200, Json<Envelope<UpgradedRelease>>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<500, Json<ErrorResponse>>()
}

#[tracing::instrument(skip_all, fields(release = %request.release_name, revision = %request.revision))]
async fn rollback_chart(
    State(helm): State<HelmClient>,
    ValidateJson(request): ValidateJson<RollbackChart>,
) -> Result<(StatusCode, Json<Envelope<()>>)> {
    let revision: i32 = request.revision.trim().parse().map_err(|error| {
        ErrorKind::BadRequest.with_message(format!("invalid revision: {error}"))
    })?;
    let namespace = namespace_or_default(request.namespace);

    helm.rollback(&namespace, &request.release_name, revision)
        .await?;

    tracing::info!(target: TRACING_TARGET, "Chart rolled back");
    Ok((
        StatusCode::OK,
        Json(Envelope::message("Chart rolled back successfully")),
    ))
}

fn rollback_chart_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Roll back chart")
        .response::<200, Json<Envelope<()>>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<500, Json<ErrorResponse>>()
}

/// Lists the releases of a namespace, optionally with their manifests.
#[tracing::instrument(skip_all, fields(namespace = %query.namespace))]
async fn list_installed_charts(
    State(helm): State<HelmClient>,
    Query(query): Query<ListInstalledCharts>,
) -> Result<(StatusCode, Json<Envelope<Vec<InstalledChart>>>)> {
    if query.namespace.is_empty() {
        return Err(ErrorKind::BadRequest.with_message("namespace is required"));
    }

    let releases = helm
        .list(&query.namespace, query.release_name.as_deref())
        .await?;
    if releases.is_empty() {
        return Ok((
            StatusCode::OK,
            Json(Envelope::new("No installed charts found", Vec::new())),
        ));
    }

    let mut charts = Vec::with_capacity(releases.len());
    for release in &releases {
        let chart = InstalledChart::from(release);
        let chart = if query.with_manifest {
            chart.with_manifest(helm.manifest(&release.namespace, &release.name).await?)
        } else {
            chart
        };
        charts.push(chart);
    }

    tracing::debug!(target: TRACING_TARGET, release_count = charts.len(), "Releases listed");

    let message = format!("Found {} installed charts", charts.len());
    Ok((StatusCode::OK, Json(Envelope::new(message, charts))))
}

fn list_installed_charts_docs(op: TransformOperation) -> TransformOperation {
    op.summary("List installed charts")
        .response::<200, Json<Envelope<Vec<InstalledChart>>>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<500, Json<ErrorResponse>>()
}

/// Reports the status of every pod of a release.
#[tracing::instrument(skip_all, fields(release = %query.release_name))]
async fn list_pod_status(
    State(kube): State<KubeClient>,
    Query(query): Query<ReleasePods>,
) -> Result<(StatusCode, Json<Envelope<Vec<PodStatusInfo>>>)> {
    let namespace = namespace_or_default(query.namespace);
    let pods = kube
        .list_release_pods(&namespace, &query.release_name)
        .await?;

    let now = Timestamp::now();
    let statuses: Vec<_> = pods
        .iter()
        .map(|pod| PodStatusInfo::from_pod(pod, now))
        .collect();

    let message = format!("Found {} pods", statuses.len());
    Ok((StatusCode::OK, Json(Envelope::new(message, statuses))))
}

fn list_pod_status_docs(op: TransformOperation) -> TransformOperation {
    op.summary("List release pods")
        .description(
            "Lists the pods labelled `app.kubernetes.io/instance=<release>` with container \
             readiness, age and a kubectl-style status.",
        )
        .response::<200, Json<Envelope<Vec<PodStatusInfo>>>>()
        .response::<500, Json<ErrorResponse>>()
}

/// Returns a [`Router`] with all release routes.
///
/// [`Router`]: axum::routing::Router
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route(
            "/v1alpha1/releases",
            post_with(install_chart, install_chart_docs)
                .get_with(list_installed_charts, list_installed_charts_docs)
                .put_with(upgrade_chart, upgrade_chart_docs)
                .delete_with(uninstall_chart, uninstall_chart_docs),
        )
        .api_route(
            "/v1alpha1/releases/rollback",
            post_with(rollback_chart, rollback_chart_docs),
        )
        .api_route(
            "/v1alpha1/releases/pods",
            get_with(list_pod_status, list_pod_status_docs),
        )
        .with_path_items(|item| item.tag("Releases"))
}

#[cfg(all(test, unix))]
mod tests {
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    use serde_json::{Value, json};

    use super::*;
    use crate::handler::test::TestContext;

    const RELEASE_JSON: &str = r#"{"name":"shop","namespace":"prod","version":3,"info":{"first_deployed":"2024-03-01T10:00:00Z","last_deployed":"2024-03-02T10:00:00Z","deleted":"","description":"Install complete","status":"deployed"},"manifest":"---\napiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: shop-web\n  namespace: prod\n"}"#;

    /// Writes a stand-in helm that knows release `shop` only after install.
    fn fake_helm(dir: &Path) -> anyhow::Result<PathBuf> {
        std::fs::write(dir.join("release.json"), RELEASE_JSON)?;

        let script = r#"#!/bin/sh
dir=$(dirname "$0")
echo "$@" >> "$dir/calls.log"
release=""
positional=""
for arg in "$@"; do
  if [ -n "$positional" ] && [ -z "$release" ]; then release="$arg"; fi
  if [ "$arg" = "--" ]; then positional=1; fi
done
case "$1" in
  status)
    if [ "$release" = "existing" ]; then cat "$dir/release.json"; else echo "Error: release: not found" >&2; exit 1; fi ;;
  install|upgrade)
    cat > /dev/null
    cat "$dir/release.json" ;;
  list)
    if [ "$2" = "--namespace=empty" ]; then echo '[]'; else
    echo '[{"name":"shop","namespace":"prod","revision":"3","status":"deployed","chart":"nginx-1.2.3","app_version":"1.25"}]'; fi ;;
  get)
    echo "kind: Deployment" ;;
esac
"#;
        let path = dir.join("helm");
        std::fs::write(&path, script)?;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
        Ok(path)
    }

    fn calls(dir: &Path) -> String {
        std::fs::read_to_string(dir.join("calls.log")).unwrap_or_default()
    }

    #[tokio::test]
    async fn install_reports_release_and_resources() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let ctx = TestContext::builder()
            .with_helm_bin(fake_helm(dir.path())?)
            .build()?;
        let server = ctx.server(routes())?;

        let response = server
            .post("/v1alpha1/releases")
            .json(&json!({
                "namespace": "prod",
                "release_name": "shop",
                "name": "nginx",
                "version": "1.2.3",
                "values": "replicaCount: 2",
            }))
            .await;
        response.assert_status_ok();

        let envelope = response.json::<Envelope<InstalledRelease>>();
        assert_eq!(envelope.message, "Install complete");
        let release = envelope.data.ok_or_else(|| anyhow::anyhow!("missing release"))?;
        assert_eq!(release.release_name, "shop");
        assert_eq!(release.status, "deployed");
        assert_eq!(release.resources.len(), 1);
        assert_eq!(release.resources[0].kind, "Deployment");

        let calls = calls(dir.path());
        assert!(calls.contains("install --namespace=prod"));
        assert!(calls.contains("--version=1.2.3 -- shop harbor/nginx"));
        Ok(())
    }

    #[tokio::test]
    async fn install_skips_existing_release() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let ctx = TestContext::builder()
            .with_helm_bin(fake_helm(dir.path())?)
            .build()?;
        let server = ctx.server(routes())?;

        let response = server
            .post("/v1alpha1/releases")
            .json(&json!({"namespace": "prod", "release_name": "existing", "name": "nginx"}))
            .await;
        response.assert_status_ok();

        let envelope = response.json::<Envelope<InstalledRelease>>();
        assert_eq!(envelope.message, "Release already exists, skipping installation");
        assert!(!calls(dir.path()).contains("install --namespace"));
        Ok(())
    }

    #[tokio::test]
    async fn install_requires_namespace() -> anyhow::Result<()> {
        let ctx = TestContext::builder().build()?;
        let server = ctx.server(routes())?;

        let response = server
            .post("/v1alpha1/releases")
            .json(&json!({"namespace": "", "release_name": "shop", "name": "nginx"}))
            .await;
        response.assert_status_bad_request();
        assert_eq!(response.json::<Value>()["message"], "namespace is required");
        Ok(())
    }

    #[tokio::test]
    async fn flag_like_release_name_never_reaches_helm() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let ctx = TestContext::builder()
            .with_helm_bin(fake_helm(dir.path())?)
            .build()?;
        let server = ctx.server(routes())?;

        let response = server
            .post("/v1alpha1/releases")
            .json(&json!({
                "namespace": "prod",
                "release_name": "--post-renderer=/tmp/evil",
                "name": "nginx",
            }))
            .await;
        response.assert_status_bad_request();
        let message = response.json::<Value>()["message"].as_str().unwrap_or_default().to_owned();
        assert!(message.starts_with("invalid release_name"));

        let response = server
            .delete("/v1alpha1/releases")
            .add_query_param("namespace", "prod")
            .add_query_param("release_name", "--kubeconfig=/tmp/x")
            .await;
        response.assert_status_bad_request();

        assert!(calls(dir.path()).is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn dry_run_only_parses_values() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let ctx = TestContext::builder()
            .with_helm_bin(fake_helm(dir.path())?)
            .build()?;
        let server = ctx.server(routes())?;

        let request = json!({
            "namespace": "prod",
            "release_name": "shop",
            "name": "nginx",
            "values": "{\"replicaCount\": 2}",
            "dry_run": true,
        });
        server
            .post("/v1alpha1/releases")
            .json(&request)
            .await
            .assert_status_ok();
        assert!(calls(dir.path()).is_empty());

        let request = json!({
            "namespace": "prod",
            "release_name": "shop",
            "name": "nginx",
            "values": "- [unbalanced",
            "dry_run": true,
        });
        server
            .post("/v1alpha1/releases")
            .json(&request)
            .await
            .assert_status_bad_request();
        Ok(())
    }

    #[tokio::test]
    async fn rollback_rejects_non_numeric_revision() -> anyhow::Result<()> {
        let ctx = TestContext::builder().build()?;
        let server = ctx.server(routes())?;

        let response = server
            .post("/v1alpha1/releases/rollback")
            .json(&json!({"release_name": "shop", "revision": "latest"}))
            .await;
        response.assert_status_bad_request();

        let body = response.json::<Value>();
        let message = body["message"].as_str().unwrap_or_default();
        assert!(message.starts_with("invalid revision: "));
        Ok(())
    }

    #[tokio::test]
    async fn upgrade_defaults_namespace() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let ctx = TestContext::builder()
            .with_helm_bin(fake_helm(dir.path())?)
            .build()?;
        let server = ctx.server(routes())?;

        let response = server
            .put("/v1alpha1/releases")
            .json(&json!({
                "release_name": "shop",
                "force": true,
                "chart": {"chart_name": "nginx", "chart_version": "1.3.0", "values": {"tag": "v2"}},
            }))
            .await;
        response.assert_status_ok();

        let upgraded = response
            .json::<Envelope<UpgradedRelease>>()
            .data
            .ok_or_else(|| anyhow::anyhow!("missing release"))?;
        assert_eq!(upgraded.revision, 3);

        let calls = calls(dir.path());
        assert!(calls.contains("upgrade --namespace=default"));
        assert!(calls.contains("-- shop harbor/nginx"));
        assert!(calls.contains("--force"));
        Ok(())
    }

    #[tokio::test]
    async fn list_installed_charts_with_manifest() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let ctx = TestContext::builder()
            .with_helm_bin(fake_helm(dir.path())?)
            .build()?;
        let server = ctx.server(routes())?;

        let response = server
            .get("/v1alpha1/releases")
            .add_query_param("namespace", "prod")
            .add_query_param("with_manifest", true)
            .await;
        response.assert_status_ok();

        let envelope = response.json::<Envelope<Vec<InstalledChart>>>();
        assert_eq!(envelope.message, "Found 1 installed charts");
        let charts = envelope.data.unwrap_or_default();
        assert_eq!(charts[0].chart_name, "nginx");
        assert_eq!(charts[0].chart_version, "1.2.3");
        assert_eq!(charts[0].manifest.as_deref().map(str::trim), Some("kind: Deployment"));

        let response = server
            .get("/v1alpha1/releases")
            .add_query_param("namespace", "empty")
            .await;
        assert_eq!(
            response.json::<Envelope<Vec<InstalledChart>>>().message,
            "No installed charts found"
        );
        Ok(())
    }

    #[tokio::test]
    async fn list_installed_charts_requires_namespace() -> anyhow::Result<()> {
        let ctx = TestContext::builder().build()?;
        let server = ctx.server(routes())?;

        server
            .get("/v1alpha1/releases")
            .await
            .assert_status_bad_request();
        Ok(())
    }
}

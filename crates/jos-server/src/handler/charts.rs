//! Chart upload and registry listing handlers.
//!
//! The upload route streams a packaged chart into a staging file while
//! hashing it, then forwards the staged file to the registry. The staging
//! file is owned by a [`StagedChart`] guard and removed on every exit path.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum::http::StatusCode;
use jos_harbor::{ChartPage, HarborClient};

use crate::extract::{Json, Multipart, Query};
use crate::handler::request::ListCharts;
use crate::handler::response::{Envelope, ErrorResponse, UploadOutcome};
use crate::handler::{ErrorKind, Result};
use crate::service::{CHART_EXTENSION, ChartFileName, ChartStaging, ServiceState, StagedChart};

/// Tracing target for chart operations.
const TRACING_TARGET: &str = "jos_server::handler::charts";

/// Multipart field carrying the chart archive.
const CHART_FIELD: &str = "chart";

/// Repository charts are pushed to when the form names none.
const DEFAULT_REPOSITORY: &str = "library";

/// Form fields read alongside the chart archive.
#[derive(Debug, Default)]
struct UploadForm {
    chart_name: Option<String>,
    chart_version: Option<String>,
    repo_name: Option<String>,
}

impl UploadForm {
    /// Rejects overrides that would add path syntax to the remote file name.
    fn validate(&self) -> Result<()> {
        let fields = [
            ("chart_name", &self.chart_name),
            ("chart_version", &self.chart_version),
            ("repo_name", &self.repo_name),
        ];
        for (field, value) in fields {
            if let Some(value) = value.as_deref().filter(|value| !value.is_empty())
                && !ChartFileName::is_path_segment(value)
            {
                return Err(ErrorKind::BadRequest.with_message(format!("Invalid {field}: {value}")));
            }
        }
        Ok(())
    }

    fn repository(&self) -> &str {
        self.repo_name
            .as_deref()
            .filter(|repo| !repo.is_empty())
            .unwrap_or(DEFAULT_REPOSITORY)
    }
}

/// Uploads a packaged chart and pushes it to the registry.
///
/// Form data:
/// - `chart`: the `.tgz` archive
/// - `chart_name`, `chart_version`: override the name and version derived
///   from the file name
/// - `repo_name`: target repository, `library` by default
#[tracing::instrument(skip_all)]
async fn upload_chart(
    State(harbor): State<HarborClient>,
    State(staging): State<ChartStaging>,
    Multipart(mut multipart): Multipart,
) -> Result<(StatusCode, Json<UploadOutcome>)> {
    let mut staged: Option<(ChartFileName, StagedChart)> = None;
    let mut form = UploadForm::default();

    while let Some(mut field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_owned();
        match name.as_str() {
            CHART_FIELD if staged.is_none() => {
                let raw_name = field.file_name().unwrap_or_default().to_owned();
                let Some(file_name) = ChartFileName::base_name(&raw_name) else {
                    tracing::debug!(
                        target: TRACING_TARGET,
                        file_name = %raw_name,
                        "Rejected chart with unusable file name"
                    );
                    return Err(ErrorKind::BadRequest.with_message("Invalid chart file name"));
                };
                if !file_name.ends_with(CHART_EXTENSION) {
                    tracing::debug!(
                        target: TRACING_TARGET,
                        file_name = %file_name,
                        "Rejected chart with unsupported extension"
                    );
                    return Err(ErrorKind::BadRequest.with_message("Only .tgz files are allowed"));
                }

                let chart = ChartFileName::parse(file_name);
                let mut file = staging.create(&chart).await.map_err(|error| {
                    tracing::error!(target: TRACING_TARGET, error = %error, "Staging failed");
                    ErrorKind::InternalServerError.with_message(error.to_string())
                })?;

                while let Some(chunk) = field.chunk().await? {
                    file.write(&chunk).await.map_err(|error| {
                        tracing::error!(target: TRACING_TARGET, error = %error, "Write failed");
                        ErrorKind::InternalServerError
                            .with_message(format!("Failed to save file: {error}"))
                    })?;
                }

                staged = Some((chart, file));
            }
            "chart_name" => form.chart_name = Some(field.text().await?),
            "chart_version" => form.chart_version = Some(field.text().await?),
            "repo_name" => form.repo_name = Some(field.text().await?),
            _ => {}
        }
    }

    let Some((chart, mut file)) = staged else {
        return Err(ErrorKind::BadRequest.with_message(format!(
            "Failed to get chart file: missing multipart field '{CHART_FIELD}'"
        )));
    };

    let digest = file.finish().await.map_err(|error| {
        ErrorKind::InternalServerError.with_message(format!("Failed to save file: {error}"))
    })?;

    form.validate()?;
    let file_name = chart
        .with_overrides(form.chart_name.as_deref(), form.chart_version.as_deref())
        .file_name();
    let repository = form.repository();

    tracing::debug!(
        target: TRACING_TARGET,
        file_name = %file_name,
        repository = %repository,
        size = file.size(),
        "Chart staged, pushing to registry"
    );

    let pushed = harbor.push_chart(file.path(), repository, &file_name).await;
    let size = file.size();
    file.remove().await;

    let chart_url = pushed.map_err(|error| {
        ErrorKind::InternalServerError
            .with_message(format!("Failed to push to Harbor: {error}"))
            .with_resource("harbor")
    })?;

    tracing::info!(
        target: TRACING_TARGET,
        chart_url = %chart_url,
        digest = %digest,
        size,
        "Chart uploaded"
    );

    let outcome = UploadOutcome {
        success: true,
        message: "Chart uploaded successfully".to_owned(),
        chart_url: Some(chart_url),
        size_received: Some(size),
        digest: Some(digest),
    };

    Ok((StatusCode::OK, Json(outcome)))
}

fn upload_chart_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Upload chart")
        .description(
            "Stages a `.tgz` chart archive, computes its SHA-256 digest and pushes it to the \
             registry. The staged file is removed once the request completes.",
        )
        .response::<200, Json<UploadOutcome>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<413, Json<ErrorResponse>>()
        .response::<500, Json<ErrorResponse>>()
}

async fn upload_method_not_allowed() -> crate::handler::Error<'static> {
    ErrorKind::MethodNotAllowed.with_message("Only POST method is allowed")
}

/// Lists one page of the charts in the registry index.
#[tracing::instrument(skip_all, fields(limit = query.limit, size = query.size))]
async fn list_charts(
    State(harbor): State<HarborClient>,
    Query(query): Query<ListCharts>,
) -> Result<(StatusCode, Json<Envelope<ChartPage>>)> {
    if query.limit <= 0 || query.size <= 0 {
        return Err(ErrorKind::BadRequest.with_message("Invalid limit or size"));
    }

    let index = harbor.fetch_index().await?;
    let page = ChartPage::paginate(
        index.charts(),
        query.limit,
        query.size,
        query.keyword.as_deref(),
    )
    .ok_or_else(|| ErrorKind::BadRequest.with_message("Invalid limit or size"))?;

    tracing::debug!(
        target: TRACING_TARGET,
        total = page.total,
        returned = page.charts.len(),
        "Charts listed"
    );

    Ok((
        StatusCode::OK,
        Json(Envelope::new("Charts retrieved successfully", page)),
    ))
}

fn list_charts_docs(op: TransformOperation) -> TransformOperation {
    op.summary("List charts")
        .description(
            "Pages the charts of the registry index. `limit` is the 1-based page number; \
             `keyword` filters the selected page on name or description.",
        )
        .response::<200, Json<Envelope<ChartPage>>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<500, Json<ErrorResponse>>()
}

/// Returns the public upload route.
pub fn upload_routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route(
            "/v1alpha1/chart/upload",
            post_with(upload_chart, upload_chart_docs),
        )
        .route(
            "/v1alpha1/chart/upload",
            axum::routing::any(upload_method_not_allowed),
        )
        .with_path_items(|item| item.tag("Charts"))
}

/// Returns the authenticated chart routes.
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route("/v1alpha1/charts", get_with(list_charts, list_charts_docs))
        .with_path_items(|item| item.tag("Charts"))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::Router;
    use axum::extract::State as AxumState;
    use axum::routing::{get, post};
    use axum_test::multipart::{MultipartForm, Part};
    use serde_json::Value;
    use sha2::{Digest, Sha256};

    use super::*;
    use crate::handler::test::{TestContext, spawn_upstream};

    /// Registry stub counting pushes and recording the last file name.
    #[derive(Clone, Default)]
    struct Registry {
        pushes: Arc<AtomicUsize>,
        last_file: Arc<std::sync::Mutex<Option<String>>>,
    }

    async fn accept_chart(
        AxumState(registry): AxumState<Registry>,
        mut multipart: axum::extract::Multipart,
    ) -> StatusCode {
        while let Ok(Some(field)) = multipart.next_field().await {
            if field.name() == Some("chart") {
                let file_name = field.file_name().map(str::to_owned);
                let _ = field.bytes().await;
                if let Ok(mut last_file) = registry.last_file.lock() {
                    *last_file = file_name;
                }
                registry.pushes.fetch_add(1, Ordering::SeqCst);
                return StatusCode::CREATED;
            }
        }
        StatusCode::BAD_REQUEST
    }

    async fn spawn_registry(registry: Registry) -> anyhow::Result<String> {
        let router = Router::new()
            .route("/api/chartrepo/{repo}/charts", post(accept_chart))
            .with_state(registry);
        spawn_upstream(router).await
    }

    fn chart_form(file_name: &str, bytes: &'static [u8]) -> MultipartForm {
        MultipartForm::new().add_part(
            "chart",
            Part::bytes(bytes)
                .file_name(file_name)
                .mime_type("application/gzip"),
        )
    }

    fn staged_files(ctx: &TestContext) -> anyhow::Result<usize> {
        match std::fs::read_dir(ctx.staging_dir()) {
            Ok(entries) => Ok(entries.count()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(0),
            Err(error) => Err(error.into()),
        }
    }

    #[tokio::test]
    async fn upload_pushes_chart_and_reports_digest() -> anyhow::Result<()> {
        let registry = Registry::default();
        let base = spawn_registry(registry.clone()).await?;
        let ctx = TestContext::builder().with_harbor_url(&base).build()?;
        let server = ctx.server(upload_routes())?;

        let bytes: &'static [u8] = b"packaged chart bytes";
        let response = server
            .post("/v1alpha1/chart/upload")
            .multipart(chart_form("nginx-1.2.3.tgz", bytes))
            .await;
        response.assert_status_ok();

        let outcome = response.json::<UploadOutcome>();
        assert!(outcome.success);
        assert_eq!(outcome.message, "Chart uploaded successfully");
        assert_eq!(outcome.size_received, Some(bytes.len() as u64));
        assert_eq!(
            outcome.digest,
            Some(format!("sha256:{}", hex::encode(Sha256::digest(bytes))))
        );
        assert_eq!(
            outcome.chart_url.as_deref(),
            Some(format!("{base}/chartrepo/library/charts/nginx-1.2.3.tgz").as_str())
        );
        assert_eq!(staged_files(&ctx)?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn upload_without_version_defaults() -> anyhow::Result<()> {
        let registry = Registry::default();
        let base = spawn_registry(registry.clone()).await?;
        let ctx = TestContext::builder().with_harbor_url(&base).build()?;
        let server = ctx.server(upload_routes())?;

        server
            .post("/v1alpha1/chart/upload")
            .multipart(chart_form("nginx.tgz", b"chart"))
            .await
            .assert_status_ok();

        let last_file = registry.last_file.lock().map(|f| f.clone()).ok().flatten();
        assert_eq!(last_file.as_deref(), Some("nginx-1.0.0.tgz"));
        Ok(())
    }

    #[tokio::test]
    async fn upload_honors_overrides() -> anyhow::Result<()> {
        let registry = Registry::default();
        let base = spawn_registry(registry.clone()).await?;
        let ctx = TestContext::builder().with_harbor_url(&base).build()?;
        let server = ctx.server(upload_routes())?;

        let form = chart_form("nginx-1.2.3.tgz", b"chart")
            .add_text("chart_name", "web")
            .add_text("chart_version", "2.0.0")
            .add_text("repo_name", "apps");
        let response = server.post("/v1alpha1/chart/upload").multipart(form).await;
        response.assert_status_ok();

        let outcome = response.json::<UploadOutcome>();
        assert_eq!(
            outcome.chart_url.as_deref(),
            Some(format!("{base}/chartrepo/apps/charts/web-2.0.0.tgz").as_str())
        );
        Ok(())
    }

    #[tokio::test]
    async fn upload_rejects_other_extensions_before_io() -> anyhow::Result<()> {
        let registry = Registry::default();
        let base = spawn_registry(registry.clone()).await?;
        let ctx = TestContext::builder().with_harbor_url(&base).build()?;
        let server = ctx.server(upload_routes())?;

        for file_name in ["nginx-1.2.3.zip", "nginx.tar.gz", "chart"] {
            let response = server
                .post("/v1alpha1/chart/upload")
                .multipart(chart_form(file_name, b"chart"))
                .await;
            response.assert_status_bad_request();

            let body = response.json::<Value>();
            assert_eq!(body["message"], "Only .tgz files are allowed");
        }

        assert!(!ctx.staging_dir().exists());
        assert_eq!(registry.pushes.load(Ordering::SeqCst), 0);
        Ok(())
    }

    #[tokio::test]
    async fn upload_strips_directories_from_file_name() -> anyhow::Result<()> {
        let registry = Registry::default();
        let base = spawn_registry(registry.clone()).await?;
        let ctx = TestContext::builder().with_harbor_url(&base).build()?;
        let server = ctx.server(upload_routes())?;

        let response = server
            .post("/v1alpha1/chart/upload")
            .multipart(chart_form("../../escape-1.0.0.tgz", b"chart"))
            .await;
        response.assert_status_ok();

        let last_file = registry.last_file.lock().map(|f| f.clone()).ok().flatten();
        assert_eq!(last_file.as_deref(), Some("escape-1.0.0.tgz"));

        let parent = ctx.staging_dir().parent().ok_or_else(|| anyhow::anyhow!("no parent"))?;
        let escaped = std::fs::read_dir(parent)?
            .filter_map(|entry| entry.ok())
            .any(|entry| entry.file_name().to_string_lossy().starts_with("escape"));
        assert!(!escaped);
        Ok(())
    }

    #[tokio::test]
    async fn upload_rejects_unusable_file_names() -> anyhow::Result<()> {
        let registry = Registry::default();
        let base = spawn_registry(registry.clone()).await?;
        let ctx = TestContext::builder().with_harbor_url(&base).build()?;
        let server = ctx.server(upload_routes())?;

        for file_name in ["charts/", "charts/..", "..tgz", "a..b-1.0.0.tgz"] {
            let response = server
                .post("/v1alpha1/chart/upload")
                .multipart(chart_form(file_name, b"chart"))
                .await;
            response.assert_status_bad_request();
            assert_eq!(response.json::<Value>()["message"], "Invalid chart file name");
        }

        let form = chart_form("nginx-1.2.3.tgz", b"chart").add_text("chart_name", "../web");
        let response = server.post("/v1alpha1/chart/upload").multipart(form).await;
        response.assert_status_bad_request();
        assert_eq!(response.json::<Value>()["message"], "Invalid chart_name: ../web");

        assert_eq!(registry.pushes.load(Ordering::SeqCst), 0);
        assert_eq!(staged_files(&ctx)?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn upload_reports_staging_failure() -> anyhow::Result<()> {
        let registry = Registry::default();
        let base = spawn_registry(registry.clone()).await?;
        let ctx = TestContext::builder().with_harbor_url(&base).build()?;
        let server = ctx.server(upload_routes())?;

        // A regular file where the staging directory should be.
        std::fs::write(ctx.staging_dir(), b"occupied")?;

        let response = server
            .post("/v1alpha1/chart/upload")
            .multipart(chart_form("nginx-1.2.3.tgz", b"chart"))
            .await;
        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);

        let body = response.json::<Value>();
        let message = body["message"].as_str().unwrap_or_default();
        assert!(message.starts_with("Failed to create temp directory"));
        assert!(ctx.staging_dir().is_file());
        assert_eq!(registry.pushes.load(Ordering::SeqCst), 0);
        Ok(())
    }

    #[tokio::test]
    async fn upload_requires_chart_field() -> anyhow::Result<()> {
        let ctx = TestContext::builder().build()?;
        let server = ctx.server(upload_routes())?;

        let form = MultipartForm::new().add_text("chart_name", "nginx");
        let response = server.post("/v1alpha1/chart/upload").multipart(form).await;
        response.assert_status_bad_request();

        let body = response.json::<Value>();
        let message = body["message"].as_str().unwrap_or_default();
        assert!(message.starts_with("Failed to get chart file"));
        Ok(())
    }

    #[tokio::test]
    async fn upload_rejects_non_multipart_body() -> anyhow::Result<()> {
        let ctx = TestContext::builder().build()?;
        let server = ctx.server(upload_routes())?;

        let response = server
            .post("/v1alpha1/chart/upload")
            .text("not a form")
            .await;
        response.assert_status_bad_request();

        let body = response.json::<Value>();
        let message = body["message"].as_str().unwrap_or_default();
        assert!(message.starts_with("Failed to parse multipart form"));
        Ok(())
    }

    #[tokio::test]
    async fn upload_only_accepts_post() -> anyhow::Result<()> {
        let ctx = TestContext::builder().build()?;
        let server = ctx.server(upload_routes())?;

        let response = server.get("/v1alpha1/chart/upload").await;
        response.assert_status(StatusCode::METHOD_NOT_ALLOWED);

        let body = response.json::<Value>();
        assert_eq!(body["message"], "Only POST method is allowed");
        Ok(())
    }

    #[tokio::test]
    async fn upload_surfaces_registry_status() -> anyhow::Result<()> {
        let router = Router::new().route(
            "/api/chartrepo/{repo}/charts",
            post(|| async { (StatusCode::UNAUTHORIZED, "unauthorized") }),
        );
        let base = spawn_upstream(router).await?;
        let ctx = TestContext::builder().with_harbor_url(&base).build()?;
        let server = ctx.server(upload_routes())?;

        let response = server
            .post("/v1alpha1/chart/upload")
            .multipart(chart_form("nginx-1.2.3.tgz", b"chart"))
            .await;
        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);

        let body = response.json::<Value>();
        let message = body["message"].as_str().unwrap_or_default();
        assert!(message.starts_with("Failed to push to Harbor"));
        assert!(message.contains("401"));
        assert!(message.contains("unauthorized"));
        assert_eq!(staged_files(&ctx)?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn repeated_upload_is_pushed_each_time() -> anyhow::Result<()> {
        let registry = Registry::default();
        let base = spawn_registry(registry.clone()).await?;
        let ctx = TestContext::builder().with_harbor_url(&base).build()?;
        let server = ctx.server(upload_routes())?;

        let mut digests = Vec::new();
        for _ in 0..2 {
            let response = server
                .post("/v1alpha1/chart/upload")
                .multipart(chart_form("redis-7.0.0.tgz", b"same bytes"))
                .await;
            response.assert_status_ok();
            digests.push(response.json::<UploadOutcome>().digest);
        }

        assert_eq!(digests[0], digests[1]);
        assert_eq!(registry.pushes.load(Ordering::SeqCst), 2);
        Ok(())
    }

    #[tokio::test]
    async fn list_charts_pages_index() -> anyhow::Result<()> {
        let index = r#"
apiVersion: v1
entries:
  redis:
  - name: redis
    version: 7.0.0
    description: In-memory cache
  nginx:
  - name: nginx
    version: 1.2.3
    description: Web server
  apache:
  - name: apache
    version: 2.4.0
    description: Web server
"#;
        let router = Router::new().route(
            "/chartrepo/library/index.yaml",
            get(move || async move { index }),
        );
        let base = spawn_upstream(router).await?;
        let ctx = TestContext::builder().with_harbor_url(&base).build()?;
        let server = ctx.server(routes())?;

        let response = server
            .get("/v1alpha1/charts")
            .add_query_param("limit", 1)
            .add_query_param("size", 2)
            .await;
        response.assert_status_ok();

        let envelope = response.json::<Envelope<ChartPage>>();
        assert_eq!(envelope.message, "Charts retrieved successfully");
        let page = envelope.data.ok_or_else(|| anyhow::anyhow!("missing page"))?;
        assert_eq!(page.total, 3);
        assert_eq!(page.total_page, 2);
        let names: Vec<_> = page.charts.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["apache", "nginx"]);

        let response = server
            .get("/v1alpha1/charts")
            .add_query_param("limit", 1)
            .add_query_param("size", 10)
            .add_query_param("keyword", "CACHE")
            .await;
        let page = response
            .json::<Envelope<ChartPage>>()
            .data
            .ok_or_else(|| anyhow::anyhow!("missing page"))?;
        assert_eq!(page.total, 1);
        assert_eq!(page.charts[0].name, "redis");
        Ok(())
    }

    #[tokio::test]
    async fn list_charts_rejects_invalid_page() -> anyhow::Result<()> {
        let ctx = TestContext::builder().build()?;
        let server = ctx.server(routes())?;

        let response = server
            .get("/v1alpha1/charts")
            .add_query_param("limit", 0)
            .add_query_param("size", 10)
            .await;
        response.assert_status_bad_request();
        assert_eq!(response.json::<Value>()["message"], "Invalid limit or size");
        Ok(())
    }
}

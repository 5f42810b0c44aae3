//! Chart upload and repository index download.

use std::path::Path;

use reqwest::Body;
use reqwest::multipart::{Form, Part};
use tokio::fs::File;
use tokio_util::io::ReaderStream;

use crate::{Error, HarborClient, IndexFile, Result, TRACING_TARGET_CHART};

/// Multipart field name expected by the chart upload endpoint.
const CHART_FIELD: &str = "chart";

impl HarborClient {
    /// Pushes the packaged chart at `path` into `repo` under `file_name`.
    ///
    /// The file is streamed from disk into a single multipart part. Any non-2xx
    /// response fails with [`Error::Registry`] carrying the upstream status and
    /// body; nothing is retried.
    ///
    /// Returns the URL the chart is served from.
    #[tracing::instrument(skip(self, path), target = TRACING_TARGET_CHART)]
    pub async fn push_chart(&self, path: &Path, repo: &str, file_name: &str) -> Result<String> {
        let file = File::open(path).await?;
        let length = file.metadata().await?.len();

        let body = Body::wrap_stream(ReaderStream::new(file));
        let part = Part::stream_with_length(body, length)
            .file_name(file_name.to_owned())
            .mime_str("application/gzip")?;
        let form = Form::new().part(CHART_FIELD, part);

        let url = self.config().chart_upload_url(repo);
        tracing::debug!(target: TRACING_TARGET_CHART, url = %url, length, "Pushing chart");

        let response = self.post(&url).multipart(form).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                target: TRACING_TARGET_CHART,
                status = status.as_u16(),
                body = %body,
                "Registry rejected chart"
            );
            return Err(Error::Registry {
                status: status.as_u16(),
                body,
            });
        }

        let chart_url = self.config().chart_download_url(repo, file_name);
        tracing::info!(
            target: TRACING_TARGET_CHART,
            chart_url = %chart_url,
            "Chart pushed to registry"
        );

        Ok(chart_url)
    }

    /// Downloads and decodes the default chart repository `index.yaml`.
    #[tracing::instrument(skip(self), target = TRACING_TARGET_CHART)]
    pub async fn fetch_index(&self) -> Result<IndexFile> {
        let url = self.config().index_url();
        let response = self.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::UnexpectedStatus(status.as_u16()));
        }

        let text = response.text().await?;
        let index: IndexFile = serde_yaml::from_str(&text)?;

        tracing::debug!(
            target: TRACING_TARGET_CHART,
            chart_count = index.entries.len(),
            "Downloaded repository index"
        );

        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::Router;
    use axum::extract::{Multipart, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use tokio::net::TcpListener;

    use super::*;
    use crate::HarborConfig;

    async fn spawn(router: Router) -> anyhow::Result<String> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let address = listener.local_addr()?;
        tokio::spawn(async move { axum::serve(listener, router).await });
        Ok(format!("http://{address}"))
    }

    async fn accept_chart(
        State(received): State<Arc<AtomicUsize>>,
        headers: HeaderMap,
        mut multipart: Multipart,
    ) -> StatusCode {
        if !headers.contains_key("authorization") {
            return StatusCode::UNAUTHORIZED;
        }
        while let Ok(Some(field)) = multipart.next_field().await {
            if field.name() == Some("chart") && field.file_name() == Some("nginx-1.2.3.tgz") {
                let bytes = field.bytes().await.unwrap_or_default();
                received.store(bytes.len(), Ordering::SeqCst);
                return StatusCode::CREATED;
            }
        }
        StatusCode::BAD_REQUEST
    }

    #[tokio::test]
    async fn push_chart_streams_file() -> anyhow::Result<()> {
        let received = Arc::new(AtomicUsize::new(0));
        let router = Router::new()
            .route("/api/chartrepo/library/charts", post(accept_chart))
            .with_state(received.clone());
        let base = spawn(router).await?;

        let dir = tempfile::tempdir()?;
        let path = dir.path().join("upload.tgz");
        tokio::fs::write(&path, vec![7u8; 4096]).await?;

        let client = HarborClient::new(HarborConfig::new(&base))?;
        let url = client.push_chart(&path, "library", "nginx-1.2.3.tgz").await?;

        assert_eq!(url, format!("{base}/chartrepo/library/charts/nginx-1.2.3.tgz"));
        assert_eq!(received.load(Ordering::SeqCst), 4096);
        Ok(())
    }

    #[tokio::test]
    async fn push_chart_surfaces_registry_rejection() -> anyhow::Result<()> {
        let router = Router::new().route(
            "/api/chartrepo/library/charts",
            post(|| async { (StatusCode::UNAUTHORIZED, "unauthorized: bad credentials") }),
        );
        let base = spawn(router).await?;

        let dir = tempfile::tempdir()?;
        let path = dir.path().join("upload.tgz");
        tokio::fs::write(&path, b"chart").await?;

        let client = HarborClient::new(HarborConfig::new(&base))?;
        let error = client
            .push_chart(&path, "library", "nginx-1.2.3.tgz")
            .await
            .unwrap_err();

        match &error {
            Error::Registry { status, body } => {
                assert_eq!(*status, 401);
                assert_eq!(body, "unauthorized: bad credentials");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(error.to_string().contains("401"));
        Ok(())
    }

    #[tokio::test]
    async fn push_chart_missing_file() -> anyhow::Result<()> {
        let client = HarborClient::new(HarborConfig::new("http://127.0.0.1:9"))?;
        let error = client
            .push_chart(Path::new("/nonexistent/chart.tgz"), "library", "chart.tgz")
            .await
            .unwrap_err();
        assert!(matches!(error, Error::Io(_)));
        Ok(())
    }

    #[tokio::test]
    async fn fetch_index_decodes_entries() -> anyhow::Result<()> {
        let index = r#"
apiVersion: v1
entries:
  nginx:
  - name: nginx
    version: 1.2.3
    appVersion: "1.25"
    description: Web server
    icon: https://example.com/nginx.png
    created: "2024-03-01T10:00:00Z"
generated: "2024-03-01T10:00:00Z"
"#;
        let router = Router::new().route(
            "/chartrepo/library/index.yaml",
            get(move || async move { index }),
        );
        let base = spawn(router).await?;

        let client = HarborClient::new(HarborConfig::new(&base))?;
        let index = client.fetch_index().await?;

        let nginx = &index.entries["nginx"][0];
        assert_eq!(nginx.version, "1.2.3");
        assert_eq!(nginx.app_version.as_deref(), Some("1.25"));
        Ok(())
    }
}

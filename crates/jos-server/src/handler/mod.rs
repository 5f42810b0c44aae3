//! All `axum::`[`Router`]s with related `axum::`[`Handler`]s.
//!
//! Routes are grouped per module and merged by [`routes`]. Everything under
//! `/v1alpha1/` requires a bearer token except the chart upload; the health
//! check is public as well.
//!
//! [`Router`]: axum::routing::Router
//! [`Handler`]: axum::handler::Handler

mod apisix;
mod charts;
mod components;
mod error;
mod monitors;
mod nodes;
mod pods;
mod releases;
pub mod request;
pub mod response;
mod routes;

use aide::axum::ApiRouter;
use axum::response::{IntoResponse, Response};

pub use crate::handler::error::{Error, ErrorKind, Result};
use crate::middleware::{AuthConfig, RouterAuthExt};
use crate::service::ServiceState;

#[inline]
async fn handler() -> Response {
    ErrorKind::NotFound.into_response()
}

/// Returns an [`ApiRouter`] with all private routes.
fn private_routes() -> ApiRouter<ServiceState> {
    ApiRouter::new()
        .merge(charts::routes())
        .merge(releases::routes())
        .merge(pods::routes())
        .merge(nodes::routes())
        .merge(routes::routes())
        .merge(apisix::routes())
        .merge(components::routes())
}

/// Returns an [`ApiRouter`] with all public routes.
fn public_routes() -> ApiRouter<ServiceState> {
    ApiRouter::new()
        .merge(charts::upload_routes())
        .merge(monitors::routes())
}

/// Returns an [`ApiRouter`] with all routes.
pub fn routes(auth: &AuthConfig) -> ApiRouter<ServiceState> {
    let private_router = private_routes().with_authentication(auth);

    ApiRouter::new()
        .merge(private_router)
        .merge(public_routes())
        .fallback(handler)
}

#[cfg(test)]
pub(crate) mod test {
    use std::path::PathBuf;

    use aide::axum::ApiRouter;
    use axum::Router;
    use axum_test::TestServer;
    use jos_harbor::{HarborClient, HarborConfig};
    use jos_helm::{HelmClient, HelmConfig, HelmRepository};
    use jos_kube::{KubeClient, KubeConfig};
    use jos_prometheus::{PrometheusClient, PrometheusConfig};
    use tempfile::TempDir;
    use tokio::net::TcpListener;

    use crate::service::{ChartStaging, ServiceState};

    /// Address nothing listens on.
    const UNREACHABLE: &str = "http://127.0.0.1:9";

    /// Serves `router` on an ephemeral port and returns its base URL.
    pub async fn spawn_upstream(router: Router) -> anyhow::Result<String> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let address = listener.local_addr()?;
        tokio::spawn(async move { axum::serve(listener, router).await });
        Ok(format!("http://{address}"))
    }

    /// API server `NotFound` status, as returned for a missing object.
    pub fn kube_not_found() -> (axum::http::StatusCode, axum::Json<serde_json::Value>) {
        let status = serde_json::json!({
            "apiVersion": "v1",
            "kind": "Status",
            "metadata": {},
            "status": "Failure",
            "message": "not found",
            "reason": "NotFound",
            "code": 404
        });
        (axum::http::StatusCode::NOT_FOUND, axum::Json(status))
    }

    /// Service state wired to mock upstreams and a private staging directory.
    pub struct TestContext {
        pub state: ServiceState,
        staging_dir: PathBuf,
        _dir: TempDir,
    }

    pub struct TestContextBuilder {
        kube_url: String,
        harbor_url: String,
        prometheus_url: String,
        helm_bin: Option<PathBuf>,
    }

    impl TestContext {
        pub fn builder() -> TestContextBuilder {
            TestContextBuilder {
                kube_url: UNREACHABLE.to_owned(),
                harbor_url: UNREACHABLE.to_owned(),
                prometheus_url: UNREACHABLE.to_owned(),
                helm_bin: None,
            }
        }

        /// Staging directory, not created until the first upload.
        pub fn staging_dir(&self) -> &std::path::Path {
            &self.staging_dir
        }

        /// Returns a [`TestServer`] serving `router` with this state.
        pub fn server(&self, router: ApiRouter<ServiceState>) -> anyhow::Result<TestServer> {
            let app = Router::from(router).with_state(self.state.clone());
            Ok(TestServer::new(app)?)
        }
    }

    impl TestContextBuilder {
        /// Points the cluster client at a mock API server.
        pub fn with_kube_url(mut self, url: &str) -> Self {
            self.kube_url = url.to_owned();
            self
        }

        pub fn with_harbor_url(mut self, url: &str) -> Self {
            self.harbor_url = url.to_owned();
            self
        }

        pub fn with_prometheus_url(mut self, url: &str) -> Self {
            self.prometheus_url = url.to_owned();
            self
        }

        pub fn with_helm_bin(mut self, helm_bin: PathBuf) -> Self {
            self.helm_bin = Some(helm_bin);
            self
        }

        pub fn build(self) -> anyhow::Result<TestContext> {
            let dir = tempfile::tempdir()?;
            let staging_dir = dir.path().join("helm-rest-uploads");

            let kube_config = kube::Config::new(self.kube_url.parse()?);
            let kube = KubeClient::from_client(
                kube::Client::try_from(kube_config)?,
                KubeConfig::default(),
            );
            let mut helm_config = HelmConfig::default().with_timeout_secs(5);
            if let Some(helm_bin) = self.helm_bin {
                helm_config = helm_config.with_helm_bin(helm_bin);
            }
            let helm = HelmClient::new(
                helm_config,
                HelmRepository::new("harbor", &self.harbor_url),
            );
            let harbor = HarborClient::new(HarborConfig::new(&self.harbor_url))?;
            let prometheus = PrometheusClient::new(PrometheusConfig::new(&self.prometheus_url))?;

            let state = ServiceState::new(
                kube,
                helm,
                harbor,
                prometheus,
                ChartStaging::new(&staging_dir),
            );

            Ok(TestContext {
                state,
                staging_dir,
                _dir: dir,
            })
        }
    }

    #[tokio::test]
    async fn handlers() -> anyhow::Result<()> {
        let ctx = TestContext::builder().build()?;
        let server = ctx.server(super::routes(&crate::middleware::AuthConfig::default()))?;
        assert!(server.is_running());
        Ok(())
    }
}

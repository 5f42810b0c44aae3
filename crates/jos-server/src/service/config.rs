use std::path::PathBuf;

#[cfg(feature = "config")]
use clap::Args;
use jos_harbor::HarborConfig;
use jos_helm::{HelmConfig, HelmRepository};
use jos_kube::KubeConfig;
use jos_prometheus::PrometheusConfig;
use serde::{Deserialize, Serialize};

/// Name of the staging directory created under the system temp directory.
const UPLOAD_DIR_NAME: &str = "helm-rest-uploads";

/// Configuration of every collaborator held by the [`ServiceState`].
///
/// [`ServiceState`]: crate::service::ServiceState
#[derive(Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct ServiceConfig {
    #[cfg_attr(feature = "config", command(flatten))]
    #[serde(default)]
    pub harbor: HarborConfig,

    #[cfg_attr(feature = "config", command(flatten))]
    #[serde(default)]
    pub kube: KubeConfig,

    #[cfg_attr(feature = "config", command(flatten))]
    #[serde(default)]
    pub helm: HelmConfig,

    #[cfg_attr(feature = "config", command(flatten))]
    #[serde(default)]
    pub prometheus: PrometheusConfig,

    /// Directory in which uploaded charts are staged before being pushed
    #[cfg_attr(feature = "config", arg(long = "upload-dir", env = "UPLOAD_DIR"))]
    #[serde(default)]
    pub upload_dir: Option<PathBuf>,
}

impl ServiceConfig {
    /// Returns the staging directory, defaulting to `<tmp>/helm-rest-uploads`.
    pub fn upload_dir(&self) -> PathBuf {
        self.upload_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join(UPLOAD_DIR_NAME))
    }

    /// Sets the staging directory.
    pub fn with_upload_dir(mut self, upload_dir: impl Into<PathBuf>) -> Self {
        self.upload_dir = Some(upload_dir.into());
        self
    }

    /// Sets the registry configuration.
    pub fn with_harbor(mut self, harbor: HarborConfig) -> Self {
        self.harbor = harbor;
        self
    }

    /// Chart repository that Helm installs from, registered under the
    /// configured repository name.
    pub fn helm_repository(harbor: &HarborConfig, helm: &HelmConfig) -> HelmRepository {
        HelmRepository::new(&helm.helm_repo_name, harbor.chart_repo_url())
            .with_credentials(&harbor.harbor_username, &harbor.harbor_password)
            .with_insecure_skip_tls_verify(harbor.harbor_insecure_tls)
    }
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("harbor_url", &self.harbor.harbor_url)
            .field("harbor_api_url", &self.harbor.harbor_api_url)
            .field("kube", &self.kube)
            .field("helm", &self.helm)
            .field("prometheus", &self.prometheus)
            .field("upload_dir", &self.upload_dir())
            .finish()
    }
}

//! Application state and dependency injection.

mod config;
mod error;
mod health;
mod staging;

use jos_harbor::HarborClient;
use jos_helm::HelmClient;
use jos_kube::KubeClient;
use jos_prometheus::PrometheusClient;

pub use crate::service::config::ServiceConfig;
pub use crate::service::error::{Result, ServiceError};
pub use crate::service::health::{ClusterHealth, check_cluster};
pub use crate::service::staging::{
    CHART_EXTENSION, ChartFileName, ChartStaging, StagedChart, StagingError,
};
use crate::TRACING_TARGET_SERVICE;

/// Application state.
///
/// Used for the [`State`] extraction (dependency injection).
///
/// [`State`]: axum::extract::State
#[must_use = "state does nothing unless you use it"]
#[derive(Clone)]
pub struct ServiceState {
    // External services:
    pub kube: KubeClient,
    pub helm: HelmClient,
    pub harbor: HarborClient,
    pub prometheus: PrometheusClient,

    // Internal services:
    pub staging: ChartStaging,
}

impl ServiceState {
    /// Builds every client from configuration and connects to the cluster.
    ///
    /// The registry configuration is resolved against the Helm repositories
    /// file first, so that the registry client and the Helm repository always
    /// point at the same chart repository.
    pub async fn from_config(config: &ServiceConfig) -> Result<Self> {
        let harbor_config = config.harbor.clone().resolve_repository_file()?;
        let repository = ServiceConfig::helm_repository(&harbor_config, &config.helm);

        let state = Self::new(
            KubeClient::connect(config.kube.clone()).await?,
            HelmClient::new(config.helm.clone(), repository),
            HarborClient::new(harbor_config)?,
            PrometheusClient::new(config.prometheus.clone())?,
            ChartStaging::new(config.upload_dir()),
        );

        // Installs refresh this entry; a missing helm binary only fails them.
        if let Err(error) = state.helm.ensure_repository().await {
            tracing::warn!(
                target: TRACING_TARGET_SERVICE,
                error = %error,
                repository = %state.helm.repository().name,
                "Failed to register chart repository"
            );
        }

        tracing::info!(
            target: TRACING_TARGET_SERVICE,
            harbor_url = %state.harbor.config().harbor_url,
            upload_dir = %state.staging.dir().display(),
            "Service state initialized"
        );

        Ok(state)
    }

    /// Assembles the state from already constructed clients.
    pub fn new(
        kube: KubeClient,
        helm: HelmClient,
        harbor: HarborClient,
        prometheus: PrometheusClient,
        staging: ChartStaging,
    ) -> Self {
        Self {
            kube,
            helm,
            harbor,
            prometheus,
            staging,
        }
    }
}

macro_rules! impl_di {
    ($($f:ident: $t:ty),+) => {$(
        impl axum::extract::FromRef<ServiceState> for $t {
            fn from_ref(state: &ServiceState) -> Self {
                state.$f.clone()
            }
        }
    )+};
}

// External services:
impl_di!(kube: KubeClient);
impl_di!(helm: HelmClient);
impl_di!(harbor: HarborClient);
impl_di!(prometheus: PrometheusClient);

// Internal services:
impl_di!(staging: ChartStaging);

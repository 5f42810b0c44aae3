use std::fmt;
use std::sync::Arc;

use k8s_openapi::NamespaceResourceScope;
use kube::{Api, Client, Config, Resource};

use crate::{KubeConfig, Result, TRACING_TARGET_CLIENT};

struct KubeClientInner {
    client: Client,
    config: KubeConfig,
}

/// Handle to the Kubernetes API server.
///
/// Cheap to clone; every repository trait in [`crate::query`] is implemented
/// on this type.
#[derive(Clone)]
pub struct KubeClient {
    inner: Arc<KubeClientInner>,
}

impl KubeClient {
    /// Connects using the inferred cluster configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if neither an in-cluster service account nor a
    /// kubeconfig is available.
    pub async fn connect(config: KubeConfig) -> Result<Self> {
        let kube_config = Config::infer().await?;

        tracing::info!(
            target: TRACING_TARGET_CLIENT,
            cluster_url = %kube_config.cluster_url,
            default_namespace = %kube_config.default_namespace,
            cluster_name = %config.cluster_name,
            "Connecting to kubernetes"
        );

        let client = Client::try_from(kube_config)?;
        Ok(Self::from_client(client, config))
    }

    /// Wraps an existing `kube::Client`.
    pub fn from_client(client: Client, config: KubeConfig) -> Self {
        Self {
            inner: Arc::new(KubeClientInner { client, config }),
        }
    }

    /// Returns the client configuration.
    #[inline]
    pub fn config(&self) -> &KubeConfig {
        &self.inner.config
    }

    /// Returns the underlying `kube::Client`.
    #[inline]
    pub fn client(&self) -> Client {
        self.inner.client.clone()
    }

    pub(crate) fn namespaced<K>(&self, namespace: &str) -> Api<K>
    where
        K: Resource<Scope = NamespaceResourceScope>,
        <K as Resource>::DynamicType: Default,
    {
        Api::namespaced(self.client(), namespace)
    }

    pub(crate) fn cluster<K>(&self) -> Api<K>
    where
        K: Resource,
        <K as Resource>::DynamicType: Default,
    {
        Api::all(self.client())
    }
}

impl fmt::Debug for KubeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KubeClient")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

//! Cluster client configuration.

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

/// Default Cluster API cluster and namespace name.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Cluster settings that are not part of the connection itself.
///
/// The connection is inferred at startup: in-cluster service account first,
/// then the local kubeconfig.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "configurations must be used to create a client"]
pub struct KubeConfig {
    /// Cluster API cluster that new machines join
    #[cfg_attr(
        feature = "config",
        arg(long = "cluster-name", env = "CLUSTER_NAME", default_value = "default")
    )]
    #[serde(default = "default_namespace")]
    pub cluster_name: String,

    /// Namespace in which Cluster API machines are created
    #[cfg_attr(
        feature = "config",
        arg(long = "capi-namespace", env = "CAPI_NAMESPACE", default_value = "default")
    )]
    #[serde(default = "default_namespace")]
    pub capi_namespace: String,
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_owned()
}

impl Default for KubeConfig {
    fn default() -> Self {
        Self {
            cluster_name: default_namespace(),
            capi_namespace: default_namespace(),
        }
    }
}

impl KubeConfig {
    /// Sets the Cluster API cluster name.
    pub fn with_cluster_name(mut self, cluster_name: impl Into<String>) -> Self {
        self.cluster_name = cluster_name.into();
        self
    }

    /// Sets the namespace used for Cluster API machines.
    pub fn with_capi_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.capi_namespace = namespace.into();
        self
    }
}

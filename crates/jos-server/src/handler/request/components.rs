use schemars::JsonSchema;
use serde::Deserialize;

use super::default_namespace;

/// Selects a pod whose root workloads are looked up.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct PodOwners {
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ProjectImages {
    #[serde(default)]
    pub project_name: String,
}

/// Workload and service a component is cloned from.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct DeployInfo {
    #[serde(default)]
    pub namespace: String,
    /// Source workload, the component name when unset.
    #[serde(default)]
    pub deploy_name: Option<String>,
    /// `Deployment` or `StatefulSet`.
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub service_name: String,
}

/// Clones a workload and its service with a different image.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct CreateComponent {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub deploy_info: DeployInfo,
}

impl CreateComponent {
    /// Returns `true` when every field needed for the clone is set.
    pub fn is_complete(&self) -> bool {
        ![
            &self.name,
            &self.image,
            &self.deploy_info.namespace,
            &self.deploy_info.kind,
            &self.deploy_info.service_name,
        ]
        .iter()
        .any(|field| field.is_empty())
    }

    /// Name of the source workload.
    pub fn source(&self) -> &str {
        self.deploy_info
            .deploy_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.name)
    }

    /// Name of the cloned workload and service, `<source>-<name>`.
    pub fn clone_name(&self) -> String {
        format!("{}-{}", self.source(), self.name)
    }
}

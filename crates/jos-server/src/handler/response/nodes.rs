use jos_kube::model::Machine;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Machine requested from Cluster API.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatedMachine {
    pub name: String,
    pub namespace: String,
    pub cluster_name: String,
}

impl From<&Machine> for CreatedMachine {
    fn from(machine: &Machine) -> Self {
        Self {
            name: machine.metadata.name.clone().unwrap_or_default(),
            namespace: machine.metadata.namespace.clone().unwrap_or_default(),
            cluster_name: machine.spec.cluster_name.clone(),
        }
    }
}

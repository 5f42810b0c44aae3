//! Cluster API `Machine` (`cluster.x-k8s.io/v1beta1`).

use kube::CustomResource;
use serde::{Deserialize, Serialize};

/// Minimal machine spec; bootstrap and infrastructure references are left to
/// the installed providers.
#[derive(CustomResource, Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[kube(
    group = "cluster.x-k8s.io",
    version = "v1beta1",
    kind = "Machine",
    namespaced,
    schema = "disabled"
)]
#[serde(rename_all = "camelCase")]
pub struct MachineSpec {
    pub cluster_name: String,
}

impl Machine {
    /// Builds a machine named `name` joining `cluster_name` in `namespace`.
    pub fn for_cluster(name: &str, namespace: &str, cluster_name: &str) -> Self {
        let mut machine = Self::new(
            name,
            MachineSpec {
                cluster_name: cluster_name.to_owned(),
            },
        );
        machine.metadata.namespace = Some(namespace.to_owned());
        machine
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn machine_references_cluster() -> anyhow::Result<()> {
        let machine = Machine::for_cluster("worker-3", "capi-system", "edge");
        let value = serde_json::to_value(&machine)?;

        assert_eq!(value["apiVersion"], "cluster.x-k8s.io/v1beta1");
        assert_eq!(value["kind"], "Machine");
        assert_eq!(value["metadata"]["name"], "worker-3");
        assert_eq!(value["metadata"]["namespace"], "capi-system");
        assert_eq!(value["spec"]["clusterName"], "edge");
        Ok(())
    }
}

use std::collections::BTreeMap;

use jiff::Timestamp;
use k8s_openapi::api::core::v1::Node;
#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::to_timestamp;

/// Summary of a cluster node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct NodeInfo {
    pub name: String,
    /// `Ready`, `NotReady` or `Unknown`, taken from the node `Ready` condition.
    pub status: String,
    pub os_image: String,
    pub kubelet_version: String,
    pub container_runtime: String,
    pub labels: BTreeMap<String, String>,
    pub created_at: Option<Timestamp>,
    pub internal_ip: String,
    pub external_ip: String,
}

impl From<&Node> for NodeInfo {
    fn from(node: &Node) -> Self {
        let mut info = Self {
            name: node.metadata.name.clone().unwrap_or_default(),
            status: "Unknown".to_owned(),
            labels: node.metadata.labels.clone().unwrap_or_default(),
            created_at: node.metadata.creation_timestamp.as_ref().and_then(to_timestamp),
            ..Self::default()
        };

        let Some(status) = node.status.as_ref() else {
            return info;
        };

        if let Some(node_info) = status.node_info.as_ref() {
            info.os_image = node_info.os_image.clone();
            info.kubelet_version = node_info.kubelet_version.clone();
            info.container_runtime = node_info.container_runtime_version.clone();
        }

        if let Some(ready) = status
            .conditions
            .iter()
            .flatten()
            .find(|condition| condition.type_ == "Ready")
        {
            info.status = match ready.status.as_str() {
                "True" => "Ready",
                "False" => "NotReady",
                _ => "Unknown",
            }
            .to_owned();
        }

        for address in status.addresses.iter().flatten() {
            match address.type_.as_str() {
                "InternalIP" => info.internal_ip = address.address.clone(),
                "ExternalIP" => info.external_ip = address.address.clone(),
                _ => {}
            }
        }

        info
    }
}

impl NodeInfo {
    /// Returns `true` if `keyword` is empty or found in the name or internal IP.
    pub fn matches_keyword(&self, keyword: &str) -> bool {
        keyword.is_empty() || self.name.contains(keyword) || self.internal_ip.contains(keyword)
    }
}

#[cfg(test)]
mod tests {
    use k8s_openapi::api::core::v1::{NodeAddress, NodeCondition, NodeStatus, NodeSystemInfo};
    use kube::api::ObjectMeta;

    use super::*;

    fn node() -> Node {
        Node {
            metadata: ObjectMeta {
                name: Some("worker-1".to_owned()),
                ..ObjectMeta::default()
            },
            status: Some(NodeStatus {
                addresses: Some(vec![
                    NodeAddress {
                        type_: "InternalIP".to_owned(),
                        address: "10.0.0.12".to_owned(),
                    },
                    NodeAddress {
                        type_: "ExternalIP".to_owned(),
                        address: "203.0.113.7".to_owned(),
                    },
                ]),
                conditions: Some(vec![NodeCondition {
                    type_: "Ready".to_owned(),
                    status: "True".to_owned(),
                    ..NodeCondition::default()
                }]),
                node_info: Some(NodeSystemInfo {
                    os_image: "Ubuntu 22.04".to_owned(),
                    kubelet_version: "v1.30.2".to_owned(),
                    container_runtime_version: "containerd://1.7.13".to_owned(),
                    ..NodeSystemInfo::default()
                }),
                ..NodeStatus::default()
            }),
            ..Node::default()
        }
    }

    #[test]
    fn node_summary_reads_status() {
        let info = NodeInfo::from(&node());
        assert_eq!(info.name, "worker-1");
        assert_eq!(info.status, "Ready");
        assert_eq!(info.internal_ip, "10.0.0.12");
        assert_eq!(info.external_ip, "203.0.113.7");
        assert_eq!(info.kubelet_version, "v1.30.2");
        assert_eq!(info.container_runtime, "containerd://1.7.13");
    }

    #[test]
    fn keyword_matches_name_or_internal_ip() {
        let info = NodeInfo::from(&node());
        assert!(info.matches_keyword(""));
        assert!(info.matches_keyword("worker"));
        assert!(info.matches_keyword("10.0.0"));
        assert!(!info.matches_keyword("203.0"));
    }

    #[test]
    fn node_without_status_is_unknown() {
        let info = NodeInfo::from(&Node::default());
        assert_eq!(info.status, "Unknown");
        assert!(info.internal_ip.is_empty());
    }
}

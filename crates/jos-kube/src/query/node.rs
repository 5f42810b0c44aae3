//! Node repository.

use std::future::Future;

use k8s_openapi::api::core::v1::Node;
use kube::api::{DeleteParams, ListParams};

use crate::model::NodeInfo;
use crate::{KubeClient, Result, TRACING_TARGET_QUERY};

/// Repository for cluster nodes.
pub trait NodeRepository {
    /// Lists nodes whose name or internal IP contains `keyword`.
    ///
    /// An empty keyword keeps every node.
    fn list_nodes(&self, keyword: &str) -> impl Future<Output = Result<Vec<NodeInfo>>> + Send;

    /// Deletes the node object. The machine behind it is left untouched.
    fn delete_node(&self, name: &str) -> impl Future<Output = Result<()>> + Send;
}

impl NodeRepository for KubeClient {
    async fn list_nodes(&self, keyword: &str) -> Result<Vec<NodeInfo>> {
        let nodes = self.cluster::<Node>().list(&ListParams::default()).await?;

        let nodes: Vec<NodeInfo> = nodes
            .items
            .iter()
            .map(NodeInfo::from)
            .filter(|node| node.matches_keyword(keyword))
            .collect();

        tracing::debug!(
            target: TRACING_TARGET_QUERY,
            node_count = nodes.len(),
            keyword,
            "Listed nodes"
        );

        Ok(nodes)
    }

    #[tracing::instrument(skip(self), target = TRACING_TARGET_QUERY)]
    async fn delete_node(&self, name: &str) -> Result<()> {
        self.cluster::<Node>()
            .delete(name, &DeleteParams::default())
            .await?;

        tracing::info!(target: TRACING_TARGET_QUERY, node = name, "Node deleted");
        Ok(())
    }
}

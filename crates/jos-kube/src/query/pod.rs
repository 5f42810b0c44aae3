//! Pod repository.

use std::future::Future;

use jiff::Timestamp;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{DeleteParams, ListParams};

use crate::model::{release_selector, to_timestamp};
use crate::{KubeClient, Result, TRACING_TARGET_QUERY};

/// Repository for pods.
pub trait PodRepository {
    /// Lists the pods labelled with the Helm instance `release`.
    fn list_release_pods(
        &self,
        namespace: &str,
        release: &str,
    ) -> impl Future<Output = Result<Vec<Pod>>> + Send;

    /// Deletes a pod and returns its deletion timestamp.
    ///
    /// Falls back to the current time when the API server removed the pod
    /// immediately.
    fn delete_pod(&self, namespace: &str, name: &str)
    -> impl Future<Output = Result<Timestamp>> + Send;
}

impl PodRepository for KubeClient {
    async fn list_release_pods(&self, namespace: &str, release: &str) -> Result<Vec<Pod>> {
        let params = ListParams::default().labels(&release_selector(release));
        let pods = self.namespaced::<Pod>(namespace).list(&params).await?;

        tracing::debug!(
            target: TRACING_TARGET_QUERY,
            namespace,
            release,
            pod_count = pods.items.len(),
            "Listed release pods"
        );

        Ok(pods.items)
    }

    #[tracing::instrument(skip(self), target = TRACING_TARGET_QUERY)]
    async fn delete_pod(&self, namespace: &str, name: &str) -> Result<Timestamp> {
        let deleted = self
            .namespaced::<Pod>(namespace)
            .delete(name, &DeleteParams::default())
            .await?;

        let timestamp = deleted
            .left()
            .and_then(|pod| pod.metadata.deletion_timestamp)
            .and_then(|time| to_timestamp(&time))
            .unwrap_or_else(Timestamp::now);

        tracing::info!(target: TRACING_TARGET_QUERY, namespace, pod = name, "Pod deleted");
        Ok(timestamp)
    }
}

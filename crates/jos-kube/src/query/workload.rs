//! Workload repository: namespace checks and component cloning.

use std::future::Future;

use k8s_openapi::api::apps::v1::{Deployment, StatefulSet};
use k8s_openapi::api::core::v1::{Namespace, Service};
use kube::api::PostParams;

use crate::model::{WorkloadKind, clone_deployment, clone_service, clone_stateful_set};
use crate::{KubeClient, Result, TRACING_TARGET_QUERY};

/// Repository for workloads.
pub trait WorkloadRepository {
    fn namespace_exists(&self, namespace: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Clones the `kind` workload `source` as `name`, running `image`.
    fn clone_workload(
        &self,
        namespace: &str,
        kind: WorkloadKind,
        source: &str,
        name: &str,
        image: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Clones service `source` as `name`, selecting the pods of component `name`.
    fn clone_service(
        &self,
        namespace: &str,
        source: &str,
        name: &str,
    ) -> impl Future<Output = Result<()>> + Send;
}

impl WorkloadRepository for KubeClient {
    async fn namespace_exists(&self, namespace: &str) -> Result<bool> {
        let found = self.cluster::<Namespace>().get_opt(namespace).await?;
        Ok(found.is_some())
    }

    #[tracing::instrument(skip(self), target = TRACING_TARGET_QUERY)]
    async fn clone_workload(
        &self,
        namespace: &str,
        kind: WorkloadKind,
        source: &str,
        name: &str,
        image: &str,
    ) -> Result<()> {
        let params = PostParams::default();

        match kind {
            WorkloadKind::Deployment => {
                let api = self.namespaced::<Deployment>(namespace);
                let source = api.get(source).await?;
                api.create(&params, &clone_deployment(&source, name, namespace, image))
                    .await?;
            }
            WorkloadKind::StatefulSet => {
                let api = self.namespaced::<StatefulSet>(namespace);
                let source = api.get(source).await?;
                api.create(&params, &clone_stateful_set(&source, name, namespace, image))
                    .await?;
            }
        }

        tracing::info!(target: TRACING_TARGET_QUERY, "Workload cloned");
        Ok(())
    }

    #[tracing::instrument(skip(self), target = TRACING_TARGET_QUERY)]
    async fn clone_service(&self, namespace: &str, source: &str, name: &str) -> Result<()> {
        let api = self.namespaced::<Service>(namespace);
        let source = api.get(source).await?;
        api.create(&PostParams::default(), &clone_service(&source, name, namespace))
            .await?;

        tracing::info!(target: TRACING_TARGET_QUERY, "Service cloned");
        Ok(())
    }
}

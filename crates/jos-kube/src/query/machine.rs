//! Cluster API machine repository.

use std::future::Future;

use kube::api::PostParams;

use crate::model::Machine;
use crate::{Error, KubeClient, Result, TRACING_TARGET_QUERY};

/// Repository for Cluster API machines.
pub trait MachineRepository {
    /// Creates a machine named `name` in the configured cluster and namespace.
    ///
    /// Provisioning and joining are left to the Cluster API providers.
    fn create_machine(&self, name: &str) -> impl Future<Output = Result<Machine>> + Send;
}

impl MachineRepository for KubeClient {
    #[tracing::instrument(skip(self), target = TRACING_TARGET_QUERY)]
    async fn create_machine(&self, name: &str) -> Result<Machine> {
        if name.is_empty() {
            return Err(Error::InvalidInput("missing node name".to_owned()));
        }

        let config = self.config();
        let machine = Machine::for_cluster(name, &config.capi_namespace, &config.cluster_name);
        let created = self
            .namespaced::<Machine>(&config.capi_namespace)
            .create(&PostParams::default(), &machine)
            .await?;

        tracing::info!(
            target: TRACING_TARGET_QUERY,
            machine = name,
            cluster = %config.cluster_name,
            namespace = %config.capi_namespace,
            "Machine created"
        );

        Ok(created)
    }
}

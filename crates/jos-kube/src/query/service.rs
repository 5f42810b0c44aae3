//! Service repository.

use std::future::Future;

use k8s_openapi::api::core::v1::Service;
use kube::api::ListParams;

use crate::model::{SERVICE_CODE_LABEL, ServiceInfo};
use crate::{KubeClient, Result, TRACING_TARGET_QUERY};

/// Repository for services.
pub trait ServiceRepository {
    /// Lists the services of `namespace` with their ports.
    fn list_services(&self, namespace: &str)
    -> impl Future<Output = Result<Vec<ServiceInfo>>> + Send;

    /// Returns the single service labelled with application `app`.
    ///
    /// Returns an empty name when no service or more than one matches.
    fn find_service_by_app(
        &self,
        namespace: &str,
        app: &str,
    ) -> impl Future<Output = Result<String>> + Send;
}

impl ServiceRepository for KubeClient {
    async fn list_services(&self, namespace: &str) -> Result<Vec<ServiceInfo>> {
        let services = self
            .namespaced::<Service>(namespace)
            .list(&ListParams::default())
            .await?;

        Ok(services.items.iter().map(ServiceInfo::from).collect())
    }

    async fn find_service_by_app(&self, namespace: &str, app: &str) -> Result<String> {
        let params = ListParams::default().labels(&format!("{SERVICE_CODE_LABEL}={app}"));
        let services = self.namespaced::<Service>(namespace).list(&params).await?;

        let name = match services.items.as_slice() {
            [service] => service.metadata.name.clone().unwrap_or_default(),
            _ => String::new(),
        };

        tracing::debug!(
            target: TRACING_TARGET_QUERY,
            namespace,
            app,
            matches = services.items.len(),
            "Resolved application service"
        );

        Ok(name)
    }
}

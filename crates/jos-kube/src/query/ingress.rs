//! Ingress repository.

use std::future::Future;

use k8s_openapi::api::networking::v1::Ingress;
use kube::api::{DeleteParams, ListParams, PostParams};

use crate::model::{RouteRule, build_ingress, rules_from_ingress};
use crate::{Error, KubeClient, Result, TRACING_TARGET_QUERY};

/// Repository for ingress-backed routes.
pub trait IngressRepository {
    /// Lists the rules of every ingress in `namespace`.
    fn list_routes(&self, namespace: &str) -> impl Future<Output = Result<Vec<RouteRule>>> + Send;

    /// Creates the ingress `name`, or replaces it when it already exists.
    ///
    /// Returns `true` when a new ingress was created.
    fn apply_route(
        &self,
        namespace: &str,
        name: &str,
        rules: &[RouteRule],
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Deletes the ingress `name`.
    fn delete_route(&self, namespace: &str, name: &str) -> impl Future<Output = Result<()>> + Send;
}

impl IngressRepository for KubeClient {
    async fn list_routes(&self, namespace: &str) -> Result<Vec<RouteRule>> {
        let ingresses = self
            .namespaced::<Ingress>(namespace)
            .list(&ListParams::default())
            .await?;

        Ok(ingresses.items.iter().flat_map(rules_from_ingress).collect())
    }

    #[tracing::instrument(skip(self, rules), target = TRACING_TARGET_QUERY)]
    async fn apply_route(&self, namespace: &str, name: &str, rules: &[RouteRule]) -> Result<bool> {
        if name.is_empty() {
            return Err(Error::InvalidInput("ingress name cannot be empty".to_owned()));
        }

        let api = self.namespaced::<Ingress>(namespace);
        let mut ingress = build_ingress(namespace, name, rules);

        match api.get_opt(name).await? {
            Some(existing) => {
                ingress.metadata.resource_version = existing.metadata.resource_version;
                api.replace(name, &PostParams::default(), &ingress).await?;
                tracing::info!(target: TRACING_TARGET_QUERY, "Ingress updated");
                Ok(false)
            }
            None => {
                api.create(&PostParams::default(), &ingress).await?;
                tracing::info!(target: TRACING_TARGET_QUERY, "Ingress created");
                Ok(true)
            }
        }
    }

    #[tracing::instrument(skip(self), target = TRACING_TARGET_QUERY)]
    async fn delete_route(&self, namespace: &str, name: &str) -> Result<()> {
        self.namespaced::<Ingress>(namespace)
            .delete(name, &DeleteParams::default())
            .await?;
        Ok(())
    }
}

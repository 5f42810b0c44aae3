//! Apisix route and upstream repository.

use std::future::Future;

use kube::api::{DeleteParams, ListParams, PostParams};

use crate::model::{ApisixRoute, ApisixRouteSpec, ApisixUpstream, ApisixUpstreamSpec, WeightedRoute};
use crate::{Error, KubeClient, Result, TRACING_TARGET_QUERY};

/// Repository for Apisix custom resources.
pub trait ApisixRepository {
    /// Replaces the rules of route `name`, creating it if missing.
    ///
    /// A missing route is only created when `spec` has at least one rule.
    /// Returns `true` when a new route was created.
    fn apply_apisix_route(
        &self,
        namespace: &str,
        name: &str,
        spec: ApisixRouteSpec,
    ) -> impl Future<Output = Result<bool>> + Send;

    fn delete_apisix_route(
        &self,
        namespace: &str,
        name: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    fn list_apisix_routes(
        &self,
        namespace: &str,
    ) -> impl Future<Output = Result<Vec<ApisixRoute>>> + Send;

    /// Creates a round-robin upstream pointing at `host:port`.
    fn create_upstream(
        &self,
        namespace: &str,
        name: &str,
        host: &str,
        port: i32,
    ) -> impl Future<Output = Result<()>> + Send;

    fn delete_upstream(&self, namespace: &str, name: &str)
    -> impl Future<Output = Result<()>> + Send;

    /// Creates route `name` splitting traffic as described by `route`.
    fn create_weighted_route(
        &self,
        namespace: &str,
        name: &str,
        route: &WeightedRoute,
    ) -> impl Future<Output = Result<()>> + Send;
}

impl ApisixRepository for KubeClient {
    #[tracing::instrument(skip(self, spec), target = TRACING_TARGET_QUERY)]
    async fn apply_apisix_route(
        &self,
        namespace: &str,
        name: &str,
        spec: ApisixRouteSpec,
    ) -> Result<bool> {
        let api = self.namespaced::<ApisixRoute>(namespace);

        if let Some(mut existing) = api.get_opt(name).await? {
            existing.spec = spec;
            api.replace(name, &PostParams::default(), &existing).await?;
            tracing::info!(target: TRACING_TARGET_QUERY, "ApisixRoute updated");
            return Ok(false);
        }

        if spec.is_empty() {
            return Err(Error::InvalidInput(
                "no HTTP or Stream routes provided".to_owned(),
            ));
        }

        let mut route = ApisixRoute::new(name, spec);
        route.metadata.namespace = Some(namespace.to_owned());
        api.create(&PostParams::default(), &route).await?;

        tracing::info!(target: TRACING_TARGET_QUERY, "ApisixRoute created");
        Ok(true)
    }

    #[tracing::instrument(skip(self), target = TRACING_TARGET_QUERY)]
    async fn delete_apisix_route(&self, namespace: &str, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(Error::InvalidInput("ar_name is empty".to_owned()));
        }

        self.namespaced::<ApisixRoute>(namespace)
            .delete(name, &DeleteParams::default())
            .await?;
        Ok(())
    }

    async fn list_apisix_routes(&self, namespace: &str) -> Result<Vec<ApisixRoute>> {
        let routes = self
            .namespaced::<ApisixRoute>(namespace)
            .list(&ListParams::default())
            .await?;
        Ok(routes.items)
    }

    #[tracing::instrument(skip(self), target = TRACING_TARGET_QUERY)]
    async fn create_upstream(&self, namespace: &str, name: &str, host: &str, port: i32) -> Result<()> {
        let mut upstream = ApisixUpstream::new(name, ApisixUpstreamSpec::external_domain(host, port));
        upstream.metadata.namespace = Some(namespace.to_owned());

        self.namespaced::<ApisixUpstream>(namespace)
            .create(&PostParams::default(), &upstream)
            .await?;

        tracing::info!(target: TRACING_TARGET_QUERY, "ApisixUpstream created");
        Ok(())
    }

    #[tracing::instrument(skip(self), target = TRACING_TARGET_QUERY)]
    async fn delete_upstream(&self, namespace: &str, name: &str) -> Result<()> {
        self.namespaced::<ApisixUpstream>(namespace)
            .delete(name, &DeleteParams::default())
            .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self, route), target = TRACING_TARGET_QUERY)]
    async fn create_weighted_route(
        &self,
        namespace: &str,
        name: &str,
        route: &WeightedRoute,
    ) -> Result<()> {
        let spec = route.to_spec();
        let upstreams = spec.http.first().map_or(0, |rule| rule.upstreams.len());

        let mut resource = ApisixRoute::new(name, spec);
        resource.metadata.namespace = Some(namespace.to_owned());

        self.namespaced::<ApisixRoute>(namespace)
            .create(&PostParams::default(), &resource)
            .await?;

        tracing::info!(
            target: TRACING_TARGET_QUERY,
            upstreams,
            "Weighted ApisixRoute created"
        );
        Ok(())
    }
}

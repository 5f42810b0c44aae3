//! Controller owner walk from a pod to its root workload.

use std::future::Future;

use k8s_openapi::api::apps::v1::ReplicaSet;
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use crate::model::{ControllerRef, MAX_OWNER_HOPS, OwnerKind, RootWorkload, app_name};
use crate::{Error, KubeClient, Result, ServiceRepository, TRACING_TARGET_QUERY};

/// Resolves the controller of an owner.
pub trait OwnerLookup {
    /// Returns the controller of `owner`, or `None` if it has none or its
    /// kind is not followed.
    fn controller_of(
        &self,
        namespace: &str,
        owner: &ControllerRef,
    ) -> impl Future<Output = Result<Option<ControllerRef>>> + Send;
}

/// Follows controller references from `start` to the root workload.
///
/// `start` counts as the first hop; the walk fails after [`MAX_OWNER_HOPS`].
pub async fn walk_to_root<L>(lookup: &L, namespace: &str, start: ControllerRef) -> Result<ControllerRef>
where
    L: OwnerLookup + Sync,
{
    let mut current = start;
    let mut hops = 1;

    while current.kind.has_parent() {
        let Some(parent) = lookup.controller_of(namespace, &current).await? else {
            break;
        };

        hops += 1;
        if hops > MAX_OWNER_HOPS {
            return Err(Error::OwnerChainTooLong(parent.name));
        }
        current = parent;
    }

    Ok(current)
}

/// Repository resolving the workloads behind a pod.
pub trait OwnerRepository {
    /// Returns the root workload of every controller owning pod `name`.
    ///
    /// Fails with [`Error::NotController`] if any owner reference is not a
    /// controller.
    fn pod_root_workloads(
        &self,
        namespace: &str,
        name: &str,
    ) -> impl Future<Output = Result<Vec<RootWorkload>>> + Send;
}

fn controller_in(metadata: ObjectMeta) -> Option<ControllerRef> {
    metadata
        .owner_references
        .iter()
        .flatten()
        .find_map(ControllerRef::from_owner)
}

impl OwnerLookup for KubeClient {
    async fn controller_of(
        &self,
        namespace: &str,
        owner: &ControllerRef,
    ) -> Result<Option<ControllerRef>> {
        let metadata = match owner.kind {
            OwnerKind::ReplicaSet => self
                .namespaced::<ReplicaSet>(namespace)
                .get_opt(&owner.name)
                .await?
                .map(|rs| rs.metadata),
            OwnerKind::Job => self
                .namespaced::<Job>(namespace)
                .get_opt(&owner.name)
                .await?
                .map(|job| job.metadata),
            _ => None,
        };

        Ok(metadata.and_then(controller_in))
    }
}

impl OwnerRepository for KubeClient {
    #[tracing::instrument(skip(self), target = TRACING_TARGET_QUERY)]
    async fn pod_root_workloads(&self, namespace: &str, name: &str) -> Result<Vec<RootWorkload>> {
        let pod = self.namespaced::<Pod>(namespace).get(name).await?;
        let owners = pod.metadata.owner_references.unwrap_or_default();

        let mut roots = Vec::with_capacity(owners.len());
        for owner in &owners {
            let Some(controller) = ControllerRef::from_owner(owner) else {
                tracing::warn!(
                    target: TRACING_TARGET_QUERY,
                    owner = %owner.name,
                    kind = %owner.kind,
                    "Pod owner is not a controller"
                );
                return Err(Error::NotController);
            };

            let root = walk_to_root(self, namespace, controller).await?;
            let service_name = self
                .find_service_by_app(namespace, app_name(&root.name))
                .await?;

            roots.push(RootWorkload {
                namespace: namespace.to_owned(),
                deploy_name: root.name,
                kind: root.kind.as_str().to_owned(),
                service_name,
            });
        }

        Ok(roots)
    }
}

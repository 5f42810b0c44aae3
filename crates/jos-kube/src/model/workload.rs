//! Cloning of workloads and services into custom components.
//!
//! A clone gets fresh metadata, the customize mode label and a component
//! label on its pod template; the cloned service selects that component
//! label so it only reaches the new pods.

use std::collections::BTreeMap;
use std::str::FromStr;

use k8s_openapi::api::apps::v1::{Deployment, StatefulSet};
use k8s_openapi::api::core::v1::{PodTemplateSpec, Service};
use kube::api::ObjectMeta;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Label marking resources created by the component builder.
pub const MODE_LABEL: &str = "joiningos.com/mode";

/// Value of [`MODE_LABEL`] on cloned resources.
pub const MODE_VALUE: &str = "customize";

/// Label carrying the name of the cloned workload on its pods.
pub const COMPONENT_LABEL: &str = "joiningos.com/componment";

/// Workload kinds that can be cloned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkloadKind {
    Deployment,
    StatefulSet,
}

impl FromStr for WorkloadKind {
    type Err = Error;

    fn from_str(kind: &str) -> Result<Self, Self::Err> {
        match kind {
            "Deployment" => Ok(Self::Deployment),
            "StatefulSet" => Ok(Self::StatefulSet),
            other => Err(Error::UnsupportedKind(other.to_owned())),
        }
    }
}

fn clone_metadata(
    name: &str,
    namespace: &str,
    labels: Option<&BTreeMap<String, String>>,
) -> ObjectMeta {
    let mut labels = labels.cloned().unwrap_or_default();
    labels.insert(MODE_LABEL.to_owned(), MODE_VALUE.to_owned());

    ObjectMeta {
        name: Some(name.to_owned()),
        namespace: Some(namespace.to_owned()),
        labels: Some(labels),
        ..ObjectMeta::default()
    }
}

fn customize_template(template: &mut PodTemplateSpec, name: &str, image: &str) {
    let metadata = template.metadata.get_or_insert_with(ObjectMeta::default);
    let labels = metadata.labels.get_or_insert_with(BTreeMap::new);
    labels.insert(COMPONENT_LABEL.to_owned(), name.to_owned());
    labels.insert(MODE_LABEL.to_owned(), MODE_VALUE.to_owned());

    for container in template.spec.iter_mut().flat_map(|spec| spec.containers.iter_mut()) {
        container.image = Some(image.to_owned());
    }
}

fn template_labels(template: &PodTemplateSpec) -> Option<&BTreeMap<String, String>> {
    template.metadata.as_ref().and_then(|m| m.labels.as_ref())
}

/// Clones `source` as `name`, running `image` in every container.
pub fn clone_deployment(source: &Deployment, name: &str, namespace: &str, image: &str) -> Deployment {
    let mut spec = source.spec.clone().unwrap_or_default();
    let metadata = clone_metadata(name, namespace, template_labels(&spec.template));
    customize_template(&mut spec.template, name, image);

    Deployment {
        metadata,
        spec: Some(spec),
        status: None,
    }
}

/// Clones `source` as `name`, running `image` in every container.
pub fn clone_stateful_set(
    source: &StatefulSet,
    name: &str,
    namespace: &str,
    image: &str,
) -> StatefulSet {
    let mut spec = source.spec.clone().unwrap_or_default();
    let metadata = clone_metadata(name, namespace, template_labels(&spec.template));
    customize_template(&mut spec.template, name, image);

    StatefulSet {
        metadata,
        spec: Some(spec),
        status: None,
    }
}

/// Clones `source` as `name`, selecting the pods of component `name`.
///
/// Cluster IPs are cleared so the API server allocates new ones.
pub fn clone_service(source: &Service, name: &str, namespace: &str) -> Service {
    let mut spec = source.spec.clone().unwrap_or_default();
    spec.selector
        .get_or_insert_with(BTreeMap::new)
        .insert(COMPONENT_LABEL.to_owned(), name.to_owned());
    spec.cluster_ip = None;
    spec.cluster_ips = None;

    Service {
        metadata: clone_metadata(name, namespace, source.metadata.labels.as_ref()),
        spec: Some(spec),
        status: None,
    }
}

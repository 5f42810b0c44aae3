//! Controller ownership of pods.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Maximum number of owner references followed from a pod.
pub const MAX_OWNER_HOPS: usize = 4;

/// Owner kinds the walk knows how to follow.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OwnerKind {
    ReplicaSet,
    Deployment,
    StatefulSet,
    DaemonSet,
    Job,
    CronJob,
    Other(String),
}

impl OwnerKind {
    pub fn parse(kind: &str) -> Self {
        match kind {
            "ReplicaSet" => Self::ReplicaSet,
            "Deployment" => Self::Deployment,
            "StatefulSet" => Self::StatefulSet,
            "DaemonSet" => Self::DaemonSet,
            "Job" => Self::Job,
            "CronJob" => Self::CronJob,
            other => Self::Other(other.to_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::ReplicaSet => "ReplicaSet",
            Self::Deployment => "Deployment",
            Self::StatefulSet => "StatefulSet",
            Self::DaemonSet => "DaemonSet",
            Self::Job => "Job",
            Self::CronJob => "CronJob",
            Self::Other(kind) => kind,
        }
    }

    /// Returns `true` for kinds that may themselves be owned by a controller.
    pub fn has_parent(&self) -> bool {
        matches!(self, Self::ReplicaSet | Self::Job)
    }
}

/// Controller owner reference reduced to what the walk needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerRef {
    pub kind: OwnerKind,
    pub name: String,
}

impl ControllerRef {
    pub fn new(kind: &str, name: impl Into<String>) -> Self {
        Self {
            kind: OwnerKind::parse(kind),
            name: name.into(),
        }
    }

    /// Returns the reference if it is flagged as the controller.
    pub fn from_owner(owner: &OwnerReference) -> Option<Self> {
        owner
            .controller
            .unwrap_or(false)
            .then(|| Self::new(&owner.kind, owner.name.clone()))
    }
}

/// Root workload of a pod.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct RootWorkload {
    pub namespace: String,
    pub deploy_name: String,
    pub kind: String,
    /// Single service labelled with the application name, empty when zero or
    /// several match.
    pub service_name: String,
}

/// Application name of a controller: the text after its first `-`.
pub fn app_name(controller_name: &str) -> &str {
    controller_name
        .split_once('-')
        .map_or(controller_name, |(_, rest)| rest)
}

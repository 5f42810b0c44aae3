//! Pod status views for release listings.

use std::collections::BTreeMap;

use jiff::Timestamp;
use k8s_openapi::api::core::v1::{ContainerState, Pod};
#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::to_timestamp;

/// Label Helm charts put on every pod of a release.
const INSTANCE_LABEL: &str = "app.kubernetes.io/instance";

/// Label selector for the pods of `release`.
pub fn release_selector(release: &str) -> String {
    format!("{INSTANCE_LABEL}={release}")
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct ContainerInfo {
    pub name: String,
    pub image: String,
    /// `running`, `waiting`, `terminated` or `unknown`.
    pub state: String,
    pub ready: bool,
}

/// Status of one pod of a release.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct PodStatusInfo {
    pub name: String,
    pub ip: String,
    pub phase: String,
    pub node: String,
    pub labels: BTreeMap<String, String>,
    pub containers: Vec<ContainerInfo>,
    /// Ready containers over all containers, e.g. `1/2`.
    pub ready: String,
    pub age: String,
    pub status: String,
}

fn state_name(state: Option<&ContainerState>) -> &'static str {
    match state {
        Some(state) if state.running.is_some() => "running",
        Some(state) if state.waiting.is_some() => "waiting",
        Some(state) if state.terminated.is_some() => "terminated",
        _ => "unknown",
    }
}

/// Formats an age in seconds as `<n>s`, `<n>m` or `<n>h`.
pub fn format_age(seconds: i64) -> String {
    let seconds = seconds.max(0);
    match seconds {
        0..60 => format!("{seconds}s"),
        60..3600 => format!("{}m", seconds / 60),
        _ => format!("{}h", seconds / 3600),
    }
}

/// Derives the displayed status of a pod.
///
/// The first waiting container with a reason wins, then the first container
/// that terminated with a non-zero exit code (its reason, or `Error`); the
/// pod phase is used otherwise.
pub fn pod_status(pod: &Pod) -> String {
    let Some(status) = pod.status.as_ref() else {
        return String::new();
    };

    for container in status.container_statuses.iter().flatten() {
        let Some(state) = container.state.as_ref() else {
            continue;
        };

        if let Some(reason) = state
            .waiting
            .as_ref()
            .and_then(|waiting| waiting.reason.as_deref())
            .filter(|reason| !reason.is_empty())
        {
            return reason.to_owned();
        }

        if let Some(terminated) = state.terminated.as_ref().filter(|t| t.exit_code != 0) {
            return terminated
                .reason
                .clone()
                .filter(|reason| !reason.is_empty())
                .unwrap_or_else(|| "Error".to_owned());
        }
    }

    status.phase.clone().unwrap_or_default()
}

impl PodStatusInfo {
    /// Builds the status view of `pod` relative to `now`.
    pub fn from_pod(pod: &Pod, now: Timestamp) -> Self {
        let status = pod.status.as_ref();
        let container_statuses = status
            .and_then(|status| status.container_statuses.as_deref())
            .unwrap_or_default();

        let containers: Vec<ContainerInfo> = container_statuses
            .iter()
            .map(|container| ContainerInfo {
                name: container.name.clone(),
                image: container.image.clone(),
                state: state_name(container.state.as_ref()).to_owned(),
                ready: container.ready,
            })
            .collect();
        let ready_count = containers.iter().filter(|c| c.ready).count();

        let age = pod
            .metadata
            .creation_timestamp
            .as_ref()
            .and_then(to_timestamp)
            .map(|created| format_age(now.as_second() - created.as_second()))
            .unwrap_or_default();

        Self {
            name: pod.metadata.name.clone().unwrap_or_default(),
            ip: status.and_then(|s| s.pod_ip.clone()).unwrap_or_default(),
            phase: status.and_then(|s| s.phase.clone()).unwrap_or_default(),
            node: pod
                .spec
                .as_ref()
                .and_then(|spec| spec.node_name.clone())
                .unwrap_or_default(),
            labels: pod.metadata.labels.clone().unwrap_or_default(),
            ready: format!("{ready_count}/{}", containers.len()),
            containers,
            age,
            status: pod_status(pod),
        }
    }
}

//! Reachability check of the cluster API server.

use std::time::Duration;

use jiff::Timestamp;
use jos_kube::KubeClient;

const TRACING_TARGET_HEALTH: &str = "jos_server::service::health";

/// Upper bound on a single cluster check.
const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of one check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterHealth {
    pub is_healthy: bool,
    pub checked_at: Timestamp,
}

/// Asks the API server for its version, giving up after [`CHECK_TIMEOUT`].
pub async fn check_cluster(kube: &KubeClient) -> ClusterHealth {
    let is_healthy =
        match tokio::time::timeout(CHECK_TIMEOUT, kube.client().apiserver_version()).await {
            Ok(Ok(version)) => {
                tracing::debug!(
                    target: TRACING_TARGET_HEALTH,
                    git_version = %version.git_version,
                    "Cluster API server is reachable"
                );
                true
            }
            Ok(Err(error)) => {
                tracing::warn!(
                    target: TRACING_TARGET_HEALTH,
                    error = %error,
                    "Cluster API server check failed"
                );
                false
            }
            Err(_) => {
                tracing::warn!(
                    target: TRACING_TARGET_HEALTH,
                    timeout_secs = CHECK_TIMEOUT.as_secs(),
                    "Cluster API server check timed out"
                );
                false
            }
        };

    ClusterHealth {
        is_healthy,
        checked_at: Timestamp::now(),
    }
}

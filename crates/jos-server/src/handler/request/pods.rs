use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Path of a single pod.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct PodPath {
    pub namespace: String,
    pub pod: String,
}

/// Rollout strategy or autoscaling settings for a workload.
///
/// Accepted as-is; only the target is read.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct StrategyRequest {
    #[serde(default)]
    pub namespace: String,
    /// Target workload.
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub settings: Map<String, Value>,
}

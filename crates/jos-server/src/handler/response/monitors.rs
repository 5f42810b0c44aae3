use jiff::Timestamp;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Health of the gateway and its dependencies.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MonitorStatus {
    pub is_healthy: bool,
    pub updated_at: Timestamp,
}

use k8s_openapi::api::core::v1::Service;
#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Label linking services to the application they expose.
pub const SERVICE_CODE_LABEL: &str = "seagoing.com.cn/service-code";

/// Service name with its ports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct ServiceInfo {
    pub name: String,
    pub ports: Vec<i32>,
}

impl From<&Service> for ServiceInfo {
    fn from(service: &Service) -> Self {
        Self {
            name: service.metadata.name.clone().unwrap_or_default(),
            ports: service
                .spec
                .iter()
                .flat_map(|spec| spec.ports.iter().flatten())
                .map(|port| port.port)
                .collect(),
        }
    }
}

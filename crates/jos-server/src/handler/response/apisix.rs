use jos_kube::model::{ApisixRoute, ApisixRouteSpec};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Apisix route as listed by the gateway.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ApisixRouteItem {
    pub name: String,
    pub namespace: String,
    pub spec: ApisixRouteSpec,
}

impl From<ApisixRoute> for ApisixRouteItem {
    fn from(route: ApisixRoute) -> Self {
        Self {
            name: route.metadata.name.unwrap_or_default(),
            namespace: route.metadata.namespace.unwrap_or_default(),
            spec: route.spec,
        }
    }
}

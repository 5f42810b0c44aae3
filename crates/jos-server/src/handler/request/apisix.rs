use std::collections::BTreeMap;

use jos_kube::model::{HttpRoute, RouteBackend, StreamRoute, WeightedRoute};
use schemars::JsonSchema;
use serde::Deserialize;
use validator::Validate;

use super::default_namespace;

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct Backend {
    pub service_name: String,
    pub service_port: i32,
    #[serde(default)]
    pub weight: Option<i32>,
}

/// HTTP rule matching one host and one path prefix.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct HttpRule {
    pub hosts: String,
    pub paths: String,
    #[serde(default)]
    pub backends: Vec<Backend>,
}

/// Stream rule forwarding one ingress port.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct StreamRule {
    pub ingress_port: i32,
    pub backend: Backend,
}

#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
pub struct CreateApisixRoute {
    #[validate(length(min = 1, message = "ar_name is empty"))]
    pub ar_name: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default)]
    pub http: Vec<HttpRule>,
    #[serde(default)]
    pub stream: Vec<StreamRule>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DeleteApisixRoute {
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub ar_name: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
pub struct CreateUpstream {
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[validate(length(min = 1, message = "upstream name is empty"))]
    pub name: String,
    /// External host the upstream resolves to.
    pub host: String,
    pub port: i32,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DeleteUpstream {
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default)]
    pub name: String,
}

/// Splits the traffic of one host across upstreams.
#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
pub struct CreateWeightedRoute {
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[validate(length(min = 1, message = "route_name is empty"))]
    pub route_name: String,
    pub host: String,
    pub service_name: String,
    pub service_port: i32,
    /// Upstream used when no positive weight is given.
    #[serde(default)]
    pub upstream_name: String,
    /// Upstream name to weight.
    #[serde(default)]
    pub traffic: BTreeMap<String, i32>,
}

impl From<&Backend> for RouteBackend {
    fn from(backend: &Backend) -> Self {
        Self {
            service_name: backend.service_name.clone(),
            service_port: backend.service_port,
            weight: backend.weight,
        }
    }
}

impl From<&HttpRule> for HttpRoute {
    fn from(rule: &HttpRule) -> Self {
        Self {
            hosts: rule.hosts.clone(),
            paths: rule.paths.clone(),
            backends: rule.backends.iter().map(Into::into).collect(),
        }
    }
}

impl From<&StreamRule> for StreamRoute {
    fn from(rule: &StreamRule) -> Self {
        Self {
            ingress_port: rule.ingress_port,
            backend: (&rule.backend).into(),
        }
    }
}

impl From<CreateWeightedRoute> for WeightedRoute {
    fn from(request: CreateWeightedRoute) -> Self {
        Self {
            host: request.host,
            service_name: request.service_name,
            service_port: request.service_port,
            upstream_name: request.upstream_name,
            traffic: request.traffic,
        }
    }
}

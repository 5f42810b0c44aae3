//! Apisix ingress controller resources (`apisix.apache.org/v2`).

use std::collections::BTreeMap;

use kube::CustomResource;
#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Route rule name of a weighted route.
const WEIGHTED_RULE_NAME: &str = "rule-1";

/// Protocol of stream rules.
const STREAM_PROTOCOL: &str = "TCP";

/// Load balancer type of upstreams created by the gateway.
const ROUND_ROBIN: &str = "roundrobin";

/// External node type for upstreams addressed by host name.
const DOMAIN_NODE: &str = "Domain";

/// Desired state of an `ApisixRoute`.
#[derive(CustomResource, Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[kube(
    group = "apisix.apache.org",
    version = "v2",
    kind = "ApisixRoute",
    namespaced,
    schema = "disabled"
)]
#[serde(rename_all = "camelCase")]
pub struct ApisixRouteSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub http: Vec<ApisixRouteHttp>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stream: Vec<ApisixRouteStream>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct ApisixRouteHttp {
    pub name: String,
    #[serde(rename = "match")]
    pub matches: ApisixRouteHttpMatch,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub backends: Vec<ApisixRouteHttpBackend>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub upstreams: Vec<ApisixRouteUpstreamReference>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct ApisixRouteHttpMatch {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hosts: Vec<String>,
    #[serde(default)]
    pub paths: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct ApisixRouteHttpBackend {
    pub service_name: String,
    pub service_port: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<i32>,
}

/// Reference from an HTTP rule to an `ApisixUpstream`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct ApisixRouteUpstreamReference {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct ApisixRouteStream {
    pub name: String,
    pub protocol: String,
    #[serde(rename = "match")]
    pub matches: ApisixRouteStreamMatch,
    pub backend: ApisixRouteStreamBackend,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct ApisixRouteStreamMatch {
    pub ingress_port: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct ApisixRouteStreamBackend {
    pub service_name: String,
    pub service_port: i32,
}

/// Desired state of an `ApisixUpstream`.
#[derive(CustomResource, Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[kube(
    group = "apisix.apache.org",
    version = "v2",
    kind = "ApisixUpstream",
    namespaced,
    schema = "disabled"
)]
#[serde(rename_all = "camelCase")]
pub struct ApisixUpstreamSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loadbalancer: Option<ApisixUpstreamLoadBalancer>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub external_nodes: Vec<ApisixUpstreamExternalNode>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct ApisixUpstreamLoadBalancer {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct ApisixUpstreamExternalNode {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<i32>,
}

/// Service backend of a requested route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteBackend {
    pub service_name: String,
    pub service_port: i32,
    pub weight: Option<i32>,
}

/// Requested HTTP rule: one host, one path prefix, any number of backends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpRoute {
    pub hosts: String,
    pub paths: String,
    pub backends: Vec<RouteBackend>,
}

/// Requested stream rule forwarding one ingress port.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamRoute {
    pub ingress_port: i32,
    pub backend: RouteBackend,
}

/// Route that splits traffic for one host across several upstreams.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightedRoute {
    pub host: String,
    pub service_name: String,
    pub service_port: i32,
    /// Upstream used when `traffic` holds no positive weight.
    pub upstream_name: String,
    /// Upstream name to weight.
    pub traffic: BTreeMap<String, i32>,
}

impl From<&RouteBackend> for ApisixRouteHttpBackend {
    fn from(backend: &RouteBackend) -> Self {
        Self {
            service_name: backend.service_name.clone(),
            service_port: backend.service_port,
            weight: backend.weight,
        }
    }
}

impl From<&HttpRoute> for ApisixRouteHttp {
    fn from(route: &HttpRoute) -> Self {
        Self {
            name: format!("http-route-{}", route.hosts),
            matches: ApisixRouteHttpMatch {
                hosts: vec![route.hosts.clone()],
                paths: vec![route.paths.clone()],
            },
            backends: route.backends.iter().map(Into::into).collect(),
            upstreams: Vec::new(),
        }
    }
}

impl From<&StreamRoute> for ApisixRouteStream {
    fn from(route: &StreamRoute) -> Self {
        Self {
            name: format!("stream-route-{}", route.ingress_port),
            protocol: STREAM_PROTOCOL.to_owned(),
            matches: ApisixRouteStreamMatch {
                ingress_port: route.ingress_port,
            },
            backend: ApisixRouteStreamBackend {
                service_name: route.backend.service_name.clone(),
                service_port: route.backend.service_port,
            },
        }
    }
}

impl ApisixRouteSpec {
    /// Builds the rules of a route from the requested HTTP and stream rules.
    pub fn from_routes(http: &[HttpRoute], stream: &[StreamRoute]) -> Self {
        Self {
            http: http.iter().map(Into::into).collect(),
            stream: stream.iter().map(Into::into).collect(),
        }
    }

    /// Returns `true` if the route has neither HTTP nor stream rules.
    pub fn is_empty(&self) -> bool {
        self.http.is_empty() && self.stream.is_empty()
    }
}

impl WeightedRoute {
    /// Returns the upstream references in name order, dropping non-positive
    /// weights.
    ///
    /// Falls back to a single unweighted reference to `upstream_name` when no
    /// positive weight remains.
    pub fn upstream_references(&self) -> Vec<ApisixRouteUpstreamReference> {
        let references: Vec<_> = self
            .traffic
            .iter()
            .filter(|(_, weight)| **weight > 0)
            .map(|(name, weight)| ApisixRouteUpstreamReference {
                name: name.clone(),
                weight: Some(*weight),
            })
            .collect();

        if references.is_empty() {
            return vec![ApisixRouteUpstreamReference {
                name: self.upstream_name.clone(),
                weight: None,
            }];
        }

        references
    }

    /// Builds the single-rule route spec matching every path of `host`.
    pub fn to_spec(&self) -> ApisixRouteSpec {
        ApisixRouteSpec {
            http: vec![ApisixRouteHttp {
                name: WEIGHTED_RULE_NAME.to_owned(),
                matches: ApisixRouteHttpMatch {
                    hosts: vec![self.host.clone()],
                    paths: vec!["/".to_owned()],
                },
                backends: vec![ApisixRouteHttpBackend {
                    service_name: self.service_name.clone(),
                    service_port: self.service_port,
                    weight: None,
                }],
                upstreams: self.upstream_references(),
            }],
            stream: Vec::new(),
        }
    }
}

impl ApisixUpstreamSpec {
    /// Round-robin upstream with one external domain node of weight 1.
    pub fn external_domain(host: impl Into<String>, port: i32) -> Self {
        Self {
            loadbalancer: Some(ApisixUpstreamLoadBalancer {
                kind: ROUND_ROBIN.to_owned(),
            }),
            external_nodes: vec![ApisixUpstreamExternalNode {
                kind: DOMAIN_NODE.to_owned(),
                name: host.into(),
                port: Some(port),
                weight: Some(1),
            }],
        }
    }
}

//! Ingress-backed routes.

use k8s_openapi::api::networking::v1::{
    HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule,
    IngressServiceBackend, IngressSpec, ServiceBackendPort,
};
use kube::api::ObjectMeta;
#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Path type used for every generated ingress path.
const PATH_TYPE_PREFIX: &str = "Prefix";

/// One path of a route and the service it forwards to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct RoutePath {
    /// Backend service name.
    pub name: String,
    /// Backend service port number.
    pub port: i32,
    pub path: String,
}

/// Host rule of a route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct RouteRule {
    pub host: String,
    pub paths: Vec<RoutePath>,
}

/// Flattens the rules of an ingress.
///
/// Paths without a service backend are skipped.
pub fn rules_from_ingress(ingress: &Ingress) -> Vec<RouteRule> {
    let rules = ingress.spec.as_ref().and_then(|spec| spec.rules.as_ref());

    rules
        .into_iter()
        .flatten()
        .map(|rule| RouteRule {
            host: rule.host.clone().unwrap_or_default(),
            paths: rule
                .http
                .iter()
                .flat_map(|http| http.paths.iter())
                .filter_map(|path| {
                    let service = path.backend.service.as_ref()?;
                    Some(RoutePath {
                        name: service.name.clone(),
                        port: service.port.as_ref().and_then(|p| p.number).unwrap_or_default(),
                        path: path.path.clone().unwrap_or_default(),
                    })
                })
                .collect(),
        })
        .collect()
}

/// Builds an ingress named `name` with prefix paths for every rule.
pub fn build_ingress(namespace: &str, name: &str, rules: &[RouteRule]) -> Ingress {
    let rules = rules
        .iter()
        .map(|rule| IngressRule {
            host: Some(rule.host.clone()),
            http: Some(HTTPIngressRuleValue {
                paths: rule
                    .paths
                    .iter()
                    .map(|path| HTTPIngressPath {
                        path: Some(path.path.clone()),
                        path_type: PATH_TYPE_PREFIX.to_owned(),
                        backend: IngressBackend {
                            service: Some(IngressServiceBackend {
                                name: path.name.clone(),
                                port: Some(ServiceBackendPort {
                                    number: Some(path.port),
                                    name: None,
                                }),
                            }),
                            resource: None,
                        },
                    })
                    .collect(),
            }),
        })
        .collect();

    Ingress {
        metadata: ObjectMeta {
            name: Some(name.to_owned()),
            namespace: Some(namespace.to_owned()),
            ..ObjectMeta::default()
        },
        spec: Some(IngressSpec {
            rules: Some(rules),
            ..IngressSpec::default()
        }),
        status: None,
    }
}

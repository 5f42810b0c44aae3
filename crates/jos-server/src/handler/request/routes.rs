use jos_kube::model::RouteRule;
use schemars::JsonSchema;
use serde::Deserialize;
use validator::Validate;

use super::default_namespace;

/// Creates or replaces an ingress.
#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
pub struct CreateRoute {
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "ingress name cannot be empty"))]
    pub ing_name: String,
    #[serde(default)]
    pub rules: Vec<RouteRule>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DeleteRoute {
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default)]
    pub route_name: String,
}

/// Stores a certificate and key as a TLS secret.
#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
pub struct CreateTls {
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[validate(length(min = 1, message = "secret name cannot be empty"))]
    pub name: String,
    /// PEM certificate chain.
    pub crt: String,
    /// PEM private key.
    pub key: String,
}

//! Request types for HTTP handlers.

mod apisix;
mod charts;
mod components;
mod nodes;
mod pods;
mod releases;
mod routes;

pub use apisix::*;
pub use charts::*;
pub use components::*;
pub use nodes::*;
pub use pods::*;
pub use releases::*;
pub use routes::*;

/// Namespace used when a request leaves it unset.
pub const DEFAULT_NAMESPACE: &str = "default";

pub(crate) fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_owned()
}

/// Returns `namespace`, or [`DEFAULT_NAMESPACE`] when unset or empty.
pub(crate) fn namespace_or_default(namespace: Option<String>) -> String {
    namespace
        .filter(|namespace| !namespace.is_empty())
        .unwrap_or_else(default_namespace)
}

/// Query selecting a namespace, `default` when omitted.
#[derive(Debug, Clone, serde::Deserialize, schemars::JsonSchema)]
pub struct NamespaceQuery {
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

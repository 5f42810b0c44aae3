//! Typed resources and the views returned to callers.
//!
//! Custom resources are declared with `kube::CustomResource` so that every
//! object sent to the API server is built from checked Rust structs instead
//! of nested maps.

mod apisix;
mod certificate;
mod machine;
mod node;
mod owner;
mod pod;
mod route;
mod service;
mod time;
mod workload;

pub use apisix::{
    ApisixRoute, ApisixRouteHttp, ApisixRouteHttpBackend, ApisixRouteHttpMatch, ApisixRouteSpec,
    ApisixRouteStream, ApisixRouteStreamBackend, ApisixRouteStreamMatch,
    ApisixRouteUpstreamReference, ApisixUpstream, ApisixUpstreamExternalNode,
    ApisixUpstreamLoadBalancer, ApisixUpstreamSpec, HttpRoute, RouteBackend, StreamRoute,
    WeightedRoute,
};
pub use certificate::{CertInfo, TLS_SECRET_TYPE, parse_certificate, tls_secret};
pub use machine::{Machine, MachineSpec};
pub use node::NodeInfo;
pub use owner::{ControllerRef, MAX_OWNER_HOPS, OwnerKind, RootWorkload, app_name};
pub use pod::{ContainerInfo, PodStatusInfo, format_age, pod_status, release_selector};
pub use route::{RoutePath, RouteRule, build_ingress, rules_from_ingress};
pub use service::{SERVICE_CODE_LABEL, ServiceInfo};
pub use time::to_timestamp;
pub use workload::{
    COMPONENT_LABEL, MODE_LABEL, MODE_VALUE, WorkloadKind, clone_deployment, clone_service,
    clone_stateful_set,
};

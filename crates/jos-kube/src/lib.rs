#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

// Tracing target constants for consistent logging.

/// Tracing target for client construction and configuration.
pub const TRACING_TARGET_CLIENT: &str = "jos_kube::client";

/// Tracing target for cluster reads and writes.
pub const TRACING_TARGET_QUERY: &str = "jos_kube::query";

mod client;
mod error;
pub mod model;
pub mod query;

pub use crate::client::{KubeClient, KubeConfig};
pub use crate::error::{Error, Result};
pub use crate::query::{
    ApisixRepository, IngressRepository, MachineRepository, NodeRepository, OwnerLookup,
    OwnerRepository, PodRepository, SecretRepository, ServiceRepository, WorkloadRepository,
    walk_to_root,
};

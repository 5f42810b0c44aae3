#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

// Tracing target constants for consistent logging.

/// Tracing target for helm invocations.
pub const TRACING_TARGET_CLIENT: &str = "jos_helm::client";

/// Tracing target for release lifecycle operations.
pub const TRACING_TARGET_RELEASE: &str = "jos_helm::release";

mod client;
mod command;
mod error;
mod manifest;
mod name;
mod release;
mod values;

pub use crate::client::{HelmClient, HelmConfig, HelmRepository};
pub use crate::command::{InstallRequest, UpgradeRequest};
pub use crate::error::{Error, Result};
pub use crate::manifest::{ManifestResource, parse_manifest};
pub use crate::name::{MAX_RELEASE_NAME_LEN, is_namespace_name, is_release_name};
pub use crate::release::{ChartMetadata, InstalledChart, Release, ReleaseChart, ReleaseInfo, ReleaseSummary};
pub use crate::values::parse_values;

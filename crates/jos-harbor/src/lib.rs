#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

// Tracing target constants for consistent logging.

/// Tracing target for client construction and configuration.
pub const TRACING_TARGET_CLIENT: &str = "jos_harbor::client";

/// Tracing target for chart push and index operations.
pub const TRACING_TARGET_CHART: &str = "jos_harbor::chart";

/// Tracing target for project and repository listing.
pub const TRACING_TARGET_PROJECT: &str = "jos_harbor::project";

mod chart;
mod client;
mod error;
mod index;
mod project;

pub use crate::client::{HarborClient, HarborConfig, RepositoryEntry, RepositoryFile};
pub use crate::error::{Error, Result};
pub use crate::index::{ChartEntry, ChartInfo, ChartPage, IndexFile};
pub use crate::project::ProjectImage;

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for Prometheus queries.
pub const TRACING_TARGET: &str = "jos_prometheus::query";

mod client;
mod config;
mod error;
mod query;

pub use crate::client::{PodUsage, PrometheusClient};
pub use crate::config::PrometheusConfig;
pub use crate::error::{Error, Result};
pub use crate::query::{Sample, cpu_usage_query, memory_usage_query};

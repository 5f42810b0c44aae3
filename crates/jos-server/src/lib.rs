#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

// Tracing target constants for consistent logging.

/// Tracing target for bearer token parsing.
pub const TRACING_TARGET_AUTHENTICATION: &str = "jos_server::extract::auth";

/// Tracing target for service construction.
pub const TRACING_TARGET_SERVICE: &str = "jos_server::service";

pub mod extract;
pub mod handler;
pub mod middleware;
pub mod service;

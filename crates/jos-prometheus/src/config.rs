//! Prometheus client configuration.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

/// Default timeout for Prometheus queries: 10 seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Configuration for the Prometheus HTTP API client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct PrometheusConfig {
    /// Base URL of the Prometheus server
    #[cfg_attr(
        feature = "config",
        arg(
            long = "prometheus-url",
            env = "PROMETHEUS_URL",
            default_value = "http://prometheus-operated.monitoring.svc:9090"
        )
    )]
    #[serde(default = "default_url")]
    pub prometheus_url: String,

    /// Query timeout in seconds
    #[cfg_attr(
        feature = "config",
        arg(long = "prometheus-timeout", env = "PROMETHEUS_TIMEOUT", default_value = "10")
    )]
    #[serde(default = "default_timeout_secs")]
    pub prometheus_timeout_secs: u64,
}

fn default_url() -> String {
    "http://prometheus-operated.monitoring.svc:9090".to_owned()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            prometheus_url: default_url(),
            prometheus_timeout_secs: default_timeout_secs(),
        }
    }
}

impl PrometheusConfig {
    /// Creates a configuration for the server at `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            prometheus_url: url.into(),
            ..Self::default()
        }
    }

    /// Returns the query timeout, using the default if zero.
    pub fn timeout(&self) -> Duration {
        match self.prometheus_timeout_secs {
            0 => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            secs => Duration::from_secs(secs),
        }
    }

    /// URL of the instant query endpoint.
    pub fn query_url(&self) -> String {
        format!("{}/api/v1/query", self.prometheus_url.trim_end_matches('/'))
    }
}

//! Prometheus HTTP API client.

use std::sync::Arc;

use reqwest::{Client, StatusCode};

use crate::query::QueryResponse;
use crate::{
    Error, PrometheusConfig, Result, Sample, TRACING_TARGET, cpu_usage_query, memory_usage_query,
};

/// Bytes per megabyte used when reporting memory usage.
const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

struct PrometheusClientInner {
    http: Client,
    config: PrometheusConfig,
}

/// Prometheus instant-query client.
#[derive(Clone)]
pub struct PrometheusClient {
    inner: Arc<PrometheusClientInner>,
}

/// Resource usage of a single pod.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PodUsage {
    pub cpu_cores: f64,
    pub memory_mb: f64,
}

impl std::ops::Add for PodUsage {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            cpu_cores: self.cpu_cores + rhs.cpu_cores,
            memory_mb: self.memory_mb + rhs.memory_mb,
        }
    }
}

impl std::iter::Sum for PodUsage {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |acc, usage| acc + usage)
    }
}

impl PrometheusClient {
    /// Creates a new client with the given configuration.
    pub fn new(config: PrometheusConfig) -> Result<Self> {
        let http = Client::builder().timeout(config.timeout()).build()?;

        tracing::debug!(
            target: TRACING_TARGET,
            prometheus_url = %config.prometheus_url,
            "Created prometheus client"
        );

        Ok(Self {
            inner: Arc::new(PrometheusClientInner { http, config }),
        })
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &PrometheusConfig {
        &self.inner.config
    }

    /// Runs an instant query and returns its vector samples.
    #[tracing::instrument(skip(self), target = TRACING_TARGET)]
    pub async fn instant_query(&self, query: &str) -> Result<Vec<Sample>> {
        let response = self
            .inner
            .http
            .get(self.config().query_url())
            .query(&[("query", query)])
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(Error::UnexpectedStatus(response.status().as_u16()));
        }

        let body: QueryResponse = response.json().await?;
        body.into_samples()
    }

    /// Returns the summed CPU cores and working-set memory (MB) of `pod`.
    pub async fn pod_usage(&self, namespace: &str, pod: &str) -> Result<PodUsage> {
        let cpu = self.instant_query(&cpu_usage_query(namespace, pod)).await?;
        let memory = self.instant_query(&memory_usage_query(namespace, pod)).await?;

        let usage = PodUsage {
            cpu_cores: cpu.iter().map(|sample| sample.value).sum(),
            memory_mb: memory.iter().map(|sample| sample.value).sum::<f64>() / BYTES_PER_MB,
        };

        tracing::debug!(
            target: TRACING_TARGET,
            namespace,
            pod,
            cpu_cores = usage.cpu_cores,
            memory_mb = usage.memory_mb,
            "Collected pod usage"
        );

        Ok(usage)
    }
}

impl std::fmt::Debug for PrometheusClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrometheusClient")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

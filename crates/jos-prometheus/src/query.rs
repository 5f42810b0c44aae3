//! PromQL builders and instant-query response decoding.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::{Error, Result};

/// CPU cores consumed by one pod, averaged over five minutes.
pub fn cpu_usage_query(namespace: &str, pod: &str) -> String {
    format!(
        r#"sum(rate(container_cpu_usage_seconds_total{{namespace="{namespace}", pod="{pod}"}}[5m])) by (pod)"#
    )
}

/// Working-set memory of one pod, in bytes.
pub fn memory_usage_query(namespace: &str, pod: &str) -> String {
    format!(r#"sum(container_memory_working_set_bytes{{namespace="{namespace}", pod="{pod}"}}) by (pod)"#)
}

#[derive(Debug, Deserialize)]
pub(crate) struct QueryResponse {
    pub status: String,
    #[serde(default)]
    pub data: Option<QueryData>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QueryData {
    pub result_type: String,
    #[serde(default)]
    pub result: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct VectorSample {
    #[serde(default)]
    metric: BTreeMap<String, String>,
    value: (f64, String),
}

/// A single instant-vector sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub metric: BTreeMap<String, String>,
    pub timestamp: f64,
    pub value: f64,
}

impl QueryResponse {
    /// Extracts the samples of a vector result; other result types yield none.
    pub(crate) fn into_samples(self) -> Result<Vec<Sample>> {
        if self.status != "success" {
            return Err(Error::Query(self.error.unwrap_or(self.status)));
        }

        let Some(data) = self.data.filter(|data| data.result_type == "vector") else {
            return Ok(Vec::new());
        };

        let samples: Vec<VectorSample> =
            serde_json::from_value(data.result).map_err(|err| Error::Decode(err.to_string()))?;

        samples
            .into_iter()
            .map(|sample| {
                let (timestamp, raw) = sample.value;
                let value = raw
                    .parse::<f64>()
                    .map_err(|err| Error::Decode(format!("sample value '{raw}': {err}")))?;
                Ok(Sample {
                    metric: sample.metric,
                    timestamp,
                    value,
                })
            })
            .collect()
    }
}

//! Release requests and the helm arguments they translate to.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// Installs `chart` from the configured repository as `release`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstallRequest {
    pub namespace: String,
    pub release: String,
    pub chart: String,
    /// Chart version; the latest one when unset.
    pub version: Option<String>,
    pub values: Map<String, Value>,
}

impl InstallRequest {
    pub fn new(
        namespace: impl Into<String>,
        release: impl Into<String>,
        chart: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            release: release.into(),
            chart: chart.into(),
            ..Self::default()
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into()).filter(|v: &String| !v.is_empty());
        self
    }

    pub fn with_values(mut self, values: Map<String, Value>) -> Self {
        self.values = values;
        self
    }

    /// Arguments of `helm install`; values are read from stdin.
    pub(crate) fn args(&self, repo: &str) -> Vec<String> {
        let mut args = strings([
            "install",
            &flag("namespace", &self.namespace),
            "--create-namespace",
            "--insecure-skip-tls-verify",
            "--values=-",
            "--output=json",
        ]);
        push_version(&mut args, self.version.as_deref());
        push_positional(
            &mut args,
            [self.release.as_str(), chart_ref(repo, &self.chart).as_str()],
        );
        args
    }
}

/// Upgrades `release` to a chart version with flat string values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpgradeRequest {
    pub namespace: String,
    pub release: String,
    pub chart: String,
    pub version: Option<String>,
    /// Replace resources that cannot be patched.
    pub force: bool,
    /// Top-level values; keys are taken literally, not as dotted paths.
    pub values: BTreeMap<String, String>,
}

impl UpgradeRequest {
    pub fn new(
        namespace: impl Into<String>,
        release: impl Into<String>,
        chart: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            release: release.into(),
            chart: chart.into(),
            ..Self::default()
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into()).filter(|v: &String| !v.is_empty());
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_values(mut self, values: BTreeMap<String, String>) -> Self {
        self.values = values;
        self
    }

    /// Values document written to helm's stdin.
    pub(crate) fn values_document(&self) -> Map<String, Value> {
        self.values
            .iter()
            .map(|(key, value)| (key.clone(), Value::String(value.clone())))
            .collect()
    }

    pub(crate) fn args(&self, repo: &str) -> Vec<String> {
        let mut args = strings([
            "upgrade",
            &flag("namespace", &self.namespace),
            "--insecure-skip-tls-verify",
            "--values=-",
            "--output=json",
        ]);
        push_version(&mut args, self.version.as_deref());
        if self.force {
            args.push("--force".to_owned());
        }
        push_positional(
            &mut args,
            [self.release.as_str(), chart_ref(repo, &self.chart).as_str()],
        );
        args
    }
}

fn chart_ref(repo: &str, chart: &str) -> String {
    format!("{repo}/{chart}")
}

fn push_version(args: &mut Vec<String>, version: Option<&str>) {
    if let Some(version) = version {
        args.push(flag("version", version));
    }
}

/// `--name=value`, so a value starting with `-` is never read as a flag.
pub(crate) fn flag(name: &str, value: &str) -> String {
    format!("--{name}={value}")
}

/// Ends flag parsing with `--` and appends the positional arguments.
pub(crate) fn push_positional<const N: usize>(args: &mut Vec<String>, positional: [&str; N]) {
    args.push("--".to_owned());
    args.extend(positional.into_iter().map(str::to_owned));
}

pub(crate) fn strings<const N: usize>(args: [&str; N]) -> Vec<String> {
    args.into_iter().map(str::to_owned).collect()
}

use std::collections::BTreeMap;

use jos_helm::{is_namespace_name, is_release_name};
use schemars::JsonSchema;
use serde::Deserialize;
use validator::{Validate, ValidationError};

/// Installs a chart from the registry as a new release.
#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
pub struct InstallChart {
    #[serde(default)]
    #[validate(
        length(min = 1, message = "namespace is required"),
        custom(function = "validate_namespace")
    )]
    pub namespace: String,
    #[validate(
        length(min = 1, message = "release_name is required"),
        custom(function = "validate_release_name")
    )]
    pub release_name: String,
    /// Chart name in the registry repository.
    #[validate(length(min = 1, message = "chart name is required"))]
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    /// Values document, YAML or JSON.
    #[serde(default)]
    pub values: Option<String>,
    /// Only parse the values.
    #[serde(default)]
    pub dry_run: bool,
}

/// Selects a release to uninstall.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct UninstallChart {
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub release_name: String,
}

/// Chart reference and values of an upgrade.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct UpgradeChartSpec {
    pub chart_name: String,
    #[serde(default)]
    pub chart_version: String,
    #[serde(default)]
    pub values: BTreeMap<String, String>,
}

/// Upgrades a release to another chart version.
#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
pub struct UpgradeChart {
    #[serde(default)]
    pub namespace: Option<String>,
    #[validate(
        length(min = 1, message = "release_name is required"),
        custom(function = "validate_release_name")
    )]
    pub release_name: String,
    #[serde(default)]
    pub force: bool,
    pub chart: UpgradeChartSpec,
}

/// Rolls a release back to an earlier revision.
#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
pub struct RollbackChart {
    #[serde(default)]
    pub namespace: Option<String>,
    #[validate(
        length(min = 1, message = "release_name is required"),
        custom(function = "validate_release_name")
    )]
    pub release_name: String,
    /// Revision number, as a string.
    pub revision: String,
}

/// Lists the releases of a namespace.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListInstalledCharts {
    #[serde(default)]
    pub namespace: String,
    /// Only the release with this name.
    #[serde(default)]
    pub release_name: Option<String>,
    /// Include each release manifest.
    #[serde(default)]
    pub with_manifest: bool,
}

/// Selects the pods of a release.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ReleasePods {
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub release_name: String,
}

fn validation_error(code: &'static str, message: String) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

/// Helm's release naming rule. Empty names are reported by the length rule.
fn validate_release_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() || is_release_name(name) {
        return Ok(());
    }
    Err(validation_error(
        "release_name_format",
        format!(
            "invalid release_name: {name} (lowercase letters, digits, '-' and '.', at most {} \
             characters)",
            jos_helm::MAX_RELEASE_NAME_LEN
        ),
    ))
}

fn validate_namespace(namespace: &str) -> Result<(), ValidationError> {
    if namespace.is_empty() || is_namespace_name(namespace) {
        return Ok(());
    }
    Err(validation_error(
        "namespace_format",
        format!("invalid namespace: {namespace}"),
    ))
}

//! Release documents printed by `helm status`, `helm install` and `helm list`.

#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{ManifestResource, Result, parse_manifest};

/// Release as printed by `helm status -o json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Release {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    /// Revision number.
    #[serde(default)]
    pub version: i32,
    #[serde(default)]
    pub info: ReleaseInfo,
    #[serde(default)]
    pub chart: Option<ReleaseChart>,
    #[serde(default)]
    pub manifest: String,
}

/// Lifecycle details of a release revision.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReleaseInfo {
    #[serde(default)]
    pub first_deployed: String,
    #[serde(default)]
    pub last_deployed: String,
    #[serde(default)]
    pub deleted: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReleaseChart {
    #[serde(default)]
    pub metadata: ChartMetadata,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMetadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub app_version: String,
}

impl Release {
    /// Lists the Kubernetes objects rendered by this revision.
    pub fn resources(&self) -> Result<Vec<ManifestResource>> {
        parse_manifest(&self.manifest)
    }
}

/// Row printed by `helm list -o json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReleaseSummary {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub revision: String,
    #[serde(default)]
    pub updated: String,
    #[serde(default)]
    pub status: String,
    /// Chart reference in `<name>-<version>` form.
    #[serde(default)]
    pub chart: String,
    #[serde(default)]
    pub app_version: String,
}

impl ReleaseSummary {
    /// Splits [`chart`](Self::chart) into chart name and version.
    ///
    /// The version starts at the first `-` followed by a dotted numeric
    /// segment, so `ingress-nginx-4.10.0` yields `("ingress-nginx", "4.10.0")`.
    pub fn chart_name_and_version(&self) -> (&str, &str) {
        let chart = self.chart.as_str();
        let split = chart.match_indices('-').map(|(i, _)| i).find(|&i| {
            let rest = &chart[i + 1..];
            rest.starts_with(|c: char| c.is_ascii_digit()) && rest.contains('.')
        });

        match split {
            Some(i) => (&chart[..i], &chart[i + 1..]),
            None => (chart, ""),
        }
    }
}

/// Installed chart as reported by the release listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct InstalledChart {
    pub name: String,
    pub namespace: String,
    pub chart_version: String,
    pub app_version: String,
    pub chart_name: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest: Option<String>,
}

impl From<&ReleaseSummary> for InstalledChart {
    fn from(summary: &ReleaseSummary) -> Self {
        let (chart_name, chart_version) = summary.chart_name_and_version();
        Self {
            name: summary.name.clone(),
            namespace: summary.namespace.clone(),
            chart_version: chart_version.to_owned(),
            app_version: summary.app_version.clone(),
            chart_name: chart_name.to_owned(),
            status: summary.status.clone(),
            manifest: None,
        }
    }
}

impl InstalledChart {
    pub fn with_manifest(mut self, manifest: impl Into<String>) -> Self {
        self.manifest = Some(manifest.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(chart: &str) -> ReleaseSummary {
        ReleaseSummary {
            name: "shop".to_owned(),
            namespace: "prod".to_owned(),
            revision: "3".to_owned(),
            status: "deployed".to_owned(),
            chart: chart.to_owned(),
            app_version: "1.25".to_owned(),
            ..ReleaseSummary::default()
        }
    }

    #[test]
    fn status_output_is_decoded() -> anyhow::Result<()> {
        let json = r#"{
            "name": "shop",
            "namespace": "prod",
            "version": 2,
            "info": {
                "first_deployed": "2024-03-01T10:00:00Z",
                "last_deployed": "2024-03-02T10:00:00Z",
                "deleted": "",
                "description": "Upgrade complete",
                "status": "deployed",
                "notes": "ignored"
            },
            "chart": {"metadata": {"name": "nginx", "version": "1.2.3", "appVersion": "1.25"}},
            "manifest": "---\napiVersion: v1\nkind: Service\nmetadata:\n  name: shop-nginx\n",
            "config": {}
        }"#;

        let release: Release = serde_json::from_str(json)?;
        assert_eq!(release.version, 2);
        assert_eq!(release.info.description, "Upgrade complete");
        assert_eq!(
            release.chart.as_ref().map(|c| c.metadata.app_version.as_str()),
            Some("1.25")
        );

        let resources = release.resources()?;
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].kind, "Service");
        Ok(())
    }

    #[test]
    fn chart_reference_is_split() {
        assert_eq!(summary("nginx-1.2.3").chart_name_and_version(), ("nginx", "1.2.3"));
        assert_eq!(
            summary("ingress-nginx-4.10.0").chart_name_and_version(),
            ("ingress-nginx", "4.10.0")
        );
        assert_eq!(
            summary("app-0.1.0-rc.1").chart_name_and_version(),
            ("app", "0.1.0-rc.1")
        );
        assert_eq!(summary("plain").chart_name_and_version(), ("plain", ""));
    }

    #[test]
    fn installed_chart_from_summary() -> anyhow::Result<()> {
        let installed = InstalledChart::from(&summary("nginx-1.2.3"));
        assert_eq!(installed.chart_name, "nginx");
        assert_eq!(installed.chart_version, "1.2.3");

        let json = serde_json::to_value(&installed)?;
        assert_eq!(json["chartVersion"], "1.2.3");
        assert!(json.get("manifest").is_none());

        let json = serde_json::to_value(installed.with_manifest("kind: Service"))?;
        assert_eq!(json["manifest"], "kind: Service");
        Ok(())
    }
}

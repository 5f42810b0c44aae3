use jos_helm::{ManifestResource, Release};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Release created by an install.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InstalledRelease {
    pub release_name: String,
    pub first_deployed: String,
    pub last_deployed: String,
    pub deleted: String,
    pub status: String,
    /// Objects rendered by the release manifest.
    pub resources: Vec<ManifestResource>,
}

impl InstalledRelease {
    pub fn new(release: &Release, resources: Vec<ManifestResource>) -> Self {
        Self {
            release_name: release.name.clone(),
            first_deployed: release.info.first_deployed.clone(),
            last_deployed: release.info.last_deployed.clone(),
            deleted: release.info.deleted.clone(),
            status: release.info.status.clone(),
            resources,
        }
    }
}

/// Outcome of an upgrade.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct UpgradedRelease {
    pub status: String,
    pub revision: i32,
}

impl From<&Release> for UpgradedRelease {
    fn from(release: &Release) -> Self {
        Self {
            status: release.info.status.clone(),
            revision: release.version,
        }
    }
}

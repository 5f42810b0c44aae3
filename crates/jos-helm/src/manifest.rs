//! Release manifest inspection.

#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Kubernetes object rendered by a release.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct ManifestResource {
    pub api_version: String,
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawResource {
    #[serde(default)]
    api_version: String,
    #[serde(default)]
    kind: String,
    #[serde(default)]
    metadata: RawMetadata,
}

#[derive(Default, Deserialize)]
struct RawMetadata {
    #[serde(default)]
    name: String,
    #[serde(default)]
    namespace: String,
}

/// Lists the objects of a multi-document manifest, skipping empty documents.
pub fn parse_manifest(manifest: &str) -> Result<Vec<ManifestResource>> {
    let mut resources = Vec::new();

    for document in serde_yaml::Deserializer::from_str(manifest) {
        let Some(raw) = Option::<RawResource>::deserialize(document)? else {
            continue;
        };

        resources.push(ManifestResource {
            api_version: raw.api_version,
            kind: raw.kind,
            namespace: raw.metadata.namespace,
            name: raw.metadata.name,
        });
    }

    Ok(resources)
}

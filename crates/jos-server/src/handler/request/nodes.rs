use schemars::JsonSchema;
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ListNodes {
    /// Substring of the node name or internal IP.
    #[serde(default)]
    pub keyword: Option<String>,
}

/// Requests a new machine from Cluster API.
#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
pub struct AddNode {
    #[serde(default)]
    #[validate(length(min = 1, message = "missing node name"))]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct NodePath {
    pub name: String,
}

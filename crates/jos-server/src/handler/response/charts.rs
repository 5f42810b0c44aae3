use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Result of a chart upload.
///
/// Unlike other routes the upload answers with this flat document, matching
/// what chart publishing scripts already parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct UploadOutcome {
    pub success: bool,
    pub message: String,
    /// URL the chart is served from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_url: Option<String>,
    /// Number of bytes received.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_received: Option<u64>,
    /// Content digest as `sha256:<hex>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

use schemars::JsonSchema;
use serde::Deserialize;

/// Paging of the chart repository listing.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListCharts {
    /// 1-based page number.
    #[serde(default)]
    pub limit: i32,
    /// Page size.
    #[serde(default)]
    pub size: i32,
    /// Case-insensitive filter on name or description.
    #[serde(default)]
    pub keyword: Option<String>,
}

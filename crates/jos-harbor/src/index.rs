//! Chart repository index and paged chart listings.

use std::collections::BTreeMap;

use jiff::Timestamp;
#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// User reported as the last updater of every chart.
const UPDATE_USER: &str = "admin";

/// Helm repository `index.yaml` document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexFile {
    #[serde(default)]
    pub api_version: Option<String>,
    #[serde(default)]
    pub entries: BTreeMap<String, Vec<ChartEntry>>,
}

/// One chart version listed in the index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartEntry {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub app_version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub created: Option<String>,
}

/// Chart summary returned by chart listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct ChartInfo {
    pub name: String,
    pub chart_version: String,
    pub icon_url: String,
    pub app_version: String,
    pub description: String,
    pub update_date: String,
    pub update_user: String,
}

/// One page of a chart listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct ChartPage {
    /// Number of charts in the repository, or of matches when filtered.
    pub total: i32,
    pub page_size: i32,
    pub total_page: i32,
    pub current_page: i32,
    pub charts: Vec<ChartInfo>,
}

impl From<&ChartEntry> for ChartInfo {
    fn from(entry: &ChartEntry) -> Self {
        Self {
            name: entry.name.clone(),
            chart_version: entry.version.clone(),
            icon_url: entry.icon.clone().unwrap_or_default(),
            app_version: entry.app_version.clone().unwrap_or_default(),
            description: entry.description.clone().unwrap_or_default(),
            update_date: entry
                .created
                .as_deref()
                .map(format_created)
                .unwrap_or_default(),
            update_user: UPDATE_USER.to_owned(),
        }
    }
}

/// Renders an index timestamp as `YYYY-MM-DD HH:MM:SS` (UTC), keeping the raw
/// value when it is not RFC 3339.
fn format_created(created: &str) -> String {
    match created.parse::<Timestamp>() {
        Ok(timestamp) => timestamp.strftime("%Y-%m-%d %H:%M:%S").to_string(),
        Err(_) => created.to_owned(),
    }
}

impl IndexFile {
    /// Flattens every chart version, ordered by the lowercase first letter
    /// of the chart name.
    pub fn charts(&self) -> Vec<ChartInfo> {
        let mut charts: Vec<ChartInfo> = self
            .entries
            .values()
            .flatten()
            .map(ChartInfo::from)
            .collect();
        charts.sort_by_key(|chart| chart.name.chars().next().map(|c| c.to_ascii_lowercase()));
        charts
    }
}

impl ChartPage {
    /// Pages `charts` with a 1-based page number (`limit`) and page `size`.
    ///
    /// The keyword filter applies to the selected page only; when it is set
    /// `total` reports the number of matches on that page. Returns `None`
    /// when `limit` or `size` is not positive.
    pub fn paginate(
        charts: Vec<ChartInfo>,
        limit: i32,
        size: i32,
        keyword: Option<&str>,
    ) -> Option<Self> {
        if limit <= 0 || size <= 0 {
            return None;
        }

        let total = charts.len();
        let page_size = size as usize;
        let total_page = total.div_ceil(page_size);

        let start = ((limit as usize - 1) * page_size).min(total);
        let end = (limit as usize * page_size).min(total);
        let mut page: Vec<ChartInfo> = charts.into_iter().skip(start).take(end - start).collect();
        let mut total = total;

        if let Some(keyword) = keyword.filter(|k| !k.is_empty()) {
            let keyword = keyword.to_lowercase();
            page.retain(|chart| {
                chart.name.to_lowercase().contains(&keyword)
                    || chart.description.to_lowercase().contains(&keyword)
            });
            total = page.len();
        }

        Some(Self {
            total: total as i32,
            page_size: size,
            total_page: total_page as i32,
            current_page: limit,
            charts: page,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chart(name: &str, description: &str) -> ChartInfo {
        ChartInfo {
            name: name.to_owned(),
            chart_version: "1.0.0".to_owned(),
            icon_url: String::new(),
            app_version: String::new(),
            description: description.to_owned(),
            update_date: String::new(),
            update_user: UPDATE_USER.to_owned(),
        }
    }

    fn names(page: &ChartPage) -> Vec<&str> {
        page.charts.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn charts_are_flattened_and_sorted() {
        let mut index = IndexFile::default();
        for name in ["redis", "Apache", "mysql"] {
            index.entries.insert(
                name.to_owned(),
                vec![ChartEntry {
                    name: name.to_owned(),
                    version: "1.0.0".to_owned(),
                    created: Some("2024-03-01T10:00:00Z".to_owned()),
                    ..ChartEntry::default()
                }],
            );
        }

        let charts = index.charts();
        let names: Vec<_> = charts.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Apache", "mysql", "redis"]);
        assert_eq!(charts[0].update_date, "2024-03-01 10:00:00");
        assert_eq!(charts[0].update_user, "admin");
    }

    #[test]
    fn invalid_page_is_rejected() {
        assert!(ChartPage::paginate(vec![], 0, 10, None).is_none());
        assert!(ChartPage::paginate(vec![], 1, 0, None).is_none());
        assert!(ChartPage::paginate(vec![], -1, 10, None).is_none());
    }

    #[test]
    fn pages_are_clamped() {
        let charts: Vec<_> = ["a", "b", "c", "d", "e"]
            .into_iter()
            .map(|n| chart(n, ""))
            .collect();

        let page = ChartPage::paginate(charts.clone(), 2, 2, None).unwrap();
        assert_eq!(names(&page), ["c", "d"]);
        assert_eq!(page.total, 5);
        assert_eq!(page.total_page, 3);
        assert_eq!(page.current_page, 2);
        assert_eq!(page.page_size, 2);

        let page = ChartPage::paginate(charts.clone(), 3, 2, None).unwrap();
        assert_eq!(names(&page), ["e"]);

        let page = ChartPage::paginate(charts, 9, 2, None).unwrap();
        assert!(page.charts.is_empty());
        assert_eq!(page.total, 5);
    }

    #[test]
    fn keyword_filters_selected_page() {
        let charts = vec![
            chart("nginx", "web server"),
            chart("redis", "cache"),
            chart("traefik", "edge router for web"),
        ];

        let page = ChartPage::paginate(charts.clone(), 1, 2, Some("WEB")).unwrap();
        assert_eq!(names(&page), ["nginx"]);
        assert_eq!(page.total, 1);
        assert_eq!(page.total_page, 2);

        let page = ChartPage::paginate(charts, 1, 10, Some("")).unwrap();
        assert_eq!(page.total, 3);
    }

    #[test]
    fn unparseable_created_is_kept() {
        assert_eq!(format_created("yesterday"), "yesterday");
    }
}

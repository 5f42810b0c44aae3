//! Harbor registry client configuration.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::{Error, Result, TRACING_TARGET_CLIENT};

/// Default timeout for registry requests: 60 seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Name of the entry consulted in a Helm `repositories.yaml` file.
pub const REPOSITORY_ENTRY_NAME: &str = "harbor";

/// Path segment separating the Harbor base URL from the chart repository name.
const CHART_REPO_SEGMENT: &str = "/chartrepo/";

/// Connection settings for a Harbor registry.
///
/// Chart operations (`/chartrepo`, `/api/chartrepo`) go through `harbor_url`,
/// while the v2 project API is reached through `harbor_api_url`, which is
/// usually the in-cluster core service.
#[derive(Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "configurations must be used to create a client"]
pub struct HarborConfig {
    /// Base URL of the Harbor instance serving chart repositories
    #[cfg_attr(
        feature = "config",
        arg(
            long = "harbor-url",
            env = "HARBOR_URL",
            default_value = "https://harbor.joiningos.com"
        )
    )]
    #[serde(default = "default_harbor_url")]
    pub harbor_url: String,

    /// Chart repository used for index downloads and release installs
    #[cfg_attr(
        feature = "config",
        arg(
            long = "harbor-chart-repo",
            env = "HARBOR_CHART_REPO",
            default_value = "library"
        )
    )]
    #[serde(default = "default_chart_repo")]
    pub harbor_chart_repo: String,

    /// Base URL of the Harbor v2 API
    #[cfg_attr(
        feature = "config",
        arg(
            long = "harbor-api-url",
            env = "HARBOR_API_URL",
            default_value = "http://harbor-core.harbor.svc.cluster.local"
        )
    )]
    #[serde(default = "default_api_url")]
    pub harbor_api_url: String,

    /// Basic auth username
    #[cfg_attr(
        feature = "config",
        arg(long = "harbor-username", env = "HARBOR_USERNAME", default_value = "admin")
    )]
    #[serde(default = "default_username")]
    pub harbor_username: String,

    /// Basic auth password
    #[cfg_attr(
        feature = "config",
        arg(long = "harbor-password", env = "HARBOR_PASSWORD", default_value = "P@88w0rd")
    )]
    #[serde(default = "default_password")]
    pub harbor_password: String,

    /// Skip TLS certificate verification
    #[cfg_attr(
        feature = "config",
        arg(
            long = "harbor-insecure-tls",
            env = "HARBOR_INSECURE_TLS",
            default_value_t = true,
            action = clap::ArgAction::Set
        )
    )]
    #[serde(default = "default_insecure_tls")]
    pub harbor_insecure_tls: bool,

    /// Helm repositories file whose `harbor` entry overrides url and credentials
    #[cfg_attr(
        feature = "config",
        arg(
            long = "harbor-repository-config",
            env = "HARBOR_REPOSITORY_CONFIG",
            default_value = "/opt/helm/repositories.yaml"
        )
    )]
    #[serde(default)]
    pub harbor_repository_config: Option<PathBuf>,

    /// Request timeout in seconds
    #[cfg_attr(
        feature = "config",
        arg(long = "harbor-timeout", env = "HARBOR_TIMEOUT", default_value = "60")
    )]
    #[serde(default = "default_timeout_secs")]
    pub harbor_timeout_secs: u64,
}

fn default_harbor_url() -> String {
    "https://harbor.joiningos.com".to_owned()
}

fn default_chart_repo() -> String {
    "library".to_owned()
}

fn default_api_url() -> String {
    "http://harbor-core.harbor.svc.cluster.local".to_owned()
}

fn default_username() -> String {
    "admin".to_owned()
}

fn default_password() -> String {
    "P@88w0rd".to_owned()
}

fn default_insecure_tls() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for HarborConfig {
    fn default() -> Self {
        Self {
            harbor_url: default_harbor_url(),
            harbor_chart_repo: default_chart_repo(),
            harbor_api_url: default_api_url(),
            harbor_username: default_username(),
            harbor_password: default_password(),
            harbor_insecure_tls: default_insecure_tls(),
            harbor_repository_config: None,
            harbor_timeout_secs: default_timeout_secs(),
        }
    }
}

impl HarborConfig {
    /// Creates a configuration pointing both chart and API endpoints at `url`.
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            harbor_api_url: url.clone(),
            harbor_url: url,
            ..Self::default()
        }
    }

    /// Sets basic auth credentials.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.harbor_username = username.into();
        self.harbor_password = password.into();
        self
    }

    /// Sets the default chart repository.
    pub fn with_chart_repo(mut self, repo: impl Into<String>) -> Self {
        self.harbor_chart_repo = repo.into();
        self
    }

    /// Returns the request timeout, using the default if zero.
    pub fn timeout(&self) -> Duration {
        match self.harbor_timeout_secs {
            0 => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            secs => Duration::from_secs(secs),
        }
    }

    /// Applies the `harbor` entry of the configured repositories file, if the
    /// file exists.
    ///
    /// A missing file leaves the configuration untouched; an unreadable or
    /// malformed one is an error.
    pub fn resolve_repository_file(self) -> Result<Self> {
        let Some(path) = self.harbor_repository_config.clone() else {
            return Ok(self);
        };

        if !path.exists() {
            tracing::debug!(
                target: TRACING_TARGET_CLIENT,
                path = %path.display(),
                "Repository config not found, keeping configured registry"
            );
            return Ok(self);
        }

        let file = RepositoryFile::load(&path)?;
        match file.get(REPOSITORY_ENTRY_NAME) {
            Some(entry) => self.apply_repository_entry(entry),
            None => Ok(self),
        }
    }

    /// Overrides url and credentials from a Helm repository entry.
    pub fn apply_repository_entry(mut self, entry: &RepositoryEntry) -> Result<Self> {
        let (base, repo) = split_chart_repo_url(&entry.url).ok_or_else(|| {
            Error::Config(format!(
                "repository url '{}' is not a Harbor chart repository",
                entry.url
            ))
        })?;

        self.harbor_url = base.to_owned();
        self.harbor_chart_repo = repo.to_owned();
        if let Some(username) = entry.username.as_deref().filter(|u| !u.is_empty()) {
            self.harbor_username = username.to_owned();
        }
        if let Some(password) = entry.password.as_deref().filter(|p| !p.is_empty()) {
            self.harbor_password = password.to_owned();
        }

        tracing::info!(
            target: TRACING_TARGET_CLIENT,
            harbor_url = %self.harbor_url,
            chart_repo = %self.harbor_chart_repo,
            "Applied repository entry"
        );

        Ok(self)
    }

    fn base_url(&self) -> &str {
        self.harbor_url.trim_end_matches('/')
    }

    fn api_url(&self) -> &str {
        self.harbor_api_url.trim_end_matches('/')
    }

    /// URL of the default chart repository, as registered with `helm repo add`.
    pub fn chart_repo_url(&self) -> String {
        format!("{}/chartrepo/{}", self.base_url(), self.harbor_chart_repo)
    }

    /// URL of the default chart repository index.
    pub fn index_url(&self) -> String {
        format!("{}/index.yaml", self.chart_repo_url())
    }

    /// URL accepting multipart chart uploads for `repo`.
    pub fn chart_upload_url(&self, repo: &str) -> String {
        format!("{}/api/chartrepo/{}/charts", self.base_url(), repo)
    }

    /// URL under which an uploaded chart is served.
    pub fn chart_download_url(&self, repo: &str, file_name: &str) -> String {
        format!("{}/chartrepo/{}/charts/{}", self.base_url(), repo, file_name)
    }

    /// URL listing Harbor projects.
    pub fn projects_url(&self) -> String {
        format!("{}/api/v2.0/projects?page_size=100", self.api_url())
    }

    /// URL listing the repositories of `project`.
    pub fn repositories_url(&self, project: &str) -> String {
        format!(
            "{}/api/v2.0/projects/{}/repositories?with_tag=true",
            self.api_url(),
            project
        )
    }
}

impl fmt::Debug for HarborConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HarborConfig")
            .field("harbor_url", &self.harbor_url)
            .field("harbor_chart_repo", &self.harbor_chart_repo)
            .field("harbor_api_url", &self.harbor_api_url)
            .field("harbor_username", &self.harbor_username)
            .field("harbor_password", &"****")
            .field("harbor_insecure_tls", &self.harbor_insecure_tls)
            .field("harbor_repository_config", &self.harbor_repository_config)
            .field("harbor_timeout_secs", &self.harbor_timeout_secs)
            .finish()
    }
}

/// Splits `https://host/chartrepo/<repo>` into its base URL and repository name.
fn split_chart_repo_url(url: &str) -> Option<(&str, &str)> {
    let url = url.trim_end_matches('/');
    let index = url.rfind(CHART_REPO_SEGMENT)?;
    let repo = &url[index + CHART_REPO_SEGMENT.len()..];
    if repo.is_empty() || repo.contains('/') {
        return None;
    }
    Some((&url[..index], repo))
}

/// Helm `repositories.yaml` document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepositoryFile {
    #[serde(default)]
    pub repositories: Vec<RepositoryEntry>,
}

/// A single repository entry of a Helm `repositories.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryEntry {
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl RepositoryFile {
    /// Reads and decodes a repositories file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&contents)?)
    }

    /// Returns the entry named `name`.
    pub fn get(&self, name: &str) -> Option<&RepositoryEntry> {
        self.repositories.iter().find(|entry| entry.name == name)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn default_urls() {
        let config = HarborConfig::default();
        assert_eq!(
            config.chart_repo_url(),
            "https://harbor.joiningos.com/chartrepo/library"
        );
        assert_eq!(
            config.index_url(),
            "https://harbor.joiningos.com/chartrepo/library/index.yaml"
        );
        assert_eq!(
            config.chart_upload_url("apps"),
            "https://harbor.joiningos.com/api/chartrepo/apps/charts"
        );
        assert_eq!(
            config.chart_download_url("apps", "nginx-1.2.3.tgz"),
            "https://harbor.joiningos.com/chartrepo/apps/charts/nginx-1.2.3.tgz"
        );
        assert_eq!(
            config.projects_url(),
            "http://harbor-core.harbor.svc.cluster.local/api/v2.0/projects?page_size=100"
        );
    }

    #[test]
    fn trailing_slash_is_ignored() {
        let config = HarborConfig::new("http://127.0.0.1:8080/");
        assert_eq!(
            config.chart_upload_url("library"),
            "http://127.0.0.1:8080/api/chartrepo/library/charts"
        );
    }

    #[test]
    fn zero_timeout_uses_default() {
        let mut config = HarborConfig::default();
        config.harbor_timeout_secs = 0;
        assert_eq!(config.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn split_chart_repo() {
        assert_eq!(
            split_chart_repo_url("https://harbor.example.com/chartrepo/library/"),
            Some(("https://harbor.example.com", "library"))
        );
        assert_eq!(split_chart_repo_url("https://harbor.example.com"), None);
        assert_eq!(
            split_chart_repo_url("https://harbor.example.com/chartrepo/"),
            None
        );
    }

    #[test]
    fn debug_masks_password() {
        let debug = format!("{:?}", HarborConfig::default());
        assert!(!debug.contains("P@88w0rd"));
        assert!(debug.contains("****"));
    }

    #[test]
    fn repository_file_overrides_entry() -> anyhow::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(
            file,
            "apiVersion: \"\"\nrepositories:\n- name: stable\n  url: https://charts.example.com\n- name: harbor\n  url: https://registry.example.com/chartrepo/apps\n  username: robot\n  password: secret\n"
        )?;

        let mut config = HarborConfig::default();
        config.harbor_repository_config = Some(file.path().to_path_buf());
        let config = config.resolve_repository_file()?;

        assert_eq!(config.harbor_url, "https://registry.example.com");
        assert_eq!(config.harbor_chart_repo, "apps");
        assert_eq!(config.harbor_username, "robot");
        assert_eq!(config.harbor_password, "secret");
        Ok(())
    }

    #[test]
    fn missing_repository_file_keeps_defaults() -> anyhow::Result<()> {
        let mut config = HarborConfig::default();
        config.harbor_repository_config = Some(PathBuf::from("/nonexistent/repositories.yaml"));
        let config = config.resolve_repository_file()?;
        assert_eq!(config.harbor_url, default_harbor_url());
        Ok(())
    }
}

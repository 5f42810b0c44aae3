//! Helm binary and chart repository configuration.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

/// Default timeout for a single helm invocation: 5 minutes.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Settings for running the helm binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "configurations must be used to create a client"]
pub struct HelmConfig {
    /// Path or name of the helm binary
    #[cfg_attr(
        feature = "config",
        arg(long = "helm-bin", env = "HELM_BIN", default_value = "helm")
    )]
    #[serde(default = "default_helm_bin")]
    pub helm_bin: PathBuf,

    /// Local name the chart repository is registered under
    #[cfg_attr(
        feature = "config",
        arg(long = "helm-repo-name", env = "HELM_REPO_NAME", default_value = "harbor")
    )]
    #[serde(default = "default_repo_name")]
    pub helm_repo_name: String,

    /// Timeout of a single helm invocation in seconds
    #[cfg_attr(
        feature = "config",
        arg(long = "helm-timeout", env = "HELM_TIMEOUT", default_value = "300")
    )]
    #[serde(default = "default_timeout_secs")]
    pub helm_timeout_secs: u64,
}

fn default_helm_bin() -> PathBuf {
    PathBuf::from("helm")
}

fn default_repo_name() -> String {
    "harbor".to_owned()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for HelmConfig {
    fn default() -> Self {
        Self {
            helm_bin: default_helm_bin(),
            helm_repo_name: default_repo_name(),
            helm_timeout_secs: default_timeout_secs(),
        }
    }
}

impl HelmConfig {
    pub fn with_helm_bin(mut self, helm_bin: impl Into<PathBuf>) -> Self {
        self.helm_bin = helm_bin.into();
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.helm_timeout_secs = secs;
        self
    }

    /// Returns the invocation timeout, using the default if zero.
    pub fn timeout(&self) -> Duration {
        match self.helm_timeout_secs {
            0 => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            secs => Duration::from_secs(secs),
        }
    }
}

/// Chart repository registered with `helm repo add`.
#[derive(Clone, PartialEq, Eq)]
pub struct HelmRepository {
    pub name: String,
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub insecure_skip_tls_verify: bool,
}

impl HelmRepository {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            username: None,
            password: None,
            insecure_skip_tls_verify: false,
        }
    }

    /// Sets basic auth credentials; empty values are ignored.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into()).filter(|u: &String| !u.is_empty());
        self.password = Some(password.into()).filter(|p: &String| !p.is_empty());
        self
    }

    pub fn with_insecure_skip_tls_verify(mut self, insecure: bool) -> Self {
        self.insecure_skip_tls_verify = insecure;
        self
    }

    /// Arguments of `helm repo add`, replacing an existing entry.
    pub(crate) fn add_args(&self) -> Vec<String> {
        let mut args = vec![
            "repo".to_owned(),
            "add".to_owned(),
            self.name.clone(),
            self.url.clone(),
            "--force-update".to_owned(),
        ];
        if let Some(username) = &self.username {
            args.extend(["--username".to_owned(), username.clone()]);
        }
        if let Some(password) = &self.password {
            args.extend(["--password".to_owned(), password.clone()]);
        }
        if self.insecure_skip_tls_verify {
            args.push("--insecure-skip-tls-verify".to_owned());
        }
        args
    }
}

impl fmt::Debug for HelmRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HelmRepository")
            .field("name", &self.name)
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "****"))
            .field("insecure_skip_tls_verify", &self.insecure_skip_tls_verify)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_add_args_include_credentials() {
        let repository = HelmRepository::new("harbor", "https://harbor.example.com/chartrepo/library")
            .with_credentials("admin", "secret")
            .with_insecure_skip_tls_verify(true);

        assert_eq!(
            repository.add_args(),
            [
                "repo",
                "add",
                "harbor",
                "https://harbor.example.com/chartrepo/library",
                "--force-update",
                "--username",
                "admin",
                "--password",
                "secret",
                "--insecure-skip-tls-verify",
            ]
        );
        assert!(!format!("{repository:?}").contains("secret"));
    }

    #[test]
    fn empty_credentials_are_skipped() {
        let repository = HelmRepository::new("harbor", "http://127.0.0.1/chartrepo/library")
            .with_credentials("", "");
        assert_eq!(repository.add_args().len(), 5);
    }

    #[test]
    fn zero_timeout_uses_default() {
        let config = HelmConfig::default().with_timeout_secs(0);
        assert_eq!(config.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }
}

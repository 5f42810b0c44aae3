use std::fmt;
use std::process::Stdio;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::command::{flag, push_positional, strings};
use crate::name::{is_namespace_name, validate, validate_release};
use crate::{
    Error, HelmConfig, HelmRepository, InstallRequest, Release, ReleaseSummary, Result,
    TRACING_TARGET_CLIENT, TRACING_TARGET_RELEASE, UpgradeRequest,
};

struct HelmClientInner {
    config: HelmConfig,
    repository: HelmRepository,
}

/// Runs release operations through the helm binary.
///
/// Every method spawns one helm process; the process is killed when the
/// configured timeout elapses or the future is dropped.
#[derive(Clone)]
pub struct HelmClient {
    inner: Arc<HelmClientInner>,
}

impl HelmClient {
    /// Creates a client installing charts from `repository`.
    pub fn new(config: HelmConfig, repository: HelmRepository) -> Self {
        tracing::debug!(
            target: TRACING_TARGET_CLIENT,
            helm_bin = %config.helm_bin.display(),
            repository = %repository.name,
            timeout_secs = config.timeout().as_secs(),
            "Creating helm client"
        );

        Self {
            inner: Arc::new(HelmClientInner { config, repository }),
        }
    }

    #[inline]
    pub fn config(&self) -> &HelmConfig {
        &self.inner.config
    }

    #[inline]
    pub fn repository(&self) -> &HelmRepository {
        &self.inner.repository
    }

    /// Registers the chart repository, replacing a stale entry.
    #[tracing::instrument(skip(self), target = TRACING_TARGET_CLIENT)]
    pub async fn ensure_repository(&self) -> Result<()> {
        self.run("repo add", self.repository().add_args(), None).await?;
        Ok(())
    }

    /// Downloads the latest index of the chart repository.
    #[tracing::instrument(skip(self), target = TRACING_TARGET_CLIENT)]
    pub async fn refresh_repository(&self) -> Result<()> {
        let args = strings(["repo", "update", &self.repository().name]);
        self.run("repo update", args, None).await?;
        Ok(())
    }

    /// Returns the current revision of `release`, or `None` if it is not installed.
    #[tracing::instrument(skip(self), target = TRACING_TARGET_RELEASE)]
    pub async fn status(&self, namespace: &str, release: &str) -> Result<Option<Release>> {
        validate(namespace, release)?;
        let mut args = strings(["status", &flag("namespace", namespace), "--output=json"]);
        push_positional(&mut args, [release]);

        match self.run_json("status", args, None).await {
            Ok(release) => Ok(Some(release)),
            Err(error) if error.is_release_not_found() => Ok(None),
            Err(error) => Err(error),
        }
    }

    /// Installs a release, creating its namespace when missing.
    ///
    /// A failed install is uninstalled (waiting for deletion) before the
    /// install error is returned.
    #[tracing::instrument(
        skip(self, request),
        fields(namespace = %request.namespace, release = %request.release, chart = %request.chart),
        target = TRACING_TARGET_RELEASE
    )]
    pub async fn install(&self, request: &InstallRequest) -> Result<Release> {
        validate(&request.namespace, &request.release)?;
        let values = serde_json::to_vec(&request.values)?;
        let release: Release = match self
            .run_json("install", request.args(&self.repository().name), Some(values))
            .await
        {
            Ok(release) => release,
            Err(error) => {
                tracing::warn!(
                    target: TRACING_TARGET_RELEASE,
                    error = %error,
                    "Install failed, removing partial release"
                );
                if let Err(cleanup) = self.uninstall(&request.namespace, &request.release).await {
                    tracing::warn!(
                        target: TRACING_TARGET_RELEASE,
                        error = %cleanup,
                        "Failed to remove partial release"
                    );
                }
                return Err(error);
            }
        };

        tracing::info!(
            target: TRACING_TARGET_RELEASE,
            revision = release.version,
            status = %release.info.status,
            "Release installed"
        );

        Ok(release)
    }

    /// Uninstalls a release and waits until its resources are gone.
    #[tracing::instrument(skip(self), target = TRACING_TARGET_RELEASE)]
    pub async fn uninstall(&self, namespace: &str, release: &str) -> Result<()> {
        validate(namespace, release)?;
        let mut args = strings(["uninstall", &flag("namespace", namespace), "--wait"]);
        push_positional(&mut args, [release]);
        self.run("uninstall", args, None).await?;

        tracing::info!(target: TRACING_TARGET_RELEASE, "Release uninstalled");
        Ok(())
    }

    #[tracing::instrument(
        skip(self, request),
        fields(namespace = %request.namespace, release = %request.release, chart = %request.chart),
        target = TRACING_TARGET_RELEASE
    )]
    pub async fn upgrade(&self, request: &UpgradeRequest) -> Result<Release> {
        validate(&request.namespace, &request.release)?;
        let values = serde_json::to_vec(&request.values_document())?;
        let release: Release = self
            .run_json("upgrade", request.args(&self.repository().name), Some(values))
            .await?;

        tracing::info!(
            target: TRACING_TARGET_RELEASE,
            revision = release.version,
            status = %release.info.status,
            "Release upgraded"
        );

        Ok(release)
    }

    /// Rolls `release` back to `revision`.
    #[tracing::instrument(skip(self), target = TRACING_TARGET_RELEASE)]
    pub async fn rollback(&self, namespace: &str, release: &str, revision: i32) -> Result<()> {
        validate(namespace, release)?;
        let revision = revision.to_string();
        let mut args = strings(["rollback", &flag("namespace", namespace)]);
        push_positional(&mut args, [release, revision.as_str()]);
        self.run("rollback", args, None).await?;

        tracing::info!(target: TRACING_TARGET_RELEASE, "Release rolled back");
        Ok(())
    }

    /// Lists releases of every status in `namespace`, optionally only `release`.
    #[tracing::instrument(skip(self), target = TRACING_TARGET_RELEASE)]
    pub async fn list(&self, namespace: &str, release: Option<&str>) -> Result<Vec<ReleaseSummary>> {
        if !is_namespace_name(namespace) {
            return Err(Error::InvalidInput(format!("invalid namespace: {namespace}")));
        }
        let mut args = strings(["list", &flag("namespace", namespace), "--all", "--output=json"]);
        if let Some(release) = release.filter(|r| !r.is_empty()) {
            validate_release(release)?;
            args.push(flag("filter", &format!("^{release}$")));
        }

        let releases: Vec<ReleaseSummary> = self.run_json("list", args, None).await?;
        tracing::debug!(
            target: TRACING_TARGET_RELEASE,
            release_count = releases.len(),
            "Listed releases"
        );
        Ok(releases)
    }

    /// Returns the rendered manifest of the current revision.
    #[tracing::instrument(skip(self), target = TRACING_TARGET_RELEASE)]
    pub async fn manifest(&self, namespace: &str, release: &str) -> Result<String> {
        validate(namespace, release)?;
        let mut args = strings(["get", "manifest", &flag("namespace", namespace)]);
        push_positional(&mut args, [release]);
        let output = self.run("get manifest", args, None).await?;
        Ok(String::from_utf8_lossy(&output).into_owned())
    }

    async fn run_json<T: DeserializeOwned>(
        &self,
        command: &str,
        args: Vec<String>,
        stdin: Option<Vec<u8>>,
    ) -> Result<T> {
        let output = self.run(command, args, stdin).await?;
        Ok(serde_json::from_slice(&output)?)
    }

    /// Runs helm and returns its stdout.
    async fn run(&self, command: &str, args: Vec<String>, stdin: Option<Vec<u8>>) -> Result<Vec<u8>> {
        let config = self.config();
        tracing::debug!(target: TRACING_TARGET_CLIENT, command, "Running helm");

        let mut child = Command::new(&config.helm_bin)
            .args(&args)
            .stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
            // helm may exit before reading its input; the exit status reports why.
            if let Err(error) = pipe.write_all(&input).await {
                tracing::debug!(target: TRACING_TARGET_CLIENT, command, error = %error, "helm closed stdin");
            }
            drop(pipe);
        }

        let output = tokio::time::timeout(config.timeout(), child.wait_with_output())
            .await
            .map_err(|_| Error::Timeout(command.to_owned()))??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();
            tracing::debug!(
                target: TRACING_TARGET_CLIENT,
                command,
                status = ?output.status.code(),
                stderr = %stderr,
                "helm exited with failure"
            );
            return Err(Error::Command {
                command: command.to_owned(),
                stderr,
            });
        }

        Ok(output.stdout)
    }
}

impl fmt::Debug for HelmClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HelmClient")
            .field("config", &self.inner.config)
            .field("repository", &self.inner.repository)
            .finish()
    }
}

//! On-disk staging of uploaded charts.
//!
//! A [`StagedChart`] owns one file under the staging directory for the span
//! of a single upload. Bytes are hashed as they are written, so the digest is
//! known without reading the file back. The file is removed explicitly once
//! the push completes, or by the guard's `Drop` on any earlier exit.

use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::TRACING_TARGET_SERVICE;

/// Extension every uploaded chart must carry.
pub const CHART_EXTENSION: &str = ".tgz";

/// Name and version derived from an uploaded chart file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartFileName {
    pub name: String,
    pub version: String,
}

impl ChartFileName {
    /// Version used when the file name has no `-` delimiter.
    pub const DEFAULT_VERSION: &str = "1.0.0";

    /// Reduces a client supplied file name to its last path component.
    ///
    /// Returns `None` when that component is empty or still refers to a
    /// parent directory.
    pub fn base_name(file_name: &str) -> Option<&str> {
        let base = last_component(file_name);
        Self::is_path_segment(base).then_some(base)
    }

    /// Whether `text` can stand on its own as part of a single file name.
    pub fn is_path_segment(text: &str) -> bool {
        !text.is_empty() && !has_path_syntax(text)
    }

    /// Splits `nginx-1.2.3.tgz` into `nginx` and `1.2.3` on the first `-`.
    ///
    /// Directory components are dropped first.
    pub fn parse(file_name: &str) -> Self {
        let base = last_component(file_name);
        let stem = base.strip_suffix(CHART_EXTENSION).unwrap_or(base);
        match stem.split_once('-') {
            Some((name, version)) => Self {
                name: name.to_owned(),
                version: version.to_owned(),
            },
            None => Self {
                name: stem.to_owned(),
                version: Self::DEFAULT_VERSION.to_owned(),
            },
        }
    }

    /// Replaces name and version with the non-empty overrides.
    pub fn with_overrides(mut self, name: Option<&str>, version: Option<&str>) -> Self {
        if let Some(name) = name.filter(|name| !name.is_empty()) {
            self.name = name.to_owned();
        }
        if let Some(version) = version.filter(|version| !version.is_empty()) {
            self.version = version.to_owned();
        }
        self
    }

    /// Remote file name, `<name>-<version>.tgz`.
    pub fn file_name(&self) -> String {
        format!("{}-{}{}", self.name, self.version, CHART_EXTENSION)
    }
}

fn last_component(file_name: &str) -> &str {
    file_name.rsplit(['/', '\\']).next().unwrap_or(file_name)
}

fn has_path_syntax(text: &str) -> bool {
    text.contains(['/', '\\']) || text.contains("..")
}

/// Failure to acquire a staging file.
#[derive(Debug, thiserror::Error)]
pub enum StagingError {
    #[error("Failed to create temp directory: {0}")]
    CreateDir(#[source] io::Error),

    #[error("Failed to create temp file: {0}")]
    CreateFile(#[source] io::Error),
}

/// Directory that uploaded charts are staged in.
#[derive(Debug, Clone)]
pub struct ChartStaging {
    dir: PathBuf,
}

impl ChartStaging {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[inline]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Creates the directory if needed and a uniquely named staging file in it.
    pub async fn create(&self, chart: &ChartFileName) -> Result<StagedChart, StagingError> {
        if has_path_syntax(&chart.name) || has_path_syntax(&chart.version) {
            return Err(StagingError::CreateFile(io::Error::new(
                io::ErrorKind::InvalidInput,
                "chart name and version must not contain path separators",
            )));
        }

        fs::create_dir_all(&self.dir)
            .await
            .map_err(StagingError::CreateDir)?;

        let path = self.dir.join(format!(
            "{}-{}-{}{}",
            chart.name,
            chart.version,
            Uuid::new_v4(),
            CHART_EXTENSION
        ));
        let file = File::create(&path)
            .await
            .map_err(StagingError::CreateFile)?;

        tracing::debug!(
            target: TRACING_TARGET_SERVICE,
            path = %path.display(),
            "Created staging file"
        );

        Ok(StagedChart {
            path,
            file: Some(file),
            hasher: Sha256::new(),
            size: 0,
            removed: false,
        })
    }
}

/// Staging file guard with a running SHA-256 of everything written.
#[derive(Debug)]
pub struct StagedChart {
    path: PathBuf,
    file: Option<File>,
    hasher: Sha256,
    size: u64,
    removed: bool,
}

impl StagedChart {
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of bytes written so far.
    #[inline]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Appends `chunk` to the file and folds it into the digest.
    pub async fn write(&mut self, chunk: &[u8]) -> io::Result<()> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::other("staging file already finished"))?;
        file.write_all(chunk).await?;
        self.hasher.update(chunk);
        self.size += chunk.len() as u64;
        Ok(())
    }

    /// Flushes and closes the file, returning the digest as `sha256:<hex>`.
    pub async fn finish(&mut self) -> io::Result<String> {
        if let Some(mut file) = self.file.take() {
            file.flush().await?;
            file.sync_all().await?;
        }
        Ok(format!("sha256:{}", hex::encode(self.hasher.clone().finalize())))
    }
}

impl StagedChart {
    /// Closes and deletes the staging file.
    pub async fn remove(mut self) {
        drop(self.file.take());
        self.removed = true;
        log_removal(&self.path, fs::remove_file(&self.path).await);
    }
}

impl Drop for StagedChart {
    /// Cleanup for early returns that never reach [`StagedChart::remove`].
    ///
    /// Unlinking one file is short enough to run inline on the runtime.
    fn drop(&mut self) {
        if self.removed {
            return;
        }

        // Close the handle before unlinking.
        drop(self.file.take());
        log_removal(&self.path, std::fs::remove_file(&self.path));
    }
}

fn log_removal(path: &Path, result: io::Result<()>) {
    match result {
        Ok(()) => tracing::debug!(
            target: TRACING_TARGET_SERVICE,
            path = %path.display(),
            "Removed staging file"
        ),
        Err(error) if error.kind() == io::ErrorKind::NotFound => {}
        Err(error) => tracing::warn!(
            target: TRACING_TARGET_SERVICE,
            path = %path.display(),
            error = %error,
            "Failed to remove staging file"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_is_split_on_first_delimiter() {
        let chart = ChartFileName::parse("nginx-1.2.3.tgz");
        assert_eq!(chart.name, "nginx");
        assert_eq!(chart.version, "1.2.3");

        let chart = ChartFileName::parse("cert-manager-v1.14.0.tgz");
        assert_eq!(chart.name, "cert");
        assert_eq!(chart.version, "manager-v1.14.0");
    }

    #[test]
    fn missing_delimiter_uses_default_version() {
        let chart = ChartFileName::parse("nginx.tgz");
        assert_eq!(chart.name, "nginx");
        assert_eq!(chart.version, "1.0.0");
        assert_eq!(chart.file_name(), "nginx-1.0.0.tgz");
    }

    #[test]
    fn empty_overrides_are_ignored() {
        let chart = ChartFileName::parse("nginx-1.2.3.tgz").with_overrides(Some(""), Some("2.0.0"));
        assert_eq!(chart.file_name(), "nginx-2.0.0.tgz");
    }

    #[tokio::test]
    async fn staged_file_is_hashed_and_removed() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let staging = ChartStaging::new(dir.path().join("uploads"));

        let mut staged = staging.create(&ChartFileName::parse("nginx-1.2.3.tgz")).await?;
        let path = staged.path().to_owned();
        assert!(path.file_name().is_some_and(|n| n.to_string_lossy().starts_with("nginx-1.2.3-")));

        staged.write(b"hello ").await?;
        staged.write(b"world").await?;
        let digest = staged.finish().await?;

        assert_eq!(staged.size(), 11);
        assert_eq!(
            digest,
            "sha256:b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
        assert!(path.exists());

        staged.remove().await;
        assert!(!path.exists());
        Ok(())
    }

    #[tokio::test]
    async fn dropped_guard_removes_file() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let staging = ChartStaging::new(dir.path());

        let mut staged = staging.create(&ChartFileName::parse("redis-7.0.0.tgz")).await?;
        staged.write(b"partial").await?;
        let path = staged.path().to_owned();

        drop(staged);
        assert!(!path.exists());
        Ok(())
    }

    #[test]
    fn directory_components_are_dropped() {
        assert_eq!(ChartFileName::base_name("nginx-1.2.3.tgz"), Some("nginx-1.2.3.tgz"));
        assert_eq!(ChartFileName::base_name("../../nginx-1.2.3.tgz"), Some("nginx-1.2.3.tgz"));
        assert_eq!(ChartFileName::base_name("C:\\charts\\nginx-1.2.3.tgz"), Some("nginx-1.2.3.tgz"));
        assert_eq!(ChartFileName::base_name("charts/"), None);
        assert_eq!(ChartFileName::base_name("charts/.."), None);
        assert_eq!(ChartFileName::base_name("..tgz"), None);

        let chart = ChartFileName::parse("../escape-1.0.0.tgz");
        assert_eq!(chart.name, "escape");
        assert_eq!(chart.version, "1.0.0");
    }

    #[tokio::test]
    async fn staged_file_stays_inside_staging_dir() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let staging_dir = dir.path().join("uploads").join("inner");
        let staging = ChartStaging::new(&staging_dir);

        let staged = staging.create(&ChartFileName::parse("../escape-1.0.0.tgz")).await?;
        assert_eq!(staged.path().parent(), Some(staging_dir.as_path()));

        let forged = ChartFileName {
            name: "..".to_owned(),
            version: "1.0.0".to_owned(),
        };
        let result = staging.create(&forged).await;
        assert!(matches!(result, Err(StagingError::CreateFile(_))));
        Ok(())
    }
}

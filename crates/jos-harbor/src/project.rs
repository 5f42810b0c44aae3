//! Harbor v2 project and repository listing.

use reqwest::header::ACCEPT;
#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{Error, HarborClient, Result, TRACING_TARGET_PROJECT};

#[derive(Debug, Deserialize)]
struct Project {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Repository {
    name: String,
    #[serde(default)]
    tags: Vec<Tag>,
}

#[derive(Debug, Deserialize)]
struct Tag {
    name: String,
}

/// Image repository of a project with its tag names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct ProjectImage {
    pub repository: String,
    pub tags: Vec<String>,
}

impl From<Repository> for ProjectImage {
    fn from(repository: Repository) -> Self {
        Self {
            repository: repository.name,
            tags: repository.tags.into_iter().map(|tag| tag.name).collect(),
        }
    }
}

impl HarborClient {
    /// Lists the names of the first hundred projects.
    #[tracing::instrument(skip(self), target = TRACING_TARGET_PROJECT)]
    pub async fn list_projects(&self) -> Result<Vec<String>> {
        let projects: Vec<Project> = self.get_json(&self.config().projects_url()).await?;

        tracing::debug!(
            target: TRACING_TARGET_PROJECT,
            project_count = projects.len(),
            "Listed harbor projects"
        );

        Ok(projects.into_iter().map(|project| project.name).collect())
    }

    /// Lists the repositories of `project` together with their tags.
    #[tracing::instrument(skip(self), target = TRACING_TARGET_PROJECT)]
    pub async fn list_repositories(&self, project: &str) -> Result<Vec<ProjectImage>> {
        let repositories: Vec<Repository> =
            self.get_json(&self.config().repositories_url(project)).await?;

        tracing::debug!(
            target: TRACING_TARGET_PROJECT,
            repository_count = repositories.len(),
            "Listed project repositories"
        );

        Ok(repositories.into_iter().map(Into::into).collect())
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::UnexpectedStatus(status.as_u16()));
        }

        Ok(response.json().await?)
    }
}

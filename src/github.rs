//! External project data — fetch public repositories for a GitHub user.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::convo::model::Project;
use crate::error::FetchError;

/// Description used when a repository has none.
const DEFAULT_DESCRIPTION: &str = "No description provided";

/// Fetch-by-identifier capability returning normalized project records.
///
/// An unknown user or upstream failure is a `FetchError`; a valid user with
/// no public repositories is an empty list, not an error.
#[async_trait]
pub trait ProjectSource: Send + Sync {
    async fn fetch_projects(&self, username: &str) -> Result<Vec<Project>, FetchError>;
}

#[derive(Debug, Deserialize)]
struct GitHubRepo {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    html_url: Option<String>,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    stargazers_count: Option<i64>,
}

impl From<GitHubRepo> for Project {
    fn from(repo: GitHubRepo) -> Self {
        Project {
            title: repo.name,
            description: repo
                .description
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            url: repo.html_url,
            language: repo.language,
            stars: repo.stargazers_count,
        }
    }
}

/// GitHub REST API client.
pub struct GitHubClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(token: Option<String>) -> Self {
        Self::with_base_url("https://api.github.com", token)
    }

    /// Point the client at a different base URL (for tests).
    pub fn with_base_url(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            token,
        }
    }
}

#[async_trait]
impl ProjectSource for GitHubClient {
    async fn fetch_projects(&self, username: &str) -> Result<Vec<Project>, FetchError> {
        let url = format!(
            "{}/users/{username}/repos?sort=updated&per_page=100",
            self.base_url
        );

        let mut request = self.client.get(&url).header("User-Agent", "foliobot");
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| FetchError::Http(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(FetchError::Upstream {
                username: username.to_string(),
                reason: format!("GitHub returned {}", resp.status()),
            });
        }

        let repos: Vec<GitHubRepo> = resp
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;

        debug!(username, count = repos.len(), "Fetched repositories");
        Ok(repos.into_iter().map(Project::from).collect())
    }
}

//! GitHub REST adapter.
//!
//! This crate implements the `dgb-core` CodeHostPort over the GitHub REST API.

use std::{fmt, time::Duration};

use async_trait::async_trait;
use reqwest::{header, Url};
use serde::de::DeserializeOwned;

use dgb_core::{
    code_host::{
        Branch, BuildStatus, CodeHostPort, Issue, PullRequest, RepositoryCommit, ResourceKind,
        WorkflowRuns,
    },
    domain::RepoCoordinate,
    errors::Error,
    Result,
};

const USER_AGENT: &str = concat!("dgb/", env!("CARGO_PKG_VERSION"));
const GITHUB_JSON: &str = "application/vnd.github+json";

/// Build the HTTP client shared by every request, with a fixed timeout.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| Error::Config(format!("failed to build http client: {e}")))
}

#[derive(Clone)]
pub struct GitHubClient {
    token: String,
    api_base: Url,
    http: reqwest::Client,
}

impl fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubClient")
            .field("api_base", &self.api_base.as_str())
            .finish_non_exhaustive()
    }
}

impl GitHubClient {
    pub fn new(token: impl Into<String>, api_base: &str, http: reqwest::Client) -> Result<Self> {
        let api_base = Url::parse(api_base)
            .map_err(|e| Error::Config(format!("invalid GitHub API url {api_base:?}: {e}")))?;
        if api_base.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "GitHub API url {api_base} cannot be used as a base"
            )));
        }
        Ok(Self {
            token: token.into(),
            api_base,
            http,
        })
    }

    /// `{base}/repos/{owner}/{repo}/{resource...}` with each segment percent-encoded.
    fn resource_url(&self, resource: ResourceKind, repo: &RepoCoordinate) -> Result<Url> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("GitHub API url {} has no path", self.api_base)))?
            .pop_if_empty()
            .extend(["repos", repo.owner.as_str(), repo.repo.as_str()])
            .extend(resource.path_segments());
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        resource: ResourceKind,
        repo: &RepoCoordinate,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let url = self.resource_url(resource, repo)?;
        tracing::debug!(resource = %resource, %repo, %url, "GET");

        let resp = self
            .http
            .get(url)
            .query(query)
            .header(header::AUTHORIZATION, format!("token {}", self.token))
            .header(header::ACCEPT, GITHUB_JSON)
            .send()
            .await
            .map_err(|e| Error::Transport(format!("github {resource} request error: {e}")))?;

        // Error statuses are decoded like any other body: list resources fail as
        // Decode, build status falls back to Unavailable.
        let status = resp.status();
        if !status.is_success() {
            tracing::debug!(resource = %resource, %repo, %status, "non-success status");
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| Error::Transport(format!("github {resource} read error: {e}")))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| Error::Decode(format!("github {resource} json error: {e}")))
    }
}

#[async_trait]
impl CodeHostPort for GitHubClient {
    async fn latest_build_status(&self, repo: &RepoCoordinate) -> Result<BuildStatus> {
        let runs: WorkflowRuns = self.get_json(ResourceKind::BuildRuns, repo, &[]).await?;
        Ok(BuildStatus::from_runs(&runs))
    }

    async fn branches(&self, repo: &RepoCoordinate) -> Result<Vec<Branch>> {
        self.get_json(ResourceKind::Branches, repo, &[]).await
    }

    async fn issues(&self, repo: &RepoCoordinate) -> Result<Vec<Issue>> {
        self.get_json(ResourceKind::Issues, repo, &[]).await
    }

    async fn pull_requests(&self, repo: &RepoCoordinate) -> Result<Vec<PullRequest>> {
        self.get_json(ResourceKind::PullRequests, repo, &[]).await
    }

    async fn commits(&self, repo: &RepoCoordinate, branch: &str) -> Result<Vec<RepositoryCommit>> {
        self.get_json(ResourceKind::Commits, repo, &[("sha", branch)])
            .await
    }
}

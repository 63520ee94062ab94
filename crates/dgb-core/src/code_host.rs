//! Code-hosting API contract: resource kinds, typed records and the port.
//!
//! Records are decoded leniently. Fields the bot never displays are ignored, and a
//! missing display field falls back to its default instead of failing the decode.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::{domain::RepoCoordinate, Result};

/// The five resources the bot can fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    BuildRuns,
    Branches,
    Issues,
    PullRequests,
    Commits,
}

impl ResourceKind {
    /// Human label, used in "failed to fetch" replies and logs.
    pub fn label(self) -> &'static str {
        match self {
            ResourceKind::BuildRuns => "build status",
            ResourceKind::Branches => "branches",
            ResourceKind::Issues => "issues",
            ResourceKind::PullRequests => "pull requests",
            ResourceKind::Commits => "commits",
        }
    }

    /// REST path segments under `/repos/{owner}/{repo}/`.
    pub fn path_segments(self) -> &'static [&'static str] {
        match self {
            ResourceKind::BuildRuns => &["actions", "runs"],
            ResourceKind::Branches => &["branches"],
            ResourceKind::Issues => &["issues"],
            ResourceKind::PullRequests => &["pulls"],
            ResourceKind::Commits => &["commits"],
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WorkflowRuns {
    pub workflow_runs: Vec<WorkflowRun>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WorkflowRun {
    pub conclusion: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Branch {
    pub name: String,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Issue {
    pub title: String,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PullRequest {
    pub title: String,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RepositoryCommit {
    pub commit: CommitDetail,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CommitDetail {
    pub author: Option<CommitAuthor>,
    pub message: String,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CommitAuthor {
    pub name: String,
    pub date: Option<DateTime<Utc>>,
}

/// Conclusion of the most recent workflow run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BuildStatus {
    Conclusion(String),
    /// No runs, or the latest run has not concluded.
    Unavailable,
}

impl BuildStatus {
    pub const UNAVAILABLE_LABEL: &'static str = "no status available";

    pub fn from_runs(runs: &WorkflowRuns) -> Self {
        runs.workflow_runs
            .first()
            .and_then(|run| run.conclusion.clone())
            .map(BuildStatus::Conclusion)
            .unwrap_or(BuildStatus::Unavailable)
    }

    pub fn label(&self) -> &str {
        match self {
            BuildStatus::Conclusion(c) => c,
            BuildStatus::Unavailable => Self::UNAVAILABLE_LABEL,
        }
    }
}

/// Hexagonal port for the code-hosting REST API.
///
/// Implementations issue one request per call, with no retry. Callers treat every
/// error the same way.
#[async_trait]
pub trait CodeHostPort: Send + Sync {
    async fn latest_build_status(&self, repo: &RepoCoordinate) -> Result<BuildStatus>;
    async fn branches(&self, repo: &RepoCoordinate) -> Result<Vec<Branch>>;
    async fn issues(&self, repo: &RepoCoordinate) -> Result<Vec<Issue>>;
    async fn pull_requests(&self, repo: &RepoCoordinate) -> Result<Vec<PullRequest>>;
    async fn commits(&self, repo: &RepoCoordinate, branch: &str) -> Result<Vec<RepositoryCommit>>;
}

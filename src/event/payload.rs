use crate::backport::BackportError;
use serde::{Deserialize, Serialize};

/// Pull request webhook action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PullRequestAction {
    Closed,
    Labeled,
    #[serde(other)]
    Other,
}

/// GitHub label.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GhLabel {
    pub name: String,
}

/// GitHub user, reduced to its login.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GhUser {
    pub login: String,
}

/// Pull request as found in the event payload.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GhPullRequest {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub merge_commit_sha: Option<String>,
    #[serde(default)]
    pub merged: bool,
    #[serde(default)]
    pub labels: Vec<GhLabel>,
    pub user: GhUser,
    #[serde(default)]
    pub merged_by: Option<GhUser>,
}

/// Repository as found in the event payload.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GhRepository {
    pub name: String,
    pub owner: GhUser,
    pub clone_url: String,
}

/// `pull_request` event payload.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PullRequestEventPayload {
    pub action: PullRequestAction,
    #[serde(default)]
    pub label: Option<GhLabel>,
    pub pull_request: GhPullRequest,
    pub repository: GhRepository,
}

impl PullRequestEventPayload {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Immutable facts about a merged pull request.
///
/// Only [`MergeEvent::from_payload`] builds one, so holding a `MergeEvent`
/// means the pull request is merged and has a merge commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeEvent {
    action: PullRequestAction,
    source_pr_number: u64,
    merge_commit_sha: String,
    author: String,
    merger: Option<String>,
    title: String,
    body: Option<String>,
    labels: Vec<String>,
    trigger_label: Option<String>,
    owner: String,
    repo: String,
    clone_url: String,
}

impl MergeEvent {
    pub fn from_payload(payload: &PullRequestEventPayload) -> Result<Self, BackportError> {
        let pr = &payload.pull_request;

        if !pr.merged {
            return Err(BackportError::precondition(format!(
                "pull request #{} is not merged",
                pr.number
            )));
        }

        let merge_commit_sha = pr
            .merge_commit_sha
            .as_deref()
            .map(str::trim)
            .filter(|sha| !sha.is_empty())
            .ok_or_else(|| {
                BackportError::precondition(format!(
                    "pull request #{} has no merge commit SHA",
                    pr.number
                ))
            })?;

        Ok(Self {
            action: payload.action,
            source_pr_number: pr.number,
            merge_commit_sha: merge_commit_sha.to_string(),
            author: pr.user.login.clone(),
            merger: pr.merged_by.as_ref().map(|user| user.login.clone()),
            title: pr.title.clone(),
            body: pr.body.clone(),
            labels: pr.labels.iter().map(|label| label.name.clone()).collect(),
            trigger_label: payload.label.as_ref().map(|label| label.name.clone()),
            owner: payload.repository.owner.login.clone(),
            repo: payload.repository.name.clone(),
            clone_url: payload.repository.clone_url.clone(),
        })
    }

    pub fn action(&self) -> PullRequestAction {
        self.action
    }

    pub fn source_pr_number(&self) -> u64 {
        self.source_pr_number
    }

    pub fn merge_commit_sha(&self) -> &str {
        &self.merge_commit_sha
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn merger(&self) -> Option<&str> {
        self.merger.as_deref()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Label added by a `labeled` event.
    pub fn trigger_label(&self) -> Option<&str> {
        self.trigger_label.as_deref()
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    pub fn clone_url(&self) -> &str {
        &self.clone_url
    }
}

//! Drives one backport target from a clean workspace to an open pull request.

use super::errors::{BranchError, BranchFailure};
use super::target::{BackportTarget, SourceCommit};
use super::workspace::RepositoryWorkspace;
use crate::github::{BackportApi, GitHubError, NewPullRequest};
use std::fmt;
use thiserror::Error;

/// Progress of a single backport attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackportStage {
    Start,
    SwitchedToBase,
    HeadCreated,
    Picked,
    Pushed,
    PrCreated,
    ReviewersRequested,
    LabelsApplied,
    Done,
    Failed,
}

impl fmt::Display for BackportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackportStage::Start => "start",
            BackportStage::SwitchedToBase => "switched to base",
            BackportStage::HeadCreated => "head created",
            BackportStage::Picked => "picked",
            BackportStage::Pushed => "pushed",
            BackportStage::PrCreated => "pull request created",
            BackportStage::ReviewersRequested => "reviewers requested",
            BackportStage::LabelsApplied => "labels applied",
            BackportStage::Done => "done",
            BackportStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Work done on a backport pull request after it has been opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowUp {
    RequestReviewers,
    AddLabels,
}

impl fmt::Display for FollowUp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FollowUp::RequestReviewers => f.write_str("requesting reviewers"),
            FollowUp::AddLabels => f.write_str("adding labels"),
        }
    }
}

/// A follow-up that failed on an otherwise successful backport.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct FollowUpFailure {
    pub step: FollowUp,
    #[source]
    pub source: GitHubError,
}

/// The pull request opened for one base, with any follow-ups that failed on it.
#[derive(Debug)]
pub struct OpenedBackport {
    pub number: u64,
    pub incomplete: Vec<FollowUpFailure>,
}

impl OpenedBackport {
    pub fn is_complete(&self) -> bool {
        self.incomplete.is_empty()
    }
}

struct Progress {
    stage: BackportStage,
}

impl Progress {
    fn advance(&mut self, next: BackportStage) {
        tracing::debug!(from = %self.stage, to = %next, "Backport stage transition");
        self.stage = next;
    }

    /// Record the failure against the last stage actually reached.
    fn fail(&mut self, error: impl Into<BranchError>) -> BranchFailure {
        let reached = self.stage;
        self.advance(BackportStage::Failed);
        BranchFailure::new(reached, error)
    }
}

pub struct BackportExecutor<'a> {
    api: &'a dyn BackportApi,
    request_reviewers: bool,
}

impl<'a> BackportExecutor<'a> {
    pub fn new(api: &'a dyn BackportApi) -> Self {
        Self {
            api,
            request_reviewers: true,
        }
    }

    pub fn with_reviewers(mut self, request: bool) -> Self {
        self.request_reviewers = request;
        self
    }

    /// Backport `commit` onto `target.base` and return the new pull request.
    ///
    /// Reviewer and label errors do not fail the attempt; they come back in
    /// [`OpenedBackport::incomplete`]. The workspace is handed back clean (or
    /// poisoned) whatever the outcome.
    pub async fn execute(
        &self,
        workspace: &mut RepositoryWorkspace,
        target: &BackportTarget,
        commit: &SourceCommit,
    ) -> Result<OpenedBackport, BranchFailure> {
        let mut progress = Progress {
            stage: BackportStage::Start,
        };

        workspace
            .begin_attempt(&target.base, &target.head)
            .map_err(|e| progress.fail(e))?;

        let outcome = self.drive(workspace, target, commit, &mut progress).await;
        let settled = workspace.finish_attempt().await;

        match (outcome, settled) {
            (Ok(opened), Ok(())) => Ok(opened),
            (Ok(opened), Err(error)) => {
                // The pull request exists; the dirty tree only affects later targets.
                tracing::warn!(base = %target.base, error = %error, "Workspace not restored after a successful backport");
                Ok(opened)
            }
            (Err(failure), _) => Err(failure),
        }
    }

    async fn drive(
        &self,
        workspace: &mut RepositoryWorkspace,
        target: &BackportTarget,
        commit: &SourceCommit,
        progress: &mut Progress,
    ) -> Result<OpenedBackport, BranchFailure> {
        workspace
            .switch_to_base(&target.base)
            .await
            .map_err(|e| progress.fail(e))?;
        progress.advance(BackportStage::SwitchedToBase);

        workspace
            .create_head(&target.head)
            .await
            .map_err(|e| progress.fail(e))?;
        progress.advance(BackportStage::HeadCreated);

        if let Err(error) = workspace.cherry_pick(commit, &target.base).await {
            workspace.abort_cherry_pick().await;
            return Err(progress.fail(error));
        }
        progress.advance(BackportStage::Picked);

        workspace
            .push_head(&target.head)
            .await
            .map_err(|e| progress.fail(e))?;
        progress.advance(BackportStage::Pushed);

        let request = NewPullRequest {
            title: target.title.clone(),
            body: target.body.clone(),
            head: target.head.clone(),
            base: target.base.clone(),
        };
        let number = self
            .api
            .create_pull_request(&request)
            .await
            .map_err(|e| progress.fail(e))?;
        progress.advance(BackportStage::PrCreated);
        tracing::info!(base = %target.base, head = %target.head, pr_number = number, "Opened backport pull request");

        let mut incomplete = Vec::new();

        if self.request_reviewers && !target.reviewers.is_empty() {
            match self.api.request_reviewers(number, &target.reviewers).await {
                Ok(()) => progress.advance(BackportStage::ReviewersRequested),
                Err(error) => {
                    tracing::warn!(
                        pr_number = number,
                        reviewers = ?target.reviewers,
                        error = %error,
                        "Could not request reviewers"
                    );
                    incomplete.push(FollowUpFailure {
                        step: FollowUp::RequestReviewers,
                        source: error,
                    });
                }
            }
        }

        if !target.labels.is_empty() {
            match self.api.add_labels(number, &target.labels).await {
                Ok(()) => progress.advance(BackportStage::LabelsApplied),
                Err(error) => {
                    tracing::warn!(
                        pr_number = number,
                        labels = ?target.labels,
                        error = %error,
                        "Could not add labels"
                    );
                    incomplete.push(FollowUpFailure {
                        step: FollowUp::AddLabels,
                        source: error,
                    });
                }
            }
        }

        progress.advance(BackportStage::Done);
        Ok(OpenedBackport { number, incomplete })
    }
}

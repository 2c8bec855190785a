//! Failure comments with a manual recovery script.

use super::errors::describe_error;
use super::executor::{FollowUp, FollowUpFailure};
use super::target::SourceCommit;
use crate::github::{BackportApi, GitHubError, PostedComment};

/// Posts one comment on the source pull request per failed backport, and one
/// per follow-up that failed on an opened backport.
pub struct FailureReporter<'a> {
    api: &'a dyn BackportApi,
    source_pr_number: u64,
    secrets: Vec<String>,
}

impl<'a> FailureReporter<'a> {
    pub fn new(api: &'a dyn BackportApi, source_pr_number: u64) -> Self {
        Self {
            api,
            source_pr_number,
            secrets: Vec::new(),
        }
    }

    /// Never let `secret` reach a comment.
    pub fn with_secret(mut self, secret: &str) -> Self {
        if !secret.is_empty() {
            self.secrets.push(secret.to_string());
        }
        self
    }

    pub async fn report(
        &self,
        base: &str,
        head: &str,
        commit: &SourceCommit,
        error: &(dyn std::error::Error + 'static),
    ) -> Result<PostedComment, GitHubError> {
        let message = self.redact(&describe_error(error));
        tracing::error!(
            base = %base,
            head = %head,
            pr_number = self.source_pr_number,
            error = %message,
            "Backport failed"
        );

        let body = failure_comment(base, head, commit, &message);
        let comment = self.api.create_comment(self.source_pr_number, &body).await?;
        tracing::info!(comment_id = comment.id, base = %base, "Posted failure comment");
        Ok(comment)
    }

    /// Report a follow-up that failed after `number` was opened for `base`.
    pub async fn report_incomplete(
        &self,
        base: &str,
        number: u64,
        failure: &FollowUpFailure,
    ) -> Result<PostedComment, GitHubError> {
        let message = self.redact(&describe_error(failure));
        tracing::error!(
            base = %base,
            backport_pr = number,
            step = %failure.step,
            error = %message,
            "Backport follow-up failed"
        );

        let body = follow_up_comment(base, number, failure.step, &message);
        let comment = self.api.create_comment(self.source_pr_number, &body).await?;
        tracing::info!(comment_id = comment.id, base = %base, step = %failure.step, "Posted follow-up comment");
        Ok(comment)
    }

    fn redact(&self, text: &str) -> String {
        self.secrets
            .iter()
            .fold(text.to_string(), |text, secret| text.replace(secret.as_str(), "***"))
    }
}

/// Comment body explaining the failure and how to backport by hand.
pub fn failure_comment(base: &str, head: &str, commit: &SourceCommit, message: &str) -> String {
    let worktree = format!(".worktrees/backport-{base}");
    let mainline = if commit.is_merge() { " --mainline 1" } else { "" };

    let script = [
        "# Fetch latest updates from GitHub".to_string(),
        "git fetch".to_string(),
        "# Create a new working tree".to_string(),
        format!("git worktree add {worktree} {base}"),
        "# Navigate to the new working tree".to_string(),
        format!("cd {worktree}"),
        "# Create a new branch".to_string(),
        format!("git switch --create {head}"),
        "# Cherry-pick the merged commit of this pull request and resolve the conflicts".to_string(),
        format!("git cherry-pick -x{mainline} {}", commit.sha),
        "# Push it to GitHub".to_string(),
        format!("git push --set-upstream origin {head}"),
        "# Go back to the original working tree".to_string(),
        "cd ../..".to_string(),
        "# Delete the working tree".to_string(),
        format!("git worktree remove {worktree}"),
    ]
    .join("\n");

    format!(
        "The backport to `{base}` failed:\n\n```\n{message}\n```\n\n\
         To backport manually, run these commands in your terminal:\n\n\
         ```bash\n{script}\n```\n\n\
         Then, create a pull request where the `base` branch is `{base}` and the `compare`/`head` branch is `{head}`."
    )
}

/// Comment body for a backport that was opened but not fully set up.
pub fn follow_up_comment(base: &str, number: u64, step: FollowUp, message: &str) -> String {
    let task = match step {
        FollowUp::RequestReviewers => "request the reviewers",
        FollowUp::AddLabels => "add the labels",
    };
    format!(
        "The backport to `{base}` was opened as #{number}, but {step} failed:\n\n```\n{message}\n```\n\n\
         Please {task} on #{number} by hand."
    )
}

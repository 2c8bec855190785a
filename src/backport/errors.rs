use super::executor::BackportStage;
use crate::external::GitError;
use crate::github::GitHubError;
use thiserror::Error;

/// Errors that end the whole invocation.
#[derive(Debug, Error)]
pub enum BackportError {
    /// Label pattern or templates are unusable; raised before any mutation.
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// The event is not a merged pull request with a merge commit.
    #[error("Refusing to backport: {0}")]
    Precondition(String),
    /// A per-branch failure could not be reported, so it would otherwise go unseen.
    #[error("Could not post the failure comment for `{base}`: {source}")]
    Reporting {
        base: String,
        #[source]
        source: GitHubError,
    },
}

impl BackportError {
    pub fn configuration(message: impl Into<String>) -> Self {
        BackportError::Configuration(message.into())
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        BackportError::Precondition(message.into())
    }
}

/// What went wrong inside one backport attempt.
#[derive(Debug, Error)]
pub enum BranchError {
    #[error(transparent)]
    Git(#[from] GitError),
    #[error(transparent)]
    GitHub(#[from] GitHubError),
    #[error("Workspace error: {0}")]
    Workspace(String),
}

/// A failed attempt for one base branch, with the last stage it reached.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct BranchFailure {
    pub stage: BackportStage,
    #[source]
    pub source: BranchError,
}

impl BranchFailure {
    pub fn new(stage: BackportStage, source: impl Into<BranchError>) -> Self {
        Self {
            stage,
            source: source.into(),
        }
    }
}

/// Flatten an error and its sources into one readable message.
///
/// Sources whose text is already part of the outer message are skipped, and
/// the result is never empty. The chain stops at GitHub errors, whose message
/// already carries the API response.
pub fn describe_error(error: &(dyn std::error::Error + 'static)) -> String {
    let mut message = error.to_string().trim().to_string();
    let mut source = if error.is::<GitHubError>() {
        None
    } else {
        error.source()
    };

    while let Some(cause) = source {
        // Only reachable through a transparent `GitHubError`.
        if cause.is::<octocrab::Error>() {
            break;
        }
        let text = cause.to_string();
        let text = text.trim();
        if !text.is_empty() && !message.contains(text) {
            if message.is_empty() {
                message = text.to_string();
            } else {
                message = format!("{message}: {text}");
            }
        }
        source = if cause.is::<GitHubError>() {
            None
        } else {
            cause.source()
        };
    }

    if message.is_empty() {
        "An unknown error occurred".to_string()
    } else {
        message
    }
}

//! Backport engine
//!
//! The [`Orchestrator`] validates an event, resolves the requested base
//! branches, then drives one [`BackportExecutor`] attempt per target inside a
//! single shared [`RepositoryWorkspace`]. Failures are turned into comments by
//! the [`FailureReporter`].

pub mod errors;
pub mod executor;
pub mod orchestrator;
pub mod reporter;
pub mod target;
pub mod workspace;

pub use errors::{describe_error, BackportError, BranchError, BranchFailure};
pub use executor::{BackportExecutor, BackportStage, FollowUp, FollowUpFailure, OpenedBackport};
pub use orchestrator::{BackportResult, Orchestrator, OrchestratorSettings};
pub use reporter::{failure_comment, follow_up_comment, FailureReporter};
pub use target::{plan_targets, select_reviewers, BackportTarget, SourceCommit};
pub use workspace::{
    authenticated_url, RepositoryWorkspace, WorkspaceSettings, WorkspaceState, DEFAULT_COMMITTER_EMAIL,
    DEFAULT_COMMITTER_NAME,
};

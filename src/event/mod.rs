//! Pull request event interpretation
//!
//! Turns a webhook payload into a validated [`MergeEvent`] and resolves the
//! base branches its labels ask for.

pub mod labels;
pub mod payload;

pub use labels::{
    resolve_base_branches, template_context, BaseBranchEntry, BaseBranchMap, LabelMatch,
    LabelPattern, DEFAULT_LABEL_PATTERN,
};
pub use payload::{GhLabel, GhPullRequest, GhRepository, GhUser, MergeEvent, PullRequestAction, PullRequestEventPayload};

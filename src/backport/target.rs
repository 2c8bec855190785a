use super::errors::BackportError;
use crate::event::{template_context, BaseBranchMap, LabelPattern, MergeEvent};
use crate::templates::BackportTemplates;
use serde::Serialize;

/// Everything needed to backport onto one base branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackportTarget {
    pub base: String,
    pub head: String,
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
    pub reviewers: Vec<String>,
}

/// The commit being backported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceCommit {
    pub sha: String,
    /// `None` when the commit could not be inspected.
    pub parent_count: Option<usize>,
}

impl SourceCommit {
    pub fn new(sha: &str, parent_count: Option<usize>) -> Self {
        Self {
            sha: sha.to_string(),
            parent_count,
        }
    }

    /// Merge commits are cherry-picked relative to their first parent.
    pub fn is_merge(&self) -> bool {
        self.parent_count.is_some_and(|count| count > 1)
    }
}

/// Reviewers for a backport: author and merger, or the repository owner
/// when the author merged their own pull request.
pub fn select_reviewers(author: &str, merger: Option<&str>, owner: &str) -> Vec<String> {
    match merger {
        Some(merger) if merger == author => vec![owner.to_string()],
        Some(merger) => vec![author.to_string(), merger.to_string()],
        None => vec![author.to_string()],
    }
}

/// Render every target up front so template errors surface before the
/// repository is touched.
pub fn plan_targets(
    event: &MergeEvent,
    map: &BaseBranchMap,
    pattern: &LabelPattern,
    templates: &dyn BackportTemplates,
) -> Result<Vec<BackportTarget>, BackportError> {
    let reviewers = select_reviewers(event.author(), event.merger(), event.owner());

    map.iter()
        .map(|entry| {
            let context = template_context(event, pattern, &entry.base, Some(&entry.head), &entry.label);
            Ok(BackportTarget {
                base: entry.base.clone(),
                head: entry.head.clone(),
                title: templates.render_title(&context)?,
                body: templates.render_body(&context)?,
                labels: templates.render_labels(&context)?,
                reviewers: reviewers.clone(),
            })
        })
        .collect()
}

//! Label pattern matching and base branch resolution.

use super::payload::{MergeEvent, PullRequestAction};
use crate::backport::BackportError;
use crate::templates::{BackportTemplates, TemplateContext};
use regex::Regex;

pub const DEFAULT_LABEL_PATTERN: &str = r"^backport (?<base>[^ ]+)$";

const BASE_GROUP: &str = "base";
const HEAD_GROUP: &str = "head";

/// A validated label regex with a named `base` group and an optional `head` group.
#[derive(Debug, Clone)]
pub struct LabelPattern {
    regex: Regex,
}

/// What a matching label asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMatch {
    /// Never empty.
    pub base: String,
    pub head: Option<String>,
}

impl LabelPattern {
    pub fn new(pattern: &str) -> Result<Self, BackportError> {
        let regex = Regex::new(pattern).map_err(|e| {
            BackportError::configuration(format!("label pattern `{pattern}` is not a valid regex: {e}"))
        })?;

        if !regex.capture_names().flatten().any(|name| name == BASE_GROUP) {
            return Err(BackportError::configuration(format!(
                "label pattern `{pattern}` has no named `{BASE_GROUP}` group"
            )));
        }

        Ok(Self { regex })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    pub fn is_match(&self, label: &str) -> bool {
        self.regex.is_match(label)
    }

    /// `Ok(None)` when the label does not match, an error when it matches
    /// with an empty `base` group.
    pub fn extract(&self, label: &str) -> Result<Option<LabelMatch>, BackportError> {
        let Some(captures) = self.regex.captures(label) else {
            return Ok(None);
        };

        let base = captures
            .name(BASE_GROUP)
            .map(|m| m.as_str().trim())
            .filter(|base| !base.is_empty())
            .ok_or_else(|| {
                BackportError::configuration(format!(
                    "label `{label}` matches pattern `{}` but its `{BASE_GROUP}` group is empty",
                    self.as_str()
                ))
            })?;

        let head = captures
            .name(HEAD_GROUP)
            .map(|m| m.as_str().trim())
            .filter(|head| !head.is_empty())
            .map(str::to_string);

        Ok(Some(LabelMatch {
            base: base.to_string(),
            head,
        }))
    }

    /// Labels that do not request a backport, in their original order.
    pub fn non_matching<'a>(&self, labels: &'a [String]) -> Vec<&'a str> {
        labels
            .iter()
            .map(String::as_str)
            .filter(|label| !self.is_match(label))
            .collect()
    }
}

/// Base branch → head branch, in the order bases were first seen.
///
/// Inserting a base that is already present replaces its head: the last
/// matching label wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BaseBranchMap {
    entries: Vec<BaseBranchEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseBranchEntry {
    pub base: String,
    pub head: String,
    /// Label that produced the current head.
    pub label: String,
}

impl BaseBranchMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the head this entry replaced, if any.
    pub fn insert(&mut self, base: &str, head: &str, label: &str) -> Option<String> {
        if let Some(entry) = self.entries.iter_mut().find(|entry| entry.base == base) {
            let previous = std::mem::replace(&mut entry.head, head.to_string());
            entry.label = label.to_string();
            return Some(previous);
        }

        self.entries.push(BaseBranchEntry {
            base: base.to_string(),
            head: head.to_string(),
            label: label.to_string(),
        });
        None
    }

    pub fn head_for(&self, base: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.base == base)
            .map(|entry| entry.head.as_str())
    }

    pub fn bases(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.base.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BaseBranchEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Template values shared by every target of `event`, for one `base`.
pub fn template_context(
    event: &MergeEvent,
    pattern: &LabelPattern,
    base: &str,
    head: Option<&str>,
    label: &str,
) -> TemplateContext {
    TemplateContext {
        base: base.to_string(),
        head: head.map(str::to_string),
        number: event.source_pr_number(),
        title: event.title().to_string(),
        body: event.body().unwrap_or_default().to_string(),
        merge_commit_sha: event.merge_commit_sha().to_string(),
        author: event.author().to_string(),
        merger: event.merger().map(str::to_string),
        owner: event.owner().to_string(),
        repo: event.repo().to_string(),
        label: label.to_string(),
        non_matching_labels: pattern
            .non_matching(event.labels())
            .into_iter()
            .map(str::to_string)
            .collect(),
    }
}

/// Resolve the base branches an event asks to backport to.
///
/// A `labeled` event only looks at the label that was just added; a `closed`
/// event folds every label of the pull request, in order. Other actions
/// resolve to nothing.
pub fn resolve_base_branches(
    event: &MergeEvent,
    pattern: &LabelPattern,
    templates: &dyn BackportTemplates,
) -> Result<BaseBranchMap, BackportError> {
    let labels: Vec<&str> = match event.action() {
        PullRequestAction::Labeled => event.trigger_label().into_iter().collect(),
        PullRequestAction::Closed => event.labels().iter().map(String::as_str).collect(),
        PullRequestAction::Other => Vec::new(),
    };

    let mut map = BaseBranchMap::new();
    for label in labels {
        let Some(found) = pattern.extract(label)? else {
            continue;
        };

        let head = match found.head {
            Some(head) => head,
            None => {
                let context = template_context(event, pattern, &found.base, None, label);
                templates.render_head(&context)?
            }
        };

        if let Some(previous) = map.insert(&found.base, &head, label) {
            tracing::warn!(
                base = %found.base,
                previous_head = %previous,
                head = %head,
                label = %label,
                "Several labels target the same base branch; the last one wins"
            );
        }
    }

    tracing::debug!(bases = ?map.bases(), "Resolved base branches");
    Ok(map)
}

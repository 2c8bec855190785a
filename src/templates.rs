//! Pull request metadata templates
//!
//! The engine only sees the [`BackportTemplates`] capability. The bundled
//! [`PlaceholderTemplates`] fills `{{name}}` placeholders from a
//! [`TemplateContext`] and is what the CLI wires up from configuration.

use crate::backport::BackportError;
use regex::{Captures, Regex};
use serde::Serialize;
use std::sync::LazyLock;

pub const DEFAULT_TITLE_TEMPLATE: &str = "[Backport {{base}}] {{title}}";
pub const DEFAULT_BODY_TEMPLATE: &str = "Backport {{merge_commit_sha}} from #{{number}}.";
pub const DEFAULT_HEAD_TEMPLATE: &str = "backport-{{number}}-to-{{base}}";

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_]+)\s*\}\}").expect("placeholder regex is valid")
});

/// Values available to templates for one base branch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TemplateContext {
    pub base: String,
    /// Unset while the head name itself is being rendered.
    pub head: Option<String>,
    pub number: u64,
    pub title: String,
    pub body: String,
    pub merge_commit_sha: String,
    pub author: String,
    pub merger: Option<String>,
    pub owner: String,
    pub repo: String,
    /// The label that selected this base branch.
    pub label: String,
    /// Labels of the source pull request that do not request a backport.
    pub non_matching_labels: Vec<String>,
}

impl TemplateContext {
    fn lookup(&self, key: &str) -> Option<String> {
        let value = match key {
            "base" => self.base.clone(),
            "head" => self.head.clone().unwrap_or_default(),
            "number" => self.number.to_string(),
            "title" => self.title.clone(),
            "body" => self.body.clone(),
            "merge_commit_sha" => self.merge_commit_sha.clone(),
            "author" => self.author.clone(),
            "merger" => self.merger.clone().unwrap_or_default(),
            "owner" => self.owner.clone(),
            "repo" => self.repo.clone(),
            "label" => self.label.clone(),
            _ => return None,
        };
        Some(value)
    }
}

/// Renders the metadata of a backport pull request.
pub trait BackportTemplates: Send + Sync {
    fn render_title(&self, context: &TemplateContext) -> Result<String, BackportError>;

    fn render_body(&self, context: &TemplateContext) -> Result<String, BackportError>;

    fn render_head(&self, context: &TemplateContext) -> Result<String, BackportError>;

    fn render_labels(&self, context: &TemplateContext) -> Result<Vec<String>, BackportError>;
}

/// `{{name}}` placeholder templates.
#[derive(Debug, Clone)]
pub struct PlaceholderTemplates {
    title: String,
    body: String,
    head: String,
    /// Must render to a JSON array of strings.
    labels: Option<String>,
    copy_original_labels: bool,
    extra_labels: Vec<String>,
}

impl Default for PlaceholderTemplates {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE_TEMPLATE.to_string(),
            body: DEFAULT_BODY_TEMPLATE.to_string(),
            head: DEFAULT_HEAD_TEMPLATE.to_string(),
            labels: None,
            copy_original_labels: false,
            extra_labels: Vec::new(),
        }
    }
}

impl PlaceholderTemplates {
    pub fn new(title: &str, body: &str, head: &str) -> Self {
        Self {
            title: title.to_string(),
            body: body.to_string(),
            head: head.to_string(),
            ..Self::default()
        }
    }

    pub fn with_labels_template(mut self, template: Option<String>) -> Self {
        self.labels = template.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn with_original_labels(mut self, copy: bool) -> Self {
        self.copy_original_labels = copy;
        self
    }

    pub fn with_extra_labels(mut self, labels: Vec<String>) -> Self {
        self.extra_labels = labels;
        self
    }

    fn render(&self, name: &str, template: &str, context: &TemplateContext) -> Result<String, BackportError> {
        let mut unknown: Option<String> = None;
        let rendered = PLACEHOLDER.replace_all(template, |caps: &Captures<'_>| {
            let key = &caps[1];
            context.lookup(key).unwrap_or_else(|| {
                unknown.get_or_insert_with(|| key.to_string());
                String::new()
            })
        });

        if let Some(key) = unknown {
            return Err(BackportError::configuration(format!(
                "unknown placeholder `{{{{{key}}}}}` in {name} template `{template}`"
            )));
        }
        Ok(rendered.into_owned())
    }
}

impl BackportTemplates for PlaceholderTemplates {
    fn render_title(&self, context: &TemplateContext) -> Result<String, BackportError> {
        let title = self.render("title", &self.title, context)?;
        if title.trim().is_empty() {
            return Err(BackportError::configuration(format!(
                "title template `{}` rendered an empty title",
                self.title
            )));
        }
        Ok(title)
    }

    fn render_body(&self, context: &TemplateContext) -> Result<String, BackportError> {
        self.render("body", &self.body, context)
    }

    fn render_head(&self, context: &TemplateContext) -> Result<String, BackportError> {
        let head = self.render("head", &self.head, context)?;
        let head = head.trim();
        if head.is_empty() || head.chars().any(char::is_whitespace) {
            return Err(BackportError::configuration(format!(
                "head template `{}` rendered `{head}`, which is not a usable branch name",
                self.head
            )));
        }
        Ok(head.to_string())
    }

    fn render_labels(&self, context: &TemplateContext) -> Result<Vec<String>, BackportError> {
        let mut labels = Vec::new();

        if let Some(template) = &self.labels {
            let rendered = self.render("labels", template, context)?;
            let parsed: Vec<String> = serde_json::from_str(&rendered).map_err(|e| {
                BackportError::configuration(format!(
                    "labels template rendered `{rendered}`, which is not a JSON array of strings: {e}"
                ))
            })?;
            labels.extend(parsed);
        }
        if self.copy_original_labels {
            labels.extend(context.non_matching_labels.iter().cloned());
        }
        labels.extend(self.extra_labels.iter().cloned());

        let mut unique: Vec<String> = Vec::with_capacity(labels.len());
        for label in labels {
            let label = label.trim().to_string();
            if !label.is_empty() && !unique.contains(&label) {
                unique.push(label);
            }
        }
        Ok(unique)
    }
}

/// Split a comma separated list, trimming entries and dropping empty ones.
pub fn split_comma_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

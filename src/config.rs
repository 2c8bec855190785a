use crate::backport::{
    BackportError, OrchestratorSettings, WorkspaceSettings, DEFAULT_COMMITTER_EMAIL, DEFAULT_COMMITTER_NAME,
};
use crate::event::{LabelPattern, DEFAULT_LABEL_PATTERN};
use crate::templates::{
    split_comma_list, PlaceholderTemplates, DEFAULT_BODY_TEMPLATE, DEFAULT_HEAD_TEMPLATE, DEFAULT_TITLE_TEMPLATE,
};
use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for the backport bot
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct BackportConfig {
    /// GitHub configuration
    pub github: GitHubConfig,
    /// Which labels request a backport, and which labels the backport gets
    pub labels: LabelsConfig,
    /// Pull request metadata templates
    pub templates: TemplatesConfig,
    pub reviewers: ReviewersConfig,
    /// Commit identity used for cherry-picks
    pub identity: IdentityConfig,
    pub workspace: WorkspaceConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// GitHub API token (can be set via env var)
    pub token: Option<String>,
    /// API root, for GitHub Enterprise
    pub api_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LabelsConfig {
    /// Regex with a named `base` group and an optional `head` group
    pub pattern: String,
    /// Copy the source pull request labels that do not request a backport
    pub copy_original: bool,
    /// Comma separated labels added to every backport
    pub add: String,
}

impl Default for LabelsConfig {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_LABEL_PATTERN.to_string(),
            copy_original: false,
            add: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TemplatesConfig {
    pub title: String,
    pub body: String,
    pub head: String,
    /// Renders to a JSON array of label names
    pub labels: Option<String>,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE_TEMPLATE.to_string(),
            body: DEFAULT_BODY_TEMPLATE.to_string(),
            head: DEFAULT_HEAD_TEMPLATE.to_string(),
            labels: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReviewersConfig {
    /// Ask the author and merger of the source pull request to review
    pub request: bool,
}

impl Default for ReviewersConfig {
    fn default() -> Self {
        Self { request: true }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub name: String,
    pub email: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_COMMITTER_NAME.to_string(),
            email: DEFAULT_COMMITTER_EMAIL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Parent directory of the temporary clone
    pub directory: Option<PathBuf>,
}

impl BackportConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration files (backport.toml, .backport-rc)
    /// 3. Environment variables (prefixed with BACKPORT_, sections split by `__`)
    /// 4. GITHUB_TOKEN and GitHub Actions `INPUT_*` variables for unset values
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("."))
    }

    pub fn load_from(dir: &Path) -> Result<Self> {
        let mut builder = Config::builder();

        let toml_file = dir.join("backport.toml");
        if toml_file.exists() {
            builder = builder.add_source(File::from(toml_file));
        }

        let rc_file = dir.join(".backport-rc");
        if rc_file.exists() {
            builder = builder.add_source(File::from(rc_file).format(config::FileFormat::Toml));
        }

        builder = builder.add_source(
            Environment::with_prefix("BACKPORT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let mut backport_config: BackportConfig = builder.build()?.try_deserialize()?;
        backport_config.apply_fallbacks(|name| std::env::var(name).ok());
        Ok(backport_config)
    }

    /// Fill unset values from `GITHUB_TOKEN` and action inputs.
    pub fn apply_fallbacks(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if self.github.token.as_deref().map_or(true, str::is_empty) {
            self.github.token = lookup("INPUT_GITHUB_TOKEN").or_else(|| lookup("GITHUB_TOKEN"));
        }
        if self.github.api_url.is_none() {
            self.github.api_url = lookup("GITHUB_API_URL");
        }
        if let Some(pattern) = lookup("INPUT_LABEL_PATTERN") {
            self.labels.pattern = pattern;
        }
        if let Some(labels) = lookup("INPUT_LABELS_TEMPLATE") {
            self.templates.labels = Some(labels);
        }
        if let Some(title) = lookup("INPUT_TITLE_TEMPLATE") {
            self.templates.title = title;
        }
        if let Some(body) = lookup("INPUT_BODY_TEMPLATE") {
            self.templates.body = body;
        }
        if let Some(head) = lookup("INPUT_HEAD_TEMPLATE") {
            self.templates.head = head;
        }
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }

    pub fn token(&self) -> Option<&str> {
        self.github.token.as_deref().filter(|token| !token.is_empty())
    }

    pub fn label_pattern(&self) -> Result<LabelPattern, BackportError> {
        LabelPattern::new(&self.labels.pattern)
    }

    pub fn templates(&self) -> PlaceholderTemplates {
        PlaceholderTemplates::new(&self.templates.title, &self.templates.body, &self.templates.head)
            .with_labels_template(self.templates.labels.clone())
            .with_original_labels(self.labels.copy_original)
            .with_extra_labels(split_comma_list(&self.labels.add))
    }

    pub fn orchestrator_settings(&self) -> OrchestratorSettings {
        OrchestratorSettings {
            workspace: WorkspaceSettings {
                committer_name: self.identity.name.clone(),
                committer_email: self.identity.email.clone(),
                root: self.workspace.directory.clone(),
            },
            request_reviewers: self.reviewers.request,
        }
    }

    /// The effective configuration as TOML, with the token hidden.
    pub fn to_toml_redacted(&self) -> Result<String> {
        let mut redacted = self.clone();
        if redacted.github.token.is_some() {
            redacted.github.token = Some("***".to_string());
        }
        Ok(toml::to_string_pretty(&redacted)?)
    }
}

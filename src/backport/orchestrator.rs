//! One invocation: event in, backport pull requests and failure comments out.

use super::errors::BackportError;
use super::executor::{BackportExecutor, OpenedBackport};
use super::reporter::FailureReporter;
use super::target::{plan_targets, BackportTarget, SourceCommit};
use super::workspace::{RepositoryWorkspace, WorkspaceSettings};
use crate::event::{resolve_base_branches, LabelPattern, MergeEvent, PullRequestEventPayload};
use crate::external::CommandExecutor;
use crate::github::BackportApi;
use crate::telemetry::{create_backport_span, create_run_span, generate_correlation_id, LogGroup};
use crate::templates::BackportTemplates;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::Instrument;

/// Base branch → number of the backport pull request created for it.
///
/// Bases whose backport failed are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BackportResult {
    pull_requests: BTreeMap<String, u64>,
}

impl BackportResult {
    pub fn record(&mut self, base: &str, number: u64) {
        self.pull_requests.insert(base.to_string(), number);
    }

    pub fn get(&self, base: &str) -> Option<u64> {
        self.pull_requests.get(base).copied()
    }

    pub fn len(&self) -> usize {
        self.pull_requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pull_requests.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.pull_requests.iter().map(|(base, number)| (base.as_str(), *number))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorSettings {
    pub workspace: WorkspaceSettings,
    pub request_reviewers: bool,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            workspace: WorkspaceSettings::default(),
            request_reviewers: true,
        }
    }
}

pub struct Orchestrator {
    api: Arc<dyn BackportApi>,
    commands: Arc<dyn CommandExecutor>,
    settings: OrchestratorSettings,
}

impl Orchestrator {
    pub fn new(api: Arc<dyn BackportApi>, commands: Arc<dyn CommandExecutor>) -> Self {
        Self {
            api,
            commands,
            settings: OrchestratorSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: OrchestratorSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Resolve and render the targets of `payload` without touching git or GitHub.
    pub fn plan(
        payload: &PullRequestEventPayload,
        pattern: &LabelPattern,
        templates: &dyn BackportTemplates,
    ) -> Result<Vec<BackportTarget>, BackportError> {
        let event = MergeEvent::from_payload(payload)?;
        let map = resolve_base_branches(&event, pattern, templates)?;
        plan_targets(&event, &map, pattern, templates)
    }

    /// Backport the merged pull request of `payload` to every requested base.
    ///
    /// Only configuration and precondition problems, or a failure comment
    /// that could not be posted, are returned as errors. Every other failure
    /// is reported on the source pull request and leaves its base out of the
    /// result. Failed reviewer or label requests are reported too, but the
    /// base keeps its pull request in the result.
    pub async fn run(
        &self,
        payload: &PullRequestEventPayload,
        pattern: &LabelPattern,
        templates: &dyn BackportTemplates,
        token: &str,
    ) -> Result<BackportResult, BackportError> {
        let correlation_id = generate_correlation_id();
        let span = create_run_span(payload.pull_request.number, &correlation_id);

        self.run_inner(payload, pattern, templates, token, &correlation_id)
            .instrument(span)
            .await
    }

    async fn run_inner(
        &self,
        payload: &PullRequestEventPayload,
        pattern: &LabelPattern,
        templates: &dyn BackportTemplates,
        token: &str,
        correlation_id: &str,
    ) -> Result<BackportResult, BackportError> {
        let event = MergeEvent::from_payload(payload)?;
        let map = resolve_base_branches(&event, pattern, templates)?;
        if map.is_empty() {
            tracing::info!(action = ?event.action(), "No label requests a backport");
            return Ok(BackportResult::default());
        }

        let targets = plan_targets(&event, &map, pattern, templates)?;
        tracing::info!(
            bases = ?map.bases(),
            commit = %event.merge_commit_sha(),
            "Backporting pull request"
        );

        self.warn_about_merge_methods().await;

        let reporter = FailureReporter::new(self.api.as_ref(), event.source_pr_number()).with_secret(token);
        let mut result = BackportResult::default();

        let mut workspace = match RepositoryWorkspace::open(
            self.commands.clone(),
            event.clone_url(),
            token,
            &self.settings.workspace,
        )
        .await
        {
            Ok(workspace) => workspace,
            Err(error) => {
                let commit = SourceCommit::new(event.merge_commit_sha(), None);
                for target in &targets {
                    report(&reporter, target, &commit, &error).await?;
                }
                return Ok(result);
            }
        };

        let commit = match workspace.inspect_commit(event.merge_commit_sha()).await {
            Ok(commit) => commit,
            Err(error) => {
                tracing::warn!(error = %error, "Could not inspect the merge commit; picking it as a regular commit");
                SourceCommit::new(event.merge_commit_sha(), None)
            }
        };

        let executor = BackportExecutor::new(self.api.as_ref()).with_reviewers(self.settings.request_reviewers);
        for target in &targets {
            let _group = LogGroup::start(&format!("Backporting to {} on {}", target.base, target.head));
            let span = create_backport_span(&target.base, &target.head, event.source_pr_number(), correlation_id);

            match executor.execute(&mut workspace, target, &commit).instrument(span).await {
                Ok(opened) => {
                    result.record(&target.base, opened.number);
                    report_incomplete(&reporter, target, &opened).await?;
                }
                Err(failure) => {
                    tracing::debug!(base = %target.base, stage = %failure.stage, "Backport stopped");
                    report(&reporter, target, &commit, &failure).await?;
                }
            }
        }

        tracing::info!(created = result.len(), requested = targets.len(), "Backport run finished");
        Ok(result)
    }

    async fn warn_about_merge_methods(&self) {
        match self.api.merge_settings().await {
            Ok(settings) => {
                let methods = settings.multi_commit_methods();
                if !methods.is_empty() {
                    tracing::warn!(
                        methods = ?methods,
                        "The repository allows merge methods that can leave several commits; only the merge commit is backported, squash merging is recommended"
                    );
                }
            }
            Err(error) => tracing::debug!(error = %error, "Could not read repository merge settings"),
        }
    }
}

async fn report(
    reporter: &FailureReporter<'_>,
    target: &BackportTarget,
    commit: &SourceCommit,
    error: &(dyn std::error::Error + 'static),
) -> Result<(), BackportError> {
    reporter
        .report(&target.base, &target.head, commit, error)
        .await
        .map(|_| ())
        .map_err(|source| BackportError::Reporting {
            base: target.base.clone(),
            source,
        })
}

async fn report_incomplete(
    reporter: &FailureReporter<'_>,
    target: &BackportTarget,
    opened: &OpenedBackport,
) -> Result<(), BackportError> {
    for failure in &opened.incomplete {
        reporter
            .report_incomplete(&target.base, opened.number, failure)
            .await
            .map_err(|source| BackportError::Reporting {
                base: target.base.clone(),
                source,
            })?;
    }
    Ok(())
}

//! Shared fakes for the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use backport_bot::external::{CommandError, CommandExecutor, CommandOutput};
use backport_bot::github::{BackportApi, GitHubError, MergeSettings, NewPullRequest, PostedComment};
use backport_bot::PullRequestEventPayload;
use serde_json::json;
use std::path::Path;
use std::sync::Mutex;

/// GitHub fake that records every call and numbers pull requests from 101.
#[derive(Default)]
pub struct RecordingApi {
    created: Mutex<Vec<NewPullRequest>>,
    reviewer_requests: Mutex<Vec<(u64, Vec<String>)>>,
    label_requests: Mutex<Vec<(u64, Vec<String>)>>,
    comments: Mutex<Vec<(u64, String)>>,
    merge_settings_reads: Mutex<usize>,
    reject_pull_requests_to: Vec<String>,
    reject_comments: bool,
    reject_labels: bool,
    settings: MergeSettings,
}

impl RecordingApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail pull request creation against `base`.
    pub fn rejecting_pull_requests_to(mut self, base: &str) -> Self {
        self.reject_pull_requests_to.push(base.to_string());
        self
    }

    pub fn rejecting_comments(mut self) -> Self {
        self.reject_comments = true;
        self
    }

    pub fn rejecting_labels(mut self) -> Self {
        self.reject_labels = true;
        self
    }

    pub fn with_merge_settings(mut self, settings: MergeSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn created(&self) -> Vec<NewPullRequest> {
        self.created.lock().unwrap().clone()
    }

    pub fn reviewer_requests(&self) -> Vec<(u64, Vec<String>)> {
        self.reviewer_requests.lock().unwrap().clone()
    }

    pub fn label_requests(&self) -> Vec<(u64, Vec<String>)> {
        self.label_requests.lock().unwrap().clone()
    }

    pub fn comments(&self) -> Vec<(u64, String)> {
        self.comments.lock().unwrap().clone()
    }

    pub fn merge_settings_reads(&self) -> usize {
        *self.merge_settings_reads.lock().unwrap()
    }

    /// Number of calls that changed something on GitHub.
    pub fn mutation_count(&self) -> usize {
        self.created().len() + self.reviewer_requests().len() + self.label_requests().len() + self.comments().len()
    }
}

#[async_trait]
impl BackportApi for RecordingApi {
    async fn create_pull_request(&self, request: &NewPullRequest) -> Result<u64, GitHubError> {
        if self.reject_pull_requests_to.contains(&request.base) {
            return Err(GitHubError::InvalidResponse(format!(
                "Validation Failed: no history in common with {}",
                request.base
            )));
        }
        let mut created = self.created.lock().unwrap();
        created.push(request.clone());
        Ok(100 + created.len() as u64)
    }

    async fn request_reviewers(&self, pr_number: u64, reviewers: &[String]) -> Result<(), GitHubError> {
        self.reviewer_requests.lock().unwrap().push((pr_number, reviewers.to_vec()));
        Ok(())
    }

    async fn add_labels(&self, issue_number: u64, labels: &[String]) -> Result<(), GitHubError> {
        if self.reject_labels {
            return Err(GitHubError::InvalidResponse(
                "Resource not accessible by integration: issues write permission required".to_string(),
            ));
        }
        self.label_requests.lock().unwrap().push((issue_number, labels.to_vec()));
        Ok(())
    }

    async fn create_comment(&self, issue_number: u64, body: &str) -> Result<PostedComment, GitHubError> {
        if self.reject_comments {
            return Err(GitHubError::InvalidResponse("Resource not accessible by integration".to_string()));
        }
        let mut comments = self.comments.lock().unwrap();
        comments.push((issue_number, body.to_string()));
        Ok(PostedComment {
            id: comments.len() as u64,
            html_url: None,
        })
    }

    async fn merge_settings(&self) -> Result<MergeSettings, GitHubError> {
        *self.merge_settings_reads.lock().unwrap() += 1;
        Ok(self.settings.clone())
    }
}

/// Git fake: every command succeeds with empty output unless scripted.
///
/// It follows `git switch` calls so a response can be tied to the branch
/// that is checked out when the command runs.
#[derive(Default)]
pub struct ScriptedCommands {
    rules: Vec<Rule>,
    calls: Mutex<Vec<String>>,
    branch: Mutex<Option<String>>,
}

struct Rule {
    prefix: String,
    branch: Option<String>,
    output: CommandOutput,
}

impl ScriptedCommands {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every command starting with `prefix`.
    pub fn respond(mut self, prefix: &str, output: CommandOutput) -> Self {
        self.rules.push(Rule {
            prefix: prefix.to_string(),
            branch: None,
            output,
        });
        self
    }

    /// Answer commands starting with `prefix` while `branch` is checked out.
    pub fn respond_on_branch(mut self, prefix: &str, branch: &str, output: CommandOutput) -> Self {
        self.rules.push(Rule {
            prefix: prefix.to_string(),
            branch: Some(branch.to_string()),
            output,
        });
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_starting_with(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|call| call.starts_with(prefix))
            .collect()
    }
}

#[async_trait]
impl CommandExecutor for ScriptedCommands {
    async fn execute(
        &self,
        program: &str,
        args: &[&str],
        _cwd: Option<&Path>,
    ) -> Result<CommandOutput, CommandError> {
        let line = format!("{} {}", program, args.join(" "));
        self.calls.lock().unwrap().push(line.clone());

        let current = self.branch.lock().unwrap().clone();
        let scripted = self
            .rules
            .iter()
            .find(|rule| {
                line.starts_with(rule.prefix.as_str())
                    && rule.branch.as_ref().map_or(true, |branch| current.as_ref() == Some(branch))
            })
            .map(|rule| rule.output.clone());

        let output = scripted.unwrap_or_else(|| CommandOutput::ok(""));
        if output.success() && program == "git" && args.first() == Some(&"switch") {
            if let Some(branch) = args.last() {
                *self.branch.lock().unwrap() = Some(branch.to_string());
            }
        }
        Ok(output)
    }
}

pub const MERGE_SHA: &str = "abc123def456";

/// A merged pull request #42 by alice, merged by bob.
pub fn merged_payload(action: &str, trigger: Option<&str>, labels: &[&str], clone_url: &str) -> PullRequestEventPayload {
    payload_with(action, trigger, labels, clone_url, true, Some(MERGE_SHA), "bob")
}

pub fn payload_with(
    action: &str,
    trigger: Option<&str>,
    labels: &[&str],
    clone_url: &str,
    merged: bool,
    merge_commit_sha: Option<&str>,
    merger: &str,
) -> PullRequestEventPayload {
    let labels: Vec<_> = labels.iter().map(|name| json!({ "name": name })).collect();
    serde_json::from_value(json!({
        "action": action,
        "label": trigger.map(|name| json!({ "name": name })),
        "pull_request": {
            "number": 42,
            "title": "Fix overflow in parser",
            "body": "Closes #40",
            "merge_commit_sha": merge_commit_sha,
            "merged": merged,
            "labels": labels,
            "user": {"login": "alice"},
            "merged_by": {"login": merger}
        },
        "repository": {
            "name": "widgets",
            "owner": {"login": "acme"},
            "clone_url": clone_url
        }
    }))
    .expect("payload fixture is valid")
}

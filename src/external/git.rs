//! Git command abstractions
//!
//! Wraps the `git` CLI behind the [`CommandExecutor`] seam so the backport
//! workflow can be driven against a real checkout or a scripted fake.

use super::command::{CommandError, CommandExecutor};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

pub type BranchName = String;

const REDACTED: &str = "***";

#[derive(Debug, Error)]
pub enum GitError {
    #[error("Cherry-picking {commit} onto {branch} resulted in conflicts:\n{details}")]
    CherryPickConflict {
        commit: String,
        branch: BranchName,
        details: String,
    },
    #[error("Branch not found: {branch}")]
    BranchNotFound { branch: BranchName },
    #[error("Branch already exists: {branch}")]
    BranchAlreadyExists { branch: BranchName },
    #[error("Push of {branch} was rejected: {message}")]
    PushRejected { branch: BranchName, message: String },
    #[error("Command execution error: {source}")]
    CommandError {
        #[from]
        source: CommandError,
    },
    #[error("git {command} failed: {message}")]
    GitCommandFailed { command: String, message: String },
}

#[derive(Debug, Clone, Default)]
pub struct GitStatus {
    pub is_clean: bool,
    pub staged_files: Vec<String>,
    pub unstaged_files: Vec<String>,
    pub untracked_files: Vec<String>,
    pub conflicted_files: Vec<String>,
}

/// `git` CLI bound to an optional working directory.
///
/// Every string registered with [`GitCli::with_secret`] is masked in logs and
/// in the messages of returned errors.
#[derive(Clone)]
pub struct GitCli {
    executor: Arc<dyn CommandExecutor>,
    workdir: Option<PathBuf>,
    secrets: Vec<String>,
}

impl GitCli {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self {
            executor,
            workdir: None,
            secrets: Vec::new(),
        }
    }

    pub fn with_secret(mut self, secret: &str) -> Self {
        if !secret.is_empty() {
            self.secrets.push(secret.to_string());
        }
        self
    }

    /// Same CLI and secrets, running inside `dir`.
    pub fn in_dir(&self, dir: &Path) -> Self {
        Self {
            executor: Arc::clone(&self.executor),
            workdir: Some(dir.to_path_buf()),
            secrets: self.secrets.clone(),
        }
    }

    pub fn redact(&self, text: &str) -> String {
        self.secrets
            .iter()
            .fold(text.to_string(), |acc, secret| acc.replace(secret.as_str(), REDACTED))
    }

    /// Run an arbitrary git command and return its trimmed stdout.
    pub async fn run(&self, args: &[&str]) -> Result<String, GitError> {
        Ok(self.run_raw(args).await?.trim().to_string())
    }

    async fn run_raw(&self, args: &[&str]) -> Result<String, GitError> {
        let printable = self.redact(&args.join(" "));
        tracing::debug!(command = %printable, workdir = ?self.workdir, "running git");

        let output = self
            .executor
            .execute("git", args, self.workdir.as_deref())
            .await?;

        if !output.success() {
            let combined = format!("{}\n{}", output.stdout.trim(), output.stderr.trim());
            let message = self.redact(combined.trim());
            tracing::debug!(command = %printable, status = output.status_code, "git failed");
            return Err(self.classify_git_error(&message, args));
        }

        Ok(output.stdout)
    }

    fn classify_git_error(&self, message: &str, args: &[&str]) -> GitError {
        let subcommand = args.first().copied().unwrap_or("");
        let last_arg = args.last().map(|arg| self.redact(arg)).unwrap_or_default();

        match subcommand {
            "cherry-pick"
                if message.contains("CONFLICT")
                    || message.contains("could not apply")
                    || message.contains("after resolving the conflicts") =>
            {
                GitError::CherryPickConflict {
                    commit: last_arg,
                    branch: "HEAD".to_string(),
                    details: message.to_string(),
                }
            }
            "switch" if message.contains("already exists") => GitError::BranchAlreadyExists {
                branch: last_arg,
            },
            "switch"
                if message.contains("invalid reference")
                    || message.contains("did not match any") =>
            {
                GitError::BranchNotFound { branch: last_arg }
            }
            "push" if message.contains("rejected") => GitError::PushRejected {
                branch: last_arg,
                message: message.to_string(),
            },
            _ => GitError::GitCommandFailed {
                command: subcommand.to_string(),
                message: message.to_string(),
            },
        }
    }

    pub async fn clone_repository(&self, url: &str, destination: &Path) -> Result<(), GitError> {
        let destination = destination.to_string_lossy();
        self.run(&["clone", url, destination.as_ref()]).await?;
        Ok(())
    }

    pub async fn set_config(&self, key: &str, value: &str) -> Result<(), GitError> {
        self.run(&["config", key, value]).await?;
        Ok(())
    }

    pub async fn set_remote_url(&self, remote: &str, url: &str) -> Result<(), GitError> {
        self.run(&["remote", "set-url", remote, url]).await?;
        Ok(())
    }

    /// Switch to an existing branch, creating it from the remote-tracking branch if needed.
    pub async fn switch(&self, branch: &str) -> Result<(), GitError> {
        self.run(&["switch", branch]).await?;
        Ok(())
    }

    /// Create `branch` from the current HEAD and switch to it.
    pub async fn switch_create(&self, branch: &str) -> Result<(), GitError> {
        self.run(&["switch", "--create", branch]).await?;
        Ok(())
    }

    /// Number of parents of `commit`; more than one means a merge commit.
    pub async fn parent_count(&self, commit: &str) -> Result<usize, GitError> {
        let output = self.run(&["rev-list", "--parents", "-n", "1", commit]).await?;
        let hashes = output.split_whitespace().count();
        if hashes == 0 {
            return Err(GitError::GitCommandFailed {
                command: "rev-list".to_string(),
                message: format!("commit {commit} not found"),
            });
        }
        Ok(hashes - 1)
    }

    /// Cherry-pick `commit` onto the current branch `onto` with a
    /// `(cherry picked from commit ...)` trailer.
    pub async fn cherry_pick(&self, commit: &str, mainline: bool, onto: &str) -> Result<(), GitError> {
        let mut args = vec!["cherry-pick", "-x"];
        if mainline {
            args.extend(["--mainline", "1"]);
        }
        args.push(commit);
        match self.run(&args).await {
            Err(GitError::CherryPickConflict { commit, details, .. }) => {
                Err(GitError::CherryPickConflict {
                    commit,
                    branch: onto.to_string(),
                    details,
                })
            }
            other => other.map(|_| ()),
        }
    }

    pub async fn cherry_pick_abort(&self) -> Result<(), GitError> {
        self.run(&["cherry-pick", "--abort"]).await?;
        Ok(())
    }

    /// Push the local `branch` to the same name on `destination` (remote name or URL).
    pub async fn push(&self, destination: &str, branch: &str) -> Result<(), GitError> {
        let refspec = format!("refs/heads/{branch}:refs/heads/{branch}");
        match self.run(&["push", destination, &refspec]).await {
            Err(GitError::PushRejected { message, .. }) => Err(GitError::PushRejected {
                branch: branch.to_string(),
                message,
            }),
            other => other.map(|_| ()),
        }
    }

    pub async fn status(&self) -> Result<GitStatus, GitError> {
        let output = self.run_raw(&["status", "--porcelain"]).await?;
        Ok(parse_status_output(&output))
    }
}

fn parse_status_output(output: &str) -> GitStatus {
    let mut status = GitStatus::default();

    for line in output.lines() {
        if line.len() < 3 {
            continue;
        }

        let status_chars: Vec<char> = line.chars().take(2).collect();
        let filename = line[3..].to_string();

        match (status_chars[0], status_chars[1]) {
            ('U', _) | (_, 'U') | ('A', 'A') | ('D', 'D') => status.conflicted_files.push(filename),
            ('?', '?') => status.untracked_files.push(filename),
            ('A', _) | ('M', _) | ('D', _) | ('R', _) | ('C', _) => {
                status.staged_files.push(filename)
            }
            (_, 'M') | (_, 'D') => status.unstaged_files.push(filename),
            _ => {}
        }
    }

    status.is_clean = status.staged_files.is_empty()
        && status.unstaged_files.is_empty()
        && status.untracked_files.is_empty()
        && status.conflicted_files.is_empty();
    status
}

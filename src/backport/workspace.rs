//! The single working tree shared by every backport attempt of a run.

use super::errors::BranchError;
use super::target::SourceCommit;
use crate::external::{CommandExecutor, GitCli, GitError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use url::Url;

pub const DEFAULT_COMMITTER_NAME: &str = "github-actions[bot]";
pub const DEFAULT_COMMITTER_EMAIL: &str = "41898282+github-actions[bot]@users.noreply.github.com";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceSettings {
    pub committer_name: String,
    pub committer_email: String,
    /// Parent directory for the clone; the system temp dir when unset.
    pub root: Option<PathBuf>,
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        Self {
            committer_name: DEFAULT_COMMITTER_NAME.to_string(),
            committer_email: DEFAULT_COMMITTER_EMAIL.to_string(),
            root: None,
        }
    }
}

/// Where the working tree stands between attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceState {
    /// Nothing in progress; the next attempt may switch branches.
    Clean,
    Attempting { base: String, head: String },
    /// The tree could not be restored; no further attempt may run.
    Poisoned { reason: String },
}

/// A clone of the repository, reused by every target in turn.
///
/// Attempts are bracketed by [`begin_attempt`](Self::begin_attempt) and
/// [`finish_attempt`](Self::finish_attempt); the latter only returns the
/// workspace to [`WorkspaceState::Clean`] once `git status` agrees.
pub struct RepositoryWorkspace {
    git: GitCli,
    push_url: String,
    checkout: PathBuf,
    state: WorkspaceState,
    // Removed from disk when the workspace is dropped.
    _dir: TempDir,
}

impl RepositoryWorkspace {
    /// Clone `clone_url` once and configure the committer identity.
    ///
    /// The token only ever appears on git command lines: the stored `origin`
    /// URL is reset to `clone_url` right after cloning.
    pub async fn open(
        commands: Arc<dyn CommandExecutor>,
        clone_url: &str,
        token: &str,
        settings: &WorkspaceSettings,
    ) -> Result<Self, BranchError> {
        let builder = {
            let mut builder = tempfile::Builder::new();
            builder.prefix("backport-");
            builder
        };
        let dir = match &settings.root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .map_err(|e| BranchError::Workspace(format!("could not create a temporary directory: {e}")))?;

        let checkout = dir.path().join("repository");
        let push_url = authenticated_url(clone_url, token);
        let git = GitCli::new(commands).with_secret(token);

        tracing::info!(clone_url = %clone_url, path = %checkout.display(), "Cloning repository");
        git.clone_repository(&push_url, &checkout).await?;

        let git = git.in_dir(&checkout);
        if push_url != clone_url {
            git.set_remote_url("origin", clone_url).await?;
        }
        git.set_config("user.name", &settings.committer_name).await?;
        git.set_config("user.email", &settings.committer_email).await?;

        Ok(Self {
            git,
            push_url,
            checkout,
            state: WorkspaceState::Clean,
            _dir: dir,
        })
    }

    pub fn path(&self) -> &Path {
        &self.checkout
    }

    pub fn state(&self) -> &WorkspaceState {
        &self.state
    }

    /// Run any git command inside the working tree.
    pub async fn run_git(&self, args: &[&str]) -> Result<String, GitError> {
        self.git.run(args).await
    }

    pub async fn inspect_commit(&self, sha: &str) -> Result<SourceCommit, GitError> {
        let parents = self.git.parent_count(sha).await?;
        Ok(SourceCommit::new(sha, Some(parents)))
    }

    pub fn begin_attempt(&mut self, base: &str, head: &str) -> Result<(), BranchError> {
        match &self.state {
            WorkspaceState::Clean => {
                self.state = WorkspaceState::Attempting {
                    base: base.to_string(),
                    head: head.to_string(),
                };
                Ok(())
            }
            WorkspaceState::Attempting { base: busy, .. } => Err(BranchError::Workspace(format!(
                "the working tree is still in use by the backport to `{busy}`"
            ))),
            WorkspaceState::Poisoned { reason } => Err(BranchError::Workspace(format!(
                "the working tree could not be restored after an earlier attempt: {reason}"
            ))),
        }
    }

    pub async fn switch_to_base(&self, base: &str) -> Result<(), GitError> {
        self.git.switch(base).await
    }

    pub async fn create_head(&self, head: &str) -> Result<(), GitError> {
        self.git.switch_create(head).await
    }

    pub async fn cherry_pick(&self, commit: &SourceCommit, onto: &str) -> Result<(), GitError> {
        self.git.cherry_pick(&commit.sha, commit.is_merge(), onto).await
    }

    /// Best effort: [`finish_attempt`](Self::finish_attempt) checks the outcome.
    pub async fn abort_cherry_pick(&self) {
        if let Err(error) = self.git.cherry_pick_abort().await {
            tracing::warn!(error = %error, "git cherry-pick --abort failed");
        }
    }

    pub async fn push_head(&self, head: &str) -> Result<(), GitError> {
        self.git.push(&self.push_url, head).await
    }

    /// End the current attempt, leaving the tree clean or poisoned.
    pub async fn finish_attempt(&mut self) -> Result<(), BranchError> {
        if matches!(self.state, WorkspaceState::Poisoned { .. }) {
            return Ok(());
        }

        match self.ensure_clean().await {
            Ok(()) => {
                self.state = WorkspaceState::Clean;
                Ok(())
            }
            Err(reason) => {
                tracing::error!(reason = %reason, "Working tree left dirty; skipping remaining attempts");
                self.state = WorkspaceState::Poisoned {
                    reason: reason.clone(),
                };
                Err(BranchError::Workspace(reason))
            }
        }
    }

    async fn ensure_clean(&self) -> Result<(), String> {
        let status = self.git.status().await.map_err(|e| e.to_string())?;
        if status.is_clean {
            return Ok(());
        }

        tracing::warn!(
            conflicted = ?status.conflicted_files,
            staged = ?status.staged_files,
            unstaged = ?status.unstaged_files,
            "Working tree not clean after attempt, resetting"
        );
        self.git
            .run(&["reset", "--hard", "HEAD"])
            .await
            .map_err(|e| e.to_string())?;
        self.git.run(&["clean", "-fd"]).await.map_err(|e| e.to_string())?;

        let status = self.git.status().await.map_err(|e| e.to_string())?;
        if status.is_clean {
            Ok(())
        } else {
            Err(format!(
                "{} file(s) still modified after reset",
                status.conflicted_files.len()
                    + status.staged_files.len()
                    + status.unstaged_files.len()
                    + status.untracked_files.len()
            ))
        }
    }
}

/// `clone_url` with `x-access-token:<token>@` credentials for http(s) URLs.
pub fn authenticated_url(clone_url: &str, token: &str) -> String {
    if token.is_empty() {
        return clone_url.to_string();
    }

    match Url::parse(clone_url) {
        Ok(mut url) if matches!(url.scheme(), "https" | "http") => {
            if url.set_username("x-access-token").is_ok() && url.set_password(Some(token)).is_ok() {
                url.to_string()
            } else {
                clone_url.to_string()
            }
        }
        _ => clone_url.to_string(),
    }
}

use super::comments::CommentHandler;
use super::errors::GitHubError;
use super::pulls::PullRequestHandler;
use super::types::{MergeSettings, NewPullRequest, PostedComment};
use async_trait::async_trait;
use octocrab::Octocrab;

#[cfg(test)]
use mockall::automock;

/// GitHub calls made by the backport engine, split out so the engine can be
/// exercised without a network.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait BackportApi: Send + Sync {
    /// Open a pull request and return its number.
    async fn create_pull_request(&self, request: &NewPullRequest) -> Result<u64, GitHubError>;

    async fn request_reviewers(&self, pr_number: u64, reviewers: &[String]) -> Result<(), GitHubError>;

    async fn add_labels(&self, issue_number: u64, labels: &[String]) -> Result<(), GitHubError>;

    async fn create_comment(&self, issue_number: u64, body: &str) -> Result<PostedComment, GitHubError>;

    /// Merge methods enabled on the repository.
    async fn merge_settings(&self) -> Result<MergeSettings, GitHubError>;
}

#[derive(Debug, Clone)]
pub struct GitHubClient {
    pulls: PullRequestHandler,
    comments: CommentHandler,
    octocrab: Octocrab,
    owner: String,
    repo: String,
}

impl GitHubClient {
    /// Build a client for `owner/repo`, against `api_url` when set (GitHub Enterprise, tests).
    pub fn new(
        token: &str,
        api_url: Option<&str>,
        owner: &str,
        repo: &str,
    ) -> Result<Self, GitHubError> {
        let mut builder = Octocrab::builder().personal_token(token.to_string());
        if let Some(url) = api_url {
            builder = builder.base_uri(url)?;
        }
        let octocrab = builder.build()?;

        Ok(Self::with_octocrab(octocrab, owner, repo))
    }

    pub fn with_octocrab(octocrab: Octocrab, owner: &str, repo: &str) -> Self {
        Self {
            pulls: PullRequestHandler::new(octocrab.clone(), owner.to_string(), repo.to_string()),
            comments: CommentHandler::new(octocrab.clone(), owner.to_string(), repo.to_string()),
            octocrab,
            owner: owner.to_string(),
            repo: repo.to_string(),
        }
    }

}

#[async_trait]
impl BackportApi for GitHubClient {
    async fn create_pull_request(&self, request: &NewPullRequest) -> Result<u64, GitHubError> {
        self.pulls.create_pull_request(request).await
    }

    async fn request_reviewers(&self, pr_number: u64, reviewers: &[String]) -> Result<(), GitHubError> {
        self.pulls.request_reviewers(pr_number, reviewers).await
    }

    async fn add_labels(&self, issue_number: u64, labels: &[String]) -> Result<(), GitHubError> {
        self.pulls.add_labels(issue_number, labels).await
    }

    async fn create_comment(&self, issue_number: u64, body: &str) -> Result<PostedComment, GitHubError> {
        self.comments.create_issue_comment(issue_number, body).await
    }

    async fn merge_settings(&self) -> Result<MergeSettings, GitHubError> {
        let repository = self.octocrab.repos(&self.owner, &self.repo).get().await?;
        Ok(MergeSettings::from(&repository))
    }
}

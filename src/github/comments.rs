use super::errors::GitHubError;
use super::types::PostedComment;
use octocrab::Octocrab;

/// Handler for GitHub comment operations
#[derive(Debug, Clone)]
pub struct CommentHandler {
    octocrab: Octocrab,
    owner: String,
    repo: String,
}

impl CommentHandler {
    pub fn new(octocrab: Octocrab, owner: String, repo: String) -> Self {
        Self {
            octocrab,
            owner,
            repo,
        }
    }

    /// Create a comment on an issue; pull request comments use the same endpoint
    pub async fn create_issue_comment(
        &self,
        issue_number: u64,
        body: &str,
    ) -> Result<PostedComment, GitHubError> {
        let comment = self
            .octocrab
            .issues(&self.owner, &self.repo)
            .create_comment(issue_number, body)
            .await?;

        tracing::info!(issue_number, comment_id = %comment.id, "Created comment");
        Ok(PostedComment {
            id: comment.id.into_inner(),
            html_url: Some(comment.html_url.to_string()),
        })
    }
}

use super::{errors::GitHubError, types::NewPullRequest};
use octocrab::Octocrab;
use serde_json::json;

/// Handler for GitHub pull request operations
#[derive(Debug, Clone)]
pub struct PullRequestHandler {
    octocrab: Octocrab,
    owner: String,
    repo: String,
}

impl PullRequestHandler {
    pub fn new(octocrab: Octocrab, owner: String, repo: String) -> Self {
        Self {
            octocrab,
            owner,
            repo,
        }
    }

    /// Create a new pull request and return its number
    pub async fn create_pull_request(&self, request: &NewPullRequest) -> Result<u64, GitHubError> {
        let pr = self
            .octocrab
            .pulls(&self.owner, &self.repo)
            .create(&request.title, &request.head, &request.base)
            .body::<String>(request.body.clone())
            .send()
            .await?;

        tracing::info!(
            pr_number = pr.number,
            base = %request.base,
            head = %request.head,
            url = ?pr.html_url.as_ref().map(|url| url.as_str()),
            "Created backport pull request"
        );
        Ok(pr.number)
    }

    /// Ask the given users to review a pull request
    pub async fn request_reviewers(
        &self,
        pr_number: u64,
        reviewers: &[String],
    ) -> Result<(), GitHubError> {
        // `pulls().request_reviews` decodes the reply as a review, but GitHub answers with the pull request.
        let route = format!(
            "/repos/{}/{}/pulls/{}/requested_reviewers",
            self.owner, self.repo, pr_number
        );
        let data = json!({ "reviewers": reviewers });
        let _: serde_json::Value = self.octocrab.post(route, Some(&data)).await?;

        tracing::info!(pr_number, reviewers = ?reviewers, "Requested reviewers");
        Ok(())
    }

    /// Add labels to a pull request (labels live on the issue side of the API)
    pub async fn add_labels(&self, issue_number: u64, labels: &[String]) -> Result<(), GitHubError> {
        let applied = self
            .octocrab
            .issues(&self.owner, &self.repo)
            .add_labels(issue_number, labels)
            .await?;

        tracing::info!(issue_number, labels = ?labels, total = applied.len(), "Applied labels");
        Ok(())
    }
}

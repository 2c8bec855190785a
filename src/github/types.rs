/// Pull request about to be opened for a backport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPullRequest {
    pub title: String,
    pub body: String,
    pub head: String,
    pub base: String,
}

/// A comment posted on an issue or pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedComment {
    pub id: u64,
    pub html_url: Option<String>,
}

/// Merge methods allowed on a repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeSettings {
    pub allow_merge_commit: bool,
    pub allow_rebase_merge: bool,
    pub allow_squash_merge: bool,
}

impl From<&octocrab::models::Repository> for MergeSettings {
    fn from(repository: &octocrab::models::Repository) -> Self {
        Self {
            allow_merge_commit: repository.allow_merge_commit.unwrap_or(false),
            allow_rebase_merge: repository.allow_rebase_merge.unwrap_or(false),
            allow_squash_merge: repository.allow_squash_merge.unwrap_or(false),
        }
    }
}

impl MergeSettings {
    /// Methods other than squash, which can leave several commits behind a merge.
    pub fn multi_commit_methods(&self) -> Vec<&'static str> {
        let mut methods = Vec::new();
        if self.allow_merge_commit {
            methods.push("merge commit");
        }
        if self.allow_rebase_merge {
            methods.push("rebase merge");
        }
        methods
    }
}

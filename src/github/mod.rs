pub mod client;
pub mod pulls;
pub mod comments;
pub mod types;
pub mod errors;

pub use client::{BackportApi, GitHubClient};
pub use errors::GitHubError;
pub use types::{MergeSettings, NewPullRequest, PostedComment};

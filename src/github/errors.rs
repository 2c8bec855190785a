use octocrab::Error as OctocrabError;

#[derive(Debug)]
pub enum GitHubError {
    ApiError(OctocrabError),
    InvalidResponse(String),
}

impl From<OctocrabError> for GitHubError {
    fn from(err: OctocrabError) -> Self {
        GitHubError::ApiError(err)
    }
}

impl GitHubError {
    /// HTTP status reported by GitHub, when the API answered at all.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            GitHubError::ApiError(octocrab::Error::GitHub { source, .. }) => {
                Some(source.status_code.as_u16())
            }
            _ => None,
        }
    }
}

// Rendered into pull request comments, so keep it to a couple of lines.
impl std::fmt::Display for GitHubError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GitHubError::ApiError(octocrab_err) => match octocrab_err {
                octocrab::Error::GitHub { source, .. } => {
                    write!(
                        f,
                        "GitHub API error: HTTP {}: {}",
                        source.status_code, source.message
                    )?;
                    if let Some(errors) = &source.errors {
                        for error in errors {
                            write!(f, "\n  → {error}")?;
                        }
                    }
                    match source.status_code.as_u16() {
                        401 => write!(f, "\nThe token is invalid or expired."),
                        403 => write!(f, "\nThe token lacks the permissions needed for this call."),
                        404 => write!(f, "\nThe repository or pull request is not visible to this token."),
                        _ => Ok(()),
                    }
                }
                octocrab::Error::Http { .. } => {
                    write!(f, "Network connection to the GitHub API failed: {octocrab_err}")
                }
                _ => write!(f, "GitHub API error: {octocrab_err}"),
            },
            GitHubError::InvalidResponse(msg) => {
                write!(f, "Unexpected response from the GitHub API: {msg}")
            }
        }
    }
}

impl std::error::Error for GitHubError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GitHubError::ApiError(err) => Some(err),
            GitHubError::InvalidResponse(_) => None,
        }
    }
}

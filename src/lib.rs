// Backport Bot Library - label-driven backports of merged pull requests
// This exposes the engine and its adapters for the CLI and for testing

pub mod backport;
pub mod config;
pub mod event;
pub mod external;
pub mod github;
pub mod telemetry;
pub mod templates;

// Re-export key types for easy access
pub use backport::{
    describe_error, BackportError, BackportResult, BackportStage, BackportTarget, BranchError, BranchFailure,
    Orchestrator, OrchestratorSettings, RepositoryWorkspace, WorkspaceSettings, WorkspaceState,
};
pub use config::BackportConfig;
pub use event::{LabelPattern, MergeEvent, PullRequestEventPayload, DEFAULT_LABEL_PATTERN};
pub use external::{CommandExecutor, GitCli, GitError, ProcessCommandExecutor};
pub use github::{BackportApi, GitHubClient, GitHubError};
pub use telemetry::{create_backport_span, generate_correlation_id, init_telemetry};
pub use templates::{BackportTemplates, PlaceholderTemplates, TemplateContext};

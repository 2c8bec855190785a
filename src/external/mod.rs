//! External tool abstractions
//!
//! Trait-based wrappers around the `git` CLI so the backport workflow can run
//! against a real checkout in production and a scripted executor in tests.

pub mod command;
pub mod git;

pub use command::{CommandError, CommandExecutor, CommandOutput, ProcessCommandExecutor};
pub use git::{GitCli, GitError, GitStatus};

//! Git-specific error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while talking to git.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Failed to run git: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Git operation failed: {0}")]
    Operation(String),

    #[error("Not a git repository: {0}")]
    NotARepository(PathBuf),
}

/// Result type for git operations.
pub type Result<T> = std::result::Result<T, GitError>;

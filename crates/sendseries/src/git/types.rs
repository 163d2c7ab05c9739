//! Pure data types for git operations.

use serde::{Deserialize, Serialize};

/// One commit of the log shown next to a series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitInfo {
    /// Full commit hash.
    pub hash: String,
    /// Full commit message.
    pub message: String,
    pub author_name: String,
    pub author_email: String,
}

impl CommitInfo {
    /// First line of the commit message.
    pub fn title(&self) -> &str {
        self.message.lines().next().unwrap_or_default()
    }
}

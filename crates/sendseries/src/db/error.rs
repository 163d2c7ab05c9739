use std::path::PathBuf;

use thiserror::Error;

/// Failures of the state database, each naming what was being touched.
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Cannot create state directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot open state database '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Applying schema step `version` failed. Version 0 is the bookkeeping
    /// table itself.
    #[error("State schema v{version} ({step}) failed: {source}")]
    Schema {
        version: u32,
        step: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("State of workspace '{workspace}' is unreadable: {source}")]
    Query {
        workspace: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("State database connection was poisoned by a panicking thread")]
    Poisoned,
}

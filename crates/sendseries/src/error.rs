use std::path::PathBuf;
use thiserror::Error;

use crate::series::RecipientKind;

#[derive(Error, Debug)]
pub enum SeriesError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Git error: {0}")]
    Git(#[from] crate::git::GitError),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("Failed to decode stored series for '{head}': {source}")]
    Decode {
        head: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode series for '{head}': {source}")]
    Encode {
        head: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("The branch {0} already exists!")]
    BranchExists(String),

    #[error("No series remembered for {0}")]
    NoPreviousVersion(String),

    #[error("No branch is checked out")]
    NoHead,

    #[error("No repository attached")]
    NotAttached,

    #[error("Version must be at least 1, got {0}")]
    InvalidVersion(u32),

    #[error("No {kind} recipient at index {index}")]
    RecipientIndex { kind: RecipientKind, index: usize },

    #[error("No sent series at index {0}")]
    SentIndex(usize),

    #[error("Commit {commit} is outside the {available} formatted patches")]
    PatchIndex { commit: usize, available: usize },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config YAML: {0}")]
    ParseYaml(#[from] serde_yaml::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("{name} not found at '{path}'")]
    Missing { name: &'static str, path: PathBuf },

    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' failed: {message}")]
    Failed { program: String, message: String },

    #[error("Failed to create patch directory: {0}")]
    TempDir(#[source] std::io::Error),

    #[error("Failed to read '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error while streaming '{program}' output: {source}")]
    Stream {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, SeriesError>;

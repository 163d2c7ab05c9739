//! Snapshots handed to whatever renders a series.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::git::CommitInfo;
use crate::series::Series;

/// Everything a view needs to render the current series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesView {
    pub series: Series,
    pub head: String,
    /// The commits of the series, newest first.
    pub log: Vec<CommitInfo>,
    pub cover_letter: String,
    pub has_get_maintainer: bool,
    pub has_checkpatch: bool,
    pub has_maintainers: bool,
    pub has_previous_version: bool,
}

/// One remembered series, as listed when switching branches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesSummary {
    pub branch: String,
    /// `[prefix vN] title`
    pub description: String,
    pub current: bool,
}

/// Result of one handled command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum Outcome {
    /// The series after the command.
    View(SeriesView),
    /// Patch files left on disk for inspection.
    Patches(Vec<PathBuf>),
    /// Archive link of a sent email.
    Url(String),
}

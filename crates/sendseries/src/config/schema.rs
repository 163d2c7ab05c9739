use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// User settings. Paths of the kernel-style helper scripts are relative to
/// the repository root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub default_subject_prefix: String,
    pub default_tos: Vec<String>,
    pub default_ccs: Vec<String>,
    pub git_path: String,
    pub checkpatch_path: String,
    pub get_maintainer_path: String,
    pub maintainers_path: String,
    pub get_maintainer_to_args: Vec<String>,
    pub get_maintainer_cc_args: Vec<String>,
    pub format_patch_args: Vec<String>,
    pub archive_url_prefix: String,
    pub browser_command: Option<String>,
    pub database_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_subject_prefix: "PATCH".to_string(),
            default_tos: Vec::new(),
            default_ccs: Vec::new(),
            git_path: "git".to_string(),
            checkpatch_path: "scripts/checkpatch.pl".to_string(),
            get_maintainer_path: "scripts/get_maintainer.pl".to_string(),
            maintainers_path: "MAINTAINERS".to_string(),
            get_maintainer_to_args: vec![
                "--no-git".to_string(),
                "--no-m".to_string(),
                "--no-r".to_string(),
            ],
            get_maintainer_cc_args: vec!["--no-git".to_string(), "--no-l".to_string()],
            format_patch_args: Vec::new(),
            archive_url_prefix: "https://lore.kernel.org/r/".to_string(),
            browser_command: None,
            database_path: None,
        }
    }
}

impl Settings {
    /// Resolves a helper path against the repository root.
    pub fn workspace_path(&self, root: &Path, relative: &str) -> PathBuf {
        root.join(relative)
    }

    pub fn checkpatch(&self, root: &Path) -> PathBuf {
        self.workspace_path(root, &self.checkpatch_path)
    }

    pub fn get_maintainer(&self, root: &Path) -> PathBuf {
        self.workspace_path(root, &self.get_maintainer_path)
    }

    pub fn maintainers(&self, root: &Path) -> PathBuf {
        self.workspace_path(root, &self.maintainers_path)
    }

    /// Archive link for a sent message.
    pub fn archive_url(&self, message_id: &str) -> String {
        format!("{}{}", self.archive_url_prefix, message_id)
    }
}

//! Formatting a series into patch files.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use log::debug;
use tempfile::TempDir;

use super::args::{fill_cover_letter, format_patch_args, COVER_LETTER_FILE};
use super::run_captured;
use crate::error::ToolError;
use crate::git::GitRepository;
use crate::series::Series;

const PATCH_DIR_PREFIX: &str = "sendseries-format-patch-";

/// Patch files of one formatting run, in series order. The directory is
/// removed on drop unless [`PatchSet::keep`] is called.
#[derive(Debug)]
pub struct PatchSet {
    dir: TempDir,
    patches: Vec<PathBuf>,
}

impl PatchSet {
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn patches(&self) -> &[PathBuf] {
        &self.patches
    }

    pub fn len(&self) -> usize {
        self.patches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    /// Leaves the files on disk and returns their paths.
    pub fn keep(self) -> Vec<PathBuf> {
        let dir = self.dir.keep();
        debug!("Keeping patches in {}", dir.display());
        self.patches
    }
}

/// Formats the last `nb_patches` commits into a fresh directory, with a
/// cover letter when `cover_letter` is non-empty.
pub async fn format_patch(
    repo: &GitRepository,
    series: &Series,
    cover_letter: &str,
    extra_args: &[String],
) -> Result<PatchSet, ToolError> {
    let dir = tempfile::Builder::new()
        .prefix(PATCH_DIR_PREFIX)
        .tempdir()
        .map_err(ToolError::TempDir)?;

    let with_cover_letter = !cover_letter.is_empty();
    let mut args: Vec<OsString> = format_patch_args(series, with_cover_letter, extra_args)
        .into_iter()
        .map(OsString::from)
        .collect();
    args.push("-o".into());
    args.push(dir.path().into());

    run_captured(repo.git_path().as_os_str(), args, repo.root()).await?;

    if with_cover_letter {
        let path = dir.path().join(COVER_LETTER_FILE);
        let template = std::fs::read_to_string(&path).map_err(|source| ToolError::ReadFile {
            path: path.clone(),
            source,
        })?;
        let filled = fill_cover_letter(&template, &series.title, cover_letter);
        std::fs::write(&path, filled).map_err(|source| ToolError::WriteFile {
            path: path.clone(),
            source,
        })?;
    }

    let patches = list_patches(dir.path())?;
    debug!(
        "Formatted {} patches into {}",
        patches.len(),
        dir.path().display()
    );
    Ok(PatchSet { dir, patches })
}

fn list_patches(dir: &Path) -> Result<Vec<PathBuf>, ToolError> {
    let read_error = |source| ToolError::ReadFile {
        path: dir.to_path_buf(),
        source,
    };

    let mut patches = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_error)? {
        let path = entry.map_err(read_error)?.path();
        if path.is_file() {
            patches.push(path);
        }
    }
    patches.sort();
    Ok(patches)
}

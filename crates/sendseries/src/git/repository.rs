//! Git repository operations.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use log::debug;

use super::error::{GitError, Result};
use super::parse::{format_git_error, log_format, parse_log};
use super::types::CommitInfo;

/// Handle on the working tree a series controller is attached to.
#[derive(Debug, Clone)]
pub struct GitRepository {
    /// Top-level directory of the working tree.
    root: PathBuf,
    /// Git executable.
    git_path: PathBuf,
}

impl GitRepository {
    /// Creates a new git repository handle.
    pub fn new(root: impl Into<PathBuf>, git_path: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            git_path: git_path.into(),
        }
    }

    /// Finds the working tree containing `path`.
    pub fn discover(path: &Path, git_path: impl Into<PathBuf>) -> Result<Self> {
        let git_path = git_path.into();
        let output = Command::new(&git_path)
            .current_dir(path)
            .args(["rev-parse", "--show-toplevel"])
            .output()
            .map_err(GitError::Spawn)?;

        if !output.status.success() {
            return Err(GitError::NotARepository(path.to_path_buf()));
        }

        let root = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(Self::new(root, git_path))
    }

    /// Returns the working tree root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the git executable used for every command.
    pub fn git_path(&self) -> &Path {
        &self.git_path
    }

    /// Checks if the directory is a git repository.
    pub fn is_git_repo(&self) -> bool {
        self.root.join(".git").exists()
    }

    /// Initializes a new repository with `main` as initial branch.
    pub fn init(&self) -> Result<()> {
        let output = self.run_git(&["init", "--initial-branch=main"])?;
        if output.status.success() {
            Ok(())
        } else {
            Err(GitError::Operation(format_git_error(&output)))
        }
    }

    /// Gets the current branch name, `None` when HEAD is detached or unborn.
    pub fn current_branch(&self) -> Result<Option<String>> {
        let output = self.run_git(&["symbolic-ref", "--quiet", "--short", "HEAD"])?;
        if !output.status.success() {
            return Ok(None);
        }

        let branch = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok((!branch.is_empty()).then_some(branch))
    }

    /// Checks if a local branch exists.
    pub fn branch_exists(&self, name: &str) -> Result<bool> {
        let reference = format!("refs/heads/{}", name);
        let output = self.run_git(&["rev-parse", "--verify", "--quiet", &reference])?;
        Ok(output.status.success())
    }

    /// Checks out a branch.
    pub fn checkout(&self, branch: &str) -> Result<()> {
        let output = self.run_git(&["checkout", branch])?;
        if output.status.success() {
            debug!("Checked out {}", branch);
            Ok(())
        } else {
            Err(GitError::Operation(format_git_error(&output)))
        }
    }

    /// Creates a new branch at HEAD and optionally checks it out.
    pub fn create_branch(&self, name: &str, checkout: bool) -> Result<()> {
        let output = if checkout {
            self.run_git(&["checkout", "-b", name])?
        } else {
            self.run_git(&["branch", name])?
        };

        if !output.status.success() {
            return Err(GitError::Operation(format_git_error(&output)));
        }

        debug!("Created branch {}", name);
        Ok(())
    }

    /// Returns the `limit` most recent commits reachable from HEAD.
    pub fn log(&self, limit: usize) -> Result<Vec<CommitInfo>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let count = format!("--max-count={}", limit);
        let format = log_format();
        let output = self.run_git(&["log", &count, &format])?;

        if !output.status.success() {
            let has_head = self
                .run_git(&["rev-parse", "--verify", "--quiet", "HEAD"])?
                .status
                .success();
            // Unborn branch: nothing to show.
            if !has_head {
                return Ok(Vec::new());
            }
            return Err(GitError::Operation(format_git_error(&output)));
        }

        Ok(parse_log(&String::from_utf8_lossy(&output.stdout)))
    }

    /// Runs a git command in the repository directory.
    fn run_git(&self, args: &[&str]) -> Result<Output> {
        Command::new(&self.git_path)
            .current_dir(&self.root)
            .args(args)
            .output()
            .map_err(GitError::Spawn)
    }
}

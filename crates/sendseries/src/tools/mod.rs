//! Helper programs run on behalf of a series: git, checkpatch,
//! get_maintainer and the browser.

pub mod args;
pub mod patches;
pub mod send;

use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::Instrument;

use crate::error::ToolError;
use crate::git::parse::format_git_error;

pub use patches::{format_patch, PatchSet};
pub use send::{send_email_command, stream_output};

/// Fails with [`ToolError::Missing`] unless `path` exists.
pub fn require(name: &'static str, path: &Path) -> Result<(), ToolError> {
    if path.exists() {
        Ok(())
    } else {
        Err(ToolError::Missing {
            name,
            path: path.to_path_buf(),
        })
    }
}

fn program_name(program: &OsStr) -> String {
    program.to_string_lossy().into_owned()
}

/// Runs a program attached to the terminal and waits for it.
pub async fn run_interactive<I, S>(program: &OsStr, args: I, cwd: &Path) -> Result<(), ToolError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let name = program_name(program);
    let span = tracing::info_span!("tool", program = %name);

    async {
        let status = Command::new(program)
            .current_dir(cwd)
            .args(args)
            .status()
            .await
            .map_err(|source| ToolError::Spawn {
                program: name.clone(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(ToolError::Failed {
                program: name.clone(),
                message: format!(
                    "Command failed with exit code {}",
                    status.code().unwrap_or(-1)
                ),
            })
        }
    }
    .instrument(span)
    .await
}

/// Runs a program and returns its standard output.
pub async fn run_captured<I, S>(program: &OsStr, args: I, cwd: &Path) -> Result<String, ToolError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let name = program_name(program);
    let span = tracing::info_span!("tool", program = %name);

    async {
        let output = Command::new(program)
            .current_dir(cwd)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| ToolError::Spawn {
                program: name.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ToolError::Failed {
                program: name.clone(),
                message: format_git_error(&output),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
    .instrument(span)
    .await
}

/// Opens `url` with a browser command such as `firefox --new-tab`.
pub async fn open_url(browser_command: &str, url: &str, cwd: &Path) -> Result<(), ToolError> {
    let mut parts = browser_command.split_whitespace();
    let Some(program) = parts.next() else {
        return Err(ToolError::Failed {
            program: String::new(),
            message: "empty browser command".to_string(),
        });
    };
    let args: Vec<&str> = parts.chain(std::iter::once(url)).collect();
    run_interactive(OsStr::new(program), args, cwd).await
}

//! Streaming `git send-email` output while it runs.

use std::ffi::OsStr;
use std::path::PathBuf;
use std::process::Stdio;

use log::warn;
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::process::Command;

use super::args::send_email_args;
use crate::error::ToolError;
use crate::git::GitRepository;
use crate::series::Series;

const CHUNK_SIZE: usize = 8 * 1024;

/// Runs `command` with its stdout piped. Every chunk is copied to `mirror`
/// and then handed to `on_chunk`. The first error returned by `on_chunk`
/// is reported once the program exits; the output keeps being mirrored
/// until then.
pub async fn stream_output<W, F, E>(
    mut command: Command,
    mirror: &mut W,
    mut on_chunk: F,
) -> Result<(), E>
where
    W: AsyncWrite + Unpin,
    F: FnMut(&[u8]) -> Result<(), E>,
    E: From<ToolError>,
{
    let program = command
        .as_std()
        .get_program()
        .to_string_lossy()
        .into_owned();
    let stream_error = |source| ToolError::Stream {
        program: program.clone(),
        source,
    };

    let mut child = command
        .stdout(Stdio::piped())
        .spawn()
        .map_err(|source| ToolError::Spawn {
            program: program.clone(),
            source,
        })?;

    let mut failure = None;
    if let Some(mut stdout) = child.stdout.take() {
        let mut buf = vec![0u8; CHUNK_SIZE];
        loop {
            let n = stdout.read(&mut buf).await.map_err(stream_error)?;
            if n == 0 {
                break;
            }
            let chunk = &buf[..n];
            mirror.write_all(chunk).await.map_err(stream_error)?;
            mirror.flush().await.map_err(stream_error)?;

            if failure.is_none() {
                if let Err(e) = on_chunk(chunk) {
                    warn!("Failed to handle output of {}, still mirroring", program);
                    failure = Some(e);
                }
            }
        }
    }

    let status = child.wait().await.map_err(stream_error)?;

    if let Some(e) = failure {
        return Err(e);
    }
    if !status.success() {
        return Err(ToolError::Failed {
            program,
            message: format!(
                "Command failed with exit code {}",
                status.code().unwrap_or(-1)
            ),
        }
        .into());
    }
    Ok(())
}

/// Runs `program` on a pseudo-terminal through `script`, so that programs
/// which block-buffer a piped stdout (perl among them) still write every
/// line as it is produced. The terminal's input is forwarded by `script`.
#[cfg(target_os = "linux")]
pub fn pty_command<I, S>(program: &OsStr, args: I) -> Command
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut words = vec![program.to_string_lossy().into_owned()];
    words.extend(
        args.into_iter()
            .map(|arg| arg.as_ref().to_string_lossy().into_owned()),
    );

    let mut command = Command::new("script");
    command
        .args(["-q", "-f", "-e", "-c"])
        .arg(shell_words::join(&words))
        .arg("/dev/null");
    command
}

/// Runs `program` on a pseudo-terminal through `script`, so that programs
/// which block-buffer a piped stdout still write every line as it is
/// produced.
#[cfg(all(unix, not(target_os = "linux")))]
pub fn pty_command<I, S>(program: &OsStr, args: I) -> Command
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new("script");
    command
        .args(["-q", "-F", "/dev/null"])
        .arg(program)
        .args(args);
    command
}

#[cfg(not(unix))]
pub fn pty_command<I, S>(program: &OsStr, args: I) -> Command
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(program);
    command.args(args);
    command
}

/// Builds the `git send-email` invocation for `patches`, run on a
/// pseudo-terminal. The terminal stays attached to stdin and stderr so
/// prompts reach the user; stdout is left for [`stream_output`].
pub fn send_email_command(repo: &GitRepository, series: &Series, patches: &[PathBuf]) -> Command {
    let args = send_email_args(series)
        .into_iter()
        .map(Into::into)
        .chain(patches.iter().map(|p| p.as_os_str().to_os_string()))
        .collect::<Vec<std::ffi::OsString>>();

    let mut command = pty_command(repo.git_path().as_os_str(), &args);
    command
        .current_dir(repo.root())
        .stdin(Stdio::inherit())
        .stderr(Stdio::inherit());
    command
}

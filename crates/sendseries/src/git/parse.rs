//! Git output parsing helpers.

use std::process::Output;

use super::types::CommitInfo;

/// Field separator used in the log format.
pub const FIELD_SEP: char = '\x1f';
/// Record separator used in the log format.
pub const RECORD_SEP: char = '\x1e';

/// `--format` argument producing records understood by [`parse_log`].
pub fn log_format() -> String {
    format!("--format=%H{0}%an{0}%ae{0}%B{1}", FIELD_SEP, RECORD_SEP)
}

/// Formats a git error with both stdout and stderr for better debugging.
pub fn format_git_error(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();

    match (stderr.is_empty(), stdout.is_empty()) {
        (true, true) => format!(
            "Command failed with exit code {}",
            output.status.code().unwrap_or(-1)
        ),
        (true, false) => stdout,
        (false, true) => stderr,
        (false, false) => format!("{}\n{}", stderr, stdout),
    }
}

/// Parses `git log` output produced with [`log_format`].
pub fn parse_log(output: &str) -> Vec<CommitInfo> {
    output
        .split(RECORD_SEP)
        .filter_map(|record| {
            let record = record.trim_start_matches('\n');
            if record.trim().is_empty() {
                return None;
            }
            let mut fields = record.splitn(4, FIELD_SEP);
            let hash = fields.next()?.trim().to_string();
            let author_name = fields.next()?.to_string();
            let author_email = fields.next()?.to_string();
            let message = fields.next()?.trim_end().to_string();
            Some(CommitInfo {
                hash,
                message,
                author_name,
                author_email,
            })
        })
        .collect()
}

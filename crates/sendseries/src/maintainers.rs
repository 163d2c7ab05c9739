//! Recipients known to a kernel-style MAINTAINERS file.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::ToolError;

static RE_RECIPIENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:M|R|L):\t(.+)$").unwrap());

static RE_ANGLE_ADDRESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(.+)>").unwrap());

/// Unique maintainer, reviewer and list entries of `content`, in file order.
pub fn parse_recipients(content: &str) -> Vec<String> {
    let mut entries: Vec<String> = Vec::new();
    for line in content.lines() {
        let Some(caps) = RE_RECIPIENT.captures(line) else {
            continue;
        };
        let entry = &caps[1];
        if !entries.iter().any(|known| known == entry) {
            entries.push(entry.to_string());
        }
    }
    entries
}

/// Reads the MAINTAINERS file at `path`.
pub fn possible_recipients(path: &Path) -> Result<Vec<String>, ToolError> {
    let content = std::fs::read_to_string(path).map_err(|source| ToolError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_recipients(&content))
}

/// Entries containing `query`, ignoring case.
pub fn search<'a>(entries: &'a [String], query: &str) -> Vec<&'a str> {
    let query = query.to_lowercase();
    entries
        .iter()
        .filter(|entry| entry.to_lowercase().contains(&query))
        .map(String::as_str)
        .collect()
}

/// Extracts the address of a `Name <address>` entry.
pub fn sanitize_maintainers_email(entry: &str) -> &str {
    RE_ANGLE_ADDRESS
        .captures(entry)
        .and_then(|caps| caps.get(1))
        .map_or(entry, |address| address.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAINTAINERS: &str = "\
NETWORKING DRIVERS
M:\tAda Lovelace <ada@example.org>
R:\tBob Reviewer <bob@example.org>
L:\tnetdev@vger.kernel.org
S:\tMaintained
F:\tdrivers/net/

NETWORKING [GENERAL]
M:\tAda Lovelace <ada@example.org>
L:\tnetdev@vger.kernel.org
M: not-a-tab@example.org
";

    #[test]
    fn test_parse_recipients_unique_in_order() {
        assert_eq!(
            parse_recipients(MAINTAINERS),
            vec![
                "Ada Lovelace <ada@example.org>",
                "Bob Reviewer <bob@example.org>",
                "netdev@vger.kernel.org",
            ]
        );
    }

    #[test]
    fn test_parse_recipients_crlf() {
        assert_eq!(
            parse_recipients("M:\tAda <ada@example.org>\r\n"),
            vec!["Ada <ada@example.org>"]
        );
    }

    #[test]
    fn test_possible_recipients_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(matches!(
            possible_recipients(&dir.path().join("MAINTAINERS")),
            Err(ToolError::ReadFile { .. })
        ));
    }

    #[test]
    fn test_search() {
        let entries = parse_recipients(MAINTAINERS);
        assert_eq!(search(&entries, "ada"), vec!["Ada Lovelace <ada@example.org>"]);
        assert_eq!(search(&entries, "EXAMPLE").len(), 2);
        assert!(search(&entries, "linus").is_empty());
    }

    #[test]
    fn test_sanitize_maintainers_email() {
        assert_eq!(sanitize_maintainers_email("Ada <ada@example.org>"), "ada@example.org");
        assert_eq!(
            sanitize_maintainers_email("netdev@vger.kernel.org"),
            "netdev@vger.kernel.org"
        );
    }
}

//! Branch names of neighbouring series versions.
//!
//! Version 1 of a series lives on a branch without suffix (`foo`), later
//! versions carry `-vN` (`foo-v2`, `foo-v3`, ...).

fn suffix(version: u32) -> String {
    if version <= 1 {
        String::new()
    } else {
        format!("-v{}", version)
    }
}

fn replace_suffix(head: &str, version: u32, new_suffix: &str) -> String {
    let current = format!("-v{}", version);
    match head.strip_suffix(current.as_str()) {
        Some(base) => format!("{}{}", base, new_suffix),
        None => format!("{}{}", head, new_suffix),
    }
}

/// Branch name for version `version + 1` of the series checked out on `head`.
pub fn next_head(head: &str, version: u32) -> String {
    replace_suffix(head, version, &format!("-v{}", version + 1))
}

/// Branch name for version `version - 1` of the series checked out on `head`.
///
/// Calling this for version 1 returns `head` unchanged; callers must not treat
/// that as an existing "v0".
pub fn previous_head(head: &str, version: u32) -> String {
    replace_suffix(head, version, &suffix(version.saturating_sub(1)))
}

//! Command lines of the helper programs.

use crate::config::Settings;
use crate::series::{RecipientKind, Series};

const COVER_SUBJECT_PLACEHOLDER: &str = "*** SUBJECT HERE ***";
const COVER_BLURB_PLACEHOLDER: &str = "*** BLURB HERE ***";

/// Name git gives the cover letter of a formatted series.
pub const COVER_LETTER_FILE: &str = "0000-cover-letter.patch";

fn head_range(head: &str, count: u32) -> String {
    format!("{}~{}..{}", head, count, head)
}

/// `git format-patch` arguments, without the output directory.
pub fn format_patch_args(series: &Series, with_cover_letter: bool, extra: &[String]) -> Vec<String> {
    let mut args = vec![
        "format-patch".to_string(),
        format!("HEAD~{}", series.nb_patches),
        format!("--subject-prefix={}", series.subject_prefix()),
    ];
    if with_cover_letter {
        args.push("--cover-letter".to_string());
    }
    args.extend(extra.iter().cloned());
    args
}

/// `git send-email` arguments, without the patch files.
pub fn send_email_args(series: &Series) -> Vec<String> {
    let mut args = vec!["send-email".to_string()];
    for (flag, emails) in [("--to", &series.tos), ("--cc", &series.ccs)] {
        args.extend(
            emails
                .iter()
                .filter(|email| !email.is_empty())
                .map(|email| format!("{}={}", flag, email)),
        );
    }
    args
}

/// get_maintainer arguments, without the patch files.
pub fn get_maintainer_args(kind: RecipientKind, settings: &Settings) -> Vec<String> {
    let mut args = vec![
        "--separator=,".to_string(),
        "--no-rolestats".to_string(),
        "--no-n".to_string(),
    ];
    let extra = match kind {
        RecipientKind::To => &settings.get_maintainer_to_args,
        RecipientKind::Cc => &settings.get_maintainer_cc_args,
    };
    args.extend(extra.iter().cloned());
    args
}

/// Splits get_maintainer output into addresses.
pub fn parse_get_maintainer(output: &str) -> Vec<String> {
    output
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

/// `git range-diff` arguments comparing `previous` with HEAD.
pub fn range_diff_args(previous_head: &str, previous_patches: u32, patches: u32) -> Vec<String> {
    vec![
        "range-diff".to_string(),
        head_range(previous_head, previous_patches),
        head_range("HEAD", patches),
    ]
}

pub fn rebase_interactive_args(patches: u32) -> Vec<String> {
    vec![
        "rebase".to_string(),
        "-i".to_string(),
        format!("HEAD~{}", patches),
    ]
}

/// Fills the placeholders git leaves in a generated cover letter.
pub fn fill_cover_letter(template: &str, title: &str, blurb: &str) -> String {
    template
        .replacen(COVER_SUBJECT_PLACEHOLDER, title, 1)
        .replacen(COVER_BLURB_PLACEHOLDER, blurb, 1)
}

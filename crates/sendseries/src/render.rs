use std::fmt::Write;

use sendseries::{Outcome, SeriesSummary, SeriesView};

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

fn recipients(out: &mut String, label: &str, emails: &[String]) {
    if emails.is_empty() {
        let _ = writeln!(out, "{}: -", label);
        return;
    }
    let _ = writeln!(out, "{}:", label);
    for (index, email) in emails.iter().enumerate() {
        let _ = writeln!(out, "  [{}] {}", index, email);
    }
}

pub fn view(view: &SeriesView) -> String {
    let mut out = String::new();
    let series = &view.series;
    let head = if view.head.is_empty() {
        "(no branch)"
    } else {
        &view.head
    };

    let _ = writeln!(out, "Branch:  {}", head);
    let _ = writeln!(out, "Subject: [{}] {}", series.subject_prefix(), series.title);
    recipients(&mut out, "To", &series.tos);
    recipients(&mut out, "Cc", &series.ccs);

    let _ = writeln!(out, "Patches ({}):", series.nb_patches);
    for (i, commit) in view.log.iter().enumerate() {
        let short = commit.hash.get(..12).unwrap_or(&commit.hash);
        let _ = writeln!(out, "  {:>2} {} {}", i + 1, short, commit.title());
    }

    let cover_lines = view.cover_letter.lines().count();
    if cover_lines == 0 {
        let _ = writeln!(out, "Cover letter: none");
    } else {
        let _ = writeln!(out, "Cover letter: {} lines", cover_lines);
    }

    if !series.previously_sent.is_empty() {
        let _ = writeln!(out, "Sent:");
        for (index, batch) in series.previously_sent.iter().enumerate() {
            let _ = writeln!(
                out,
                "  [{}] {} from {} at {}",
                index, batch.prefix, batch.head, batch.timestamp
            );
            for email in &batch.emails {
                let _ = writeln!(out, "      <{}> {}", email.message_id, email.title);
            }
        }
    }

    let _ = writeln!(
        out,
        "Previous version: {}  checkpatch: {}  get_maintainer: {}  MAINTAINERS: {}",
        yes_no(view.has_previous_version),
        yes_no(view.has_checkpatch),
        yes_no(view.has_get_maintainer),
        yes_no(view.has_maintainers),
    );
    out
}

pub fn series_list(series: &[SeriesSummary]) -> String {
    let mut out = String::new();
    for entry in series {
        let marker = if entry.current { '*' } else { ' ' };
        let _ = writeln!(out, "{} {}  {}", marker, entry.branch, entry.description);
    }
    out
}

pub fn outcome(outcome: &Outcome) -> String {
    match outcome {
        Outcome::View(series) => view(series),
        Outcome::Patches(patches) => {
            let mut out = String::new();
            for patch in patches {
                let _ = writeln!(out, "{}", patch.display());
            }
            out
        }
        Outcome::Url(url) => format!("{}\n", url),
    }
}

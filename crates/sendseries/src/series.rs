//! Per-branch series metadata and the edits applied to it.

use serde::{Deserialize, Serialize};

/// Lowest number of patches a series can hold.
pub const MIN_PATCHES: u32 = 1;
/// Highest number of patches a series can hold.
pub const MAX_PATCHES: u32 = 32;

/// One email confirmed as delivered by `git send-email`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentEmail {
    /// Subject without the bracketed prefix.
    pub title: String,
    /// Message-ID without the angle brackets.
    pub message_id: String,
}

/// Emails delivered by one send invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentBatch {
    /// Prefix and version at send time, e.g. `PATCH v2`.
    pub prefix: String,
    /// RFC 3339 timestamp of the first confirmation.
    pub timestamp: String,
    /// Branch the series was sent from.
    pub head: String,
    /// Confirmed emails in delivery order.
    #[serde(default)]
    pub emails: Vec<SentEmail>,
}

/// Which recipient list an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipientKind {
    To,
    Cc,
}

impl std::fmt::Display for RecipientKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecipientKind::To => write!(f, "to"),
            RecipientKind::Cc => write!(f, "cc"),
        }
    }
}

impl std::str::FromStr for RecipientKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "to" => Ok(RecipientKind::To),
            "cc" => Ok(RecipientKind::Cc),
            other => Err(format!("unknown recipient kind '{}', expected 'to' or 'cc'", other)),
        }
    }
}

/// Parameters remembered for one branch. The cover letter is stored separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    pub prefix: String,
    pub version: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub tos: Vec<String>,
    #[serde(default)]
    pub ccs: Vec<String>,
    pub nb_patches: u32,
    /// Send history, newest first.
    #[serde(default)]
    pub previously_sent: Vec<SentBatch>,
}

impl Series {
    /// Creates a fresh version 1 series with a single patch.
    pub fn new(prefix: impl Into<String>, tos: Vec<String>, ccs: Vec<String>) -> Self {
        let mut series = Self {
            prefix: prefix.into(),
            version: 1,
            title: String::new(),
            tos: Vec::new(),
            ccs: Vec::new(),
            nb_patches: MIN_PATCHES,
            previously_sent: Vec::new(),
        };
        for email in tos {
            series.add_email(RecipientKind::To, &email);
        }
        for email in ccs {
            series.add_email(RecipientKind::Cc, &email);
        }
        series
    }

    /// Restores invariants on a record read from storage.
    pub fn normalize(&mut self) {
        self.version = self.version.max(1);
        self.nb_patches = self.nb_patches.clamp(MIN_PATCHES, MAX_PATCHES);
        for list in [&mut self.tos, &mut self.ccs] {
            let mut seen = Vec::with_capacity(list.len());
            for email in list.drain(..) {
                let email = email.trim().to_string();
                if !email.is_empty() && !seen.contains(&email) {
                    seen.push(email);
                }
            }
            *list = seen;
        }
    }

    /// Subject prefix handed to `git format-patch`: the version is omitted for v1.
    pub fn subject_prefix(&self) -> String {
        if self.version == 1 {
            self.prefix.clone()
        } else {
            format!("{} v{}", self.prefix, self.version)
        }
    }

    /// Prefix recorded in the send history: always carries the version.
    pub fn sent_prefix(&self) -> String {
        format!("{} v{}", self.prefix, self.version)
    }

    /// One-line summary used when listing remembered series.
    pub fn summary(&self) -> String {
        format!("[{}] {}", self.sent_prefix(), self.title)
    }

    pub fn recipients(&self, kind: RecipientKind) -> &[String] {
        match kind {
            RecipientKind::To => &self.tos,
            RecipientKind::Cc => &self.ccs,
        }
    }

    fn recipients_mut(&mut self, kind: RecipientKind) -> &mut Vec<String> {
        match kind {
            RecipientKind::To => &mut self.tos,
            RecipientKind::Cc => &mut self.ccs,
        }
    }

    /// Appends a trimmed email unless it is empty or already listed.
    /// Returns whether the list changed.
    pub fn add_email(&mut self, kind: RecipientKind, email: &str) -> bool {
        let email = email.trim();
        if email.is_empty() {
            return false;
        }

        let list = self.recipients_mut(kind);
        if list.iter().any(|existing| existing == email) {
            return false;
        }
        list.push(email.to_string());
        true
    }

    /// Replaces the email at `index`, or removes it when the trimmed value is empty.
    /// Returns `None` when `index` is out of range.
    pub fn edit_email(&mut self, kind: RecipientKind, index: usize, email: &str) -> Option<()> {
        let email = email.trim();
        let list = self.recipients_mut(kind);
        if index >= list.len() {
            return None;
        }

        if email.is_empty() {
            list.remove(index);
        } else if list
            .iter()
            .enumerate()
            .any(|(i, existing)| i != index && existing == email)
        {
            // Already listed elsewhere: editing into a duplicate drops this slot.
            list.remove(index);
        } else {
            list[index] = email.to_string();
        }
        Some(())
    }

    pub fn add_patch(&mut self) {
        self.nb_patches = (self.nb_patches + 1).min(MAX_PATCHES);
    }

    pub fn remove_patch(&mut self) {
        self.nb_patches = self.nb_patches.saturating_sub(1).max(MIN_PATCHES);
    }

    /// Drops the history entry at `index`. Returns the removed batch.
    pub fn forget_sent(&mut self, index: usize) -> Option<SentBatch> {
        if index < self.previously_sent.len() {
            Some(self.previously_sent.remove(index))
        } else {
            None
        }
    }
}

/// Fields that can be copied from another remembered series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SeriesField {
    Prefix,
    Version,
    Title,
    CoverLetter,
    NbPatches,
    Ccs,
    Tos,
    SentEmails,
}

impl SeriesField {
    pub const ALL: [SeriesField; 8] = [
        SeriesField::Prefix,
        SeriesField::Version,
        SeriesField::Title,
        SeriesField::CoverLetter,
        SeriesField::NbPatches,
        SeriesField::Ccs,
        SeriesField::Tos,
        SeriesField::SentEmails,
    ];

    /// Copies this field from `source` into `target`. The cover letter lives
    /// outside [`Series`] and is handled by the caller.
    pub fn copy(self, source: &Series, target: &mut Series) {
        match self {
            SeriesField::Prefix => target.prefix = source.prefix.clone(),
            SeriesField::Version => target.version = source.version,
            SeriesField::Title => target.title = source.title.clone(),
            SeriesField::CoverLetter => {}
            SeriesField::NbPatches => target.nb_patches = source.nb_patches,
            SeriesField::Ccs => target.ccs = source.ccs.clone(),
            SeriesField::Tos => target.tos = source.tos.clone(),
            SeriesField::SentEmails => target.previously_sent = source.previously_sent.clone(),
        }
    }
}

impl std::str::FromStr for SeriesField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "prefix" => Ok(SeriesField::Prefix),
            "version" => Ok(SeriesField::Version),
            "title" => Ok(SeriesField::Title),
            "coverletter" => Ok(SeriesField::CoverLetter),
            "nbpatches" | "patches" => Ok(SeriesField::NbPatches),
            "ccs" | "cc" => Ok(SeriesField::Ccs),
            "tos" | "to" => Ok(SeriesField::Tos),
            "sentemails" | "sent" => Ok(SeriesField::SentEmails),
            other => Err(format!("unknown series field '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series() -> Series {
        Series::new("PATCH", vec![], vec![])
    }

    #[test]
    fn test_new_series_defaults() {
        let s = Series::new("RFC", vec!["a@b.c".into(), " a@b.c ".into()], vec![]);
        assert_eq!(s.version, 1);
        assert_eq!(s.nb_patches, 1);
        assert_eq!(s.tos, vec!["a@b.c"]);
        assert!(s.previously_sent.is_empty());
    }

    #[test]
    fn test_add_email_trims_and_dedups() {
        let mut s = series();
        assert!(s.add_email(RecipientKind::To, "  x@y.com "));
        assert!(!s.add_email(RecipientKind::To, "x@y.com"));
        assert!(!s.add_email(RecipientKind::To, "   "));
        assert!(s.add_email(RecipientKind::Cc, "x@y.com"));
        assert_eq!(s.tos, vec!["x@y.com"]);
        assert_eq!(s.ccs, vec!["x@y.com"]);
    }

    #[test]
    fn test_edit_email_replaces_trimmed() {
        let mut s = series();
        s.add_email(RecipientKind::To, "old@y.com");
        s.edit_email(RecipientKind::To, 0, "  x@y.com  ").unwrap();
        assert_eq!(s.tos, vec!["x@y.com"]);
    }

    #[test]
    fn test_edit_email_empty_removes() {
        let mut s = series();
        s.add_email(RecipientKind::Cc, "a@y.com");
        s.add_email(RecipientKind::Cc, "b@y.com");
        s.edit_email(RecipientKind::Cc, 0, "").unwrap();
        assert_eq!(s.ccs, vec!["b@y.com"]);
    }

    #[test]
    fn test_edit_email_out_of_range() {
        let mut s = series();
        assert!(s.edit_email(RecipientKind::To, 0, "a@b.c").is_none());
    }

    #[test]
    fn test_edit_email_into_duplicate_drops_slot() {
        let mut s = series();
        s.add_email(RecipientKind::To, "a@y.com");
        s.add_email(RecipientKind::To, "b@y.com");
        s.edit_email(RecipientKind::To, 1, "a@y.com").unwrap();
        assert_eq!(s.tos, vec!["a@y.com"]);
    }

    #[test]
    fn test_patch_count_is_clamped() {
        let mut s = series();
        s.remove_patch();
        assert_eq!(s.nb_patches, MIN_PATCHES);
        for _ in 0..40 {
            s.add_patch();
        }
        assert_eq!(s.nb_patches, MAX_PATCHES);
    }

    #[test]
    fn test_subject_prefix_omits_v1() {
        let mut s = series();
        assert_eq!(s.subject_prefix(), "PATCH");
        assert_eq!(s.sent_prefix(), "PATCH v1");
        s.version = 3;
        assert_eq!(s.subject_prefix(), "PATCH v3");
    }

    #[test]
    fn test_deserialize_legacy_record() {
        let json = r#"{"prefix":"PATCH","version":2,"title":"t","tos":[],"ccs":[],"nbPatches":40}"#;
        let mut s: Series = serde_json::from_str(json).unwrap();
        s.normalize();
        assert!(s.previously_sent.is_empty());
        assert_eq!(s.nb_patches, MAX_PATCHES);
    }

    #[test]
    fn test_serialized_field_names() {
        let mut s = series();
        s.previously_sent.push(SentBatch {
            prefix: "PATCH v1".into(),
            timestamp: "2024-01-01T00:00:00.000Z".into(),
            head: "main".into(),
            emails: vec![SentEmail {
                title: "t".into(),
                message_id: "id@host".into(),
            }],
        });
        let json = serde_json::to_string(&s).unwrap();
        assert!(json.contains("\"nbPatches\":1"));
        assert!(json.contains("\"previouslySent\""));
        assert!(json.contains("\"messageId\":\"id@host\""));
    }

    #[test]
    fn test_copy_fields() {
        let mut source = series();
        source.version = 4;
        source.add_email(RecipientKind::Cc, "list@vger.kernel.org");
        let mut target = series();
        SeriesField::Version.copy(&source, &mut target);
        SeriesField::Ccs.copy(&source, &mut target);
        assert_eq!(target.version, 4);
        assert_eq!(target.ccs, vec!["list@vger.kernel.org"]);
        assert_eq!("cover-letter".parse::<SeriesField>(), Ok(SeriesField::CoverLetter));
    }
}

//! Requests a view sends to the controller.

use serde::{Deserialize, Serialize};

use crate::series::{RecipientKind, SeriesField};

/// One user action on the current series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Command {
    SetPrefix {
        prefix: String,
    },
    SetVersion {
        version: u32,
    },
    SetTitle {
        title: String,
    },
    AddEmail {
        kind: RecipientKind,
        email: String,
    },
    /// An empty `email` removes the entry.
    EditEmail {
        kind: RecipientKind,
        index: usize,
        email: String,
    },
    /// Adds a MAINTAINERS entry such as `Name <address>`.
    AddPerson {
        kind: RecipientKind,
        entry: String,
    },
    GetMaintainers {
        kind: RecipientKind,
    },
    AddPatch,
    RemovePatch,
    Bump,
    Send,
    Checkpatch,
    /// Formats the series and keeps the files. `commit` counts from HEAD,
    /// starting at 1.
    Inspect {
        #[serde(default)]
        commit: Option<usize>,
    },
    RangeDiff,
    RebaseInteractive,
    ForgetSentSeries {
        index: usize,
    },
    OpenEmail {
        message_id: String,
    },
    ChangeHead {
        branch: String,
    },
    ForgetSeries {
        branch: String,
    },
    CopyFromSeries {
        branch: String,
        fields: Vec<SeriesField>,
    },
    SetCoverLetter {
        cover_letter: String,
    },
    GetContent,
}

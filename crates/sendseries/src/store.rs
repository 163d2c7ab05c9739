//! Series and cover letters keyed by branch name.

use log::debug;

use crate::config::Settings;
use crate::db::KeyValueStore;
use crate::error::{Result, SeriesError};
use crate::series::Series;

const SERIES_KEY_PREFIX: &str = "git-send-email:series:";
const COVER_LETTER_KEY_PREFIX: &str = "git-send-email:cover-letter:";

/// Values given to a branch seen for the first time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesDefaults {
    pub prefix: String,
    pub tos: Vec<String>,
    pub ccs: Vec<String>,
}

impl From<&Settings> for SeriesDefaults {
    fn from(settings: &Settings) -> Self {
        Self {
            prefix: settings.default_subject_prefix.clone(),
            tos: settings.default_tos.clone(),
            ccs: settings.default_ccs.clone(),
        }
    }
}

impl SeriesDefaults {
    pub fn series(&self) -> Series {
        Series::new(self.prefix.clone(), self.tos.clone(), self.ccs.clone())
    }
}

/// Typed access to the per-branch records of one workspace. The empty head
/// (no branch checked out) is never written.
#[derive(Debug, Clone)]
pub struct SeriesStore<S> {
    state: S,
    defaults: SeriesDefaults,
}

impl<S: KeyValueStore> SeriesStore<S> {
    pub fn new(state: S, defaults: SeriesDefaults) -> Self {
        Self { state, defaults }
    }

    pub fn defaults(&self) -> &SeriesDefaults {
        &self.defaults
    }

    /// Returns the series remembered for `head`, or a default one.
    pub fn get_series(&self, head: &str) -> Result<Series> {
        if head.is_empty() {
            return Ok(self.defaults.series());
        }

        let Some(raw) = self.state.get(&series_key(head))? else {
            return Ok(self.defaults.series());
        };

        let mut series: Series =
            serde_json::from_str(&raw).map_err(|source| SeriesError::Decode {
                head: head.to_string(),
                source,
            })?;
        series.normalize();
        Ok(series)
    }

    pub fn has_series(&self, head: &str) -> Result<bool> {
        if head.is_empty() {
            return Ok(false);
        }
        Ok(self.state.get(&series_key(head))?.is_some())
    }

    pub fn save_series(&self, head: &str, series: &Series) -> Result<()> {
        if head.is_empty() {
            return Ok(());
        }

        let raw = serde_json::to_string(series).map_err(|source| SeriesError::Encode {
            head: head.to_string(),
            source,
        })?;
        self.state.set(&series_key(head), &raw)?;
        debug!("Saved series for {}", head);
        Ok(())
    }

    /// Forgets the series of `head`. Its cover letter is kept.
    pub fn forget_series(&self, head: &str) -> Result<bool> {
        if head.is_empty() {
            return Ok(false);
        }
        Ok(self.state.delete(&series_key(head))?)
    }

    /// Branches with a remembered series, sorted by name.
    pub fn all_branches(&self) -> Result<Vec<String>> {
        Ok(self
            .state
            .list_keys()?
            .into_iter()
            .filter_map(|key| key.strip_prefix(SERIES_KEY_PREFIX).map(str::to_string))
            .collect())
    }

    pub fn get_cover_letter(&self, head: &str) -> Result<String> {
        if head.is_empty() {
            return Ok(String::new());
        }
        Ok(self
            .state
            .get(&cover_letter_key(head))?
            .unwrap_or_default())
    }

    pub fn save_cover_letter(&self, head: &str, cover_letter: &str) -> Result<()> {
        if head.is_empty() {
            return Ok(());
        }
        self.state.set(&cover_letter_key(head), cover_letter)?;
        Ok(())
    }
}

fn series_key(head: &str) -> String {
    format!("{}{}", SERIES_KEY_PREFIX, head)
}

fn cover_letter_key(head: &str) -> String {
    format!("{}{}", COVER_LETTER_KEY_PREFIX, head)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, WorkspaceState};
    use crate::series::RecipientKind;

    fn store() -> SeriesStore<WorkspaceState> {
        let state = WorkspaceState::new(Database::open_in_memory().unwrap(), "/repo");
        let defaults = SeriesDefaults {
            prefix: "PATCH".into(),
            tos: vec!["maint@example.org".into()],
            ccs: vec![],
        };
        SeriesStore::new(state, defaults)
    }

    #[test]
    fn test_unknown_branch_gets_defaults() {
        let store = store();
        let series = store.get_series("topic").unwrap();
        assert_eq!(series.prefix, "PATCH");
        assert_eq!(series.tos, vec!["maint@example.org"]);
        assert!(!store.has_series("topic").unwrap());
    }

    #[test]
    fn test_save_and_reload() {
        let store = store();
        let mut series = store.get_series("topic").unwrap();
        series.version = 3;
        series.add_email(RecipientKind::Cc, "list@example.org");
        store.save_series("topic", &series).unwrap();

        assert!(store.has_series("topic").unwrap());
        assert_eq!(store.get_series("topic").unwrap(), series);
        assert_eq!(store.all_branches().unwrap(), vec!["topic"]);
    }

    #[test]
    fn test_empty_head_is_never_persisted() {
        let store = store();
        let mut series = store.get_series("").unwrap();
        series.title = "ignored".into();
        store.save_series("", &series).unwrap();
        store.save_cover_letter("", "ignored").unwrap();

        assert!(store.all_branches().unwrap().is_empty());
        assert_eq!(store.get_series("").unwrap().title, "");
        assert_eq!(store.get_cover_letter("").unwrap(), "");
    }

    #[test]
    fn test_forget_series_keeps_cover_letter() {
        let store = store();
        store.save_series("a", &store.get_series("a").unwrap()).unwrap();
        store.save_cover_letter("a", "hello").unwrap();

        assert!(store.forget_series("a").unwrap());
        assert!(store.all_branches().unwrap().is_empty());
        assert_eq!(store.get_cover_letter("a").unwrap(), "hello");
    }

    #[test]
    fn test_reads_records_without_history() {
        let state = WorkspaceState::new(Database::open_in_memory().unwrap(), "/repo");
        state
            .set(
                "git-send-email:series:old",
                r#"{"prefix":"PATCH","version":2,"title":"","tos":[],"ccs":[],"nbPatches":3}"#,
            )
            .unwrap();
        let store = SeriesStore::new(state, SeriesDefaults::from(&Settings::default()));
        let series = store.get_series("old").unwrap();
        assert_eq!(series.version, 2);
        assert_eq!(series.nb_patches, 3);
        assert!(series.previously_sent.is_empty());
    }

    #[test]
    fn test_corrupt_record_is_an_error() {
        let state = WorkspaceState::new(Database::open_in_memory().unwrap(), "/repo");
        state.set("git-send-email:series:bad", "{not json").unwrap();
        let store = SeriesStore::new(state, SeriesDefaults::from(&Settings::default()));
        assert!(matches!(
            store.get_series("bad"),
            Err(SeriesError::Decode { .. })
        ));
    }
}

pub mod broadcast;
pub mod command;
pub mod config;
pub mod controller;
pub mod db;
pub mod error;
pub mod git;
pub mod logging;
pub mod maintainers;
pub mod naming;
pub mod scraper;
pub mod series;
pub mod store;
pub mod tools;
pub mod view;

pub use broadcast::ViewBroadcaster;
pub use command::Command;
pub use config::{load_settings, load_settings_or_default, Settings};
pub use controller::SeriesController;
pub use db::{Database, DatabaseError, KeyValueStore, WorkspaceState};
pub use error::{ConfigError, Result, SeriesError, ToolError};
pub use git::{CommitInfo, GitError, GitRepository};
pub use scraper::SendScraper;
pub use series::{RecipientKind, SentBatch, SentEmail, Series, SeriesField};
pub use store::{SeriesDefaults, SeriesStore};
pub use view::{Outcome, SeriesSummary, SeriesView};

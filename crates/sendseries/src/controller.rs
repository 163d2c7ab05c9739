//! Owns the current series and applies commands to it.

use std::ffi::OsString;
use std::path::PathBuf;

use log::{debug, info, warn};
use tracing::Instrument;

use crate::broadcast::ViewBroadcaster;
use crate::command::Command;
use crate::config::Settings;
use crate::db::KeyValueStore;
use crate::error::{Result, SeriesError};
use crate::git::GitRepository;
use crate::maintainers;
use crate::naming::{next_head, previous_head};
use crate::scraper::SendScraper;
use crate::series::{RecipientKind, Series, SeriesField};
use crate::store::SeriesStore;
use crate::tools::{self, args, PatchSet};
use crate::view::{Outcome, SeriesSummary, SeriesView};

/// Series state of one workspace.
///
/// Every mutation is persisted under the current head and followed by a
/// fresh [`SeriesView`] on the broadcaster. Without an attached repository
/// the head is empty and nothing is persisted.
#[derive(Debug)]
pub struct SeriesController<S> {
    store: SeriesStore<S>,
    settings: Settings,
    broadcaster: ViewBroadcaster,
    repo: Option<GitRepository>,
    head: String,
    series: Series,
    cover_letter: String,
}

impl<S: KeyValueStore> SeriesController<S> {
    pub fn new(store: SeriesStore<S>, settings: Settings, broadcaster: ViewBroadcaster) -> Self {
        let series = store.defaults().series();
        Self {
            store,
            settings,
            broadcaster,
            repo: None,
            head: String::new(),
            series,
            cover_letter: String::new(),
        }
    }

    pub fn head(&self) -> &str {
        &self.head
    }

    pub fn series(&self) -> &Series {
        &self.series
    }

    pub fn cover_letter(&self) -> &str {
        &self.cover_letter
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &SeriesStore<S> {
        &self.store
    }

    pub fn repo(&self) -> Option<&GitRepository> {
        self.repo.as_ref()
    }

    pub fn broadcaster(&self) -> &ViewBroadcaster {
        &self.broadcaster
    }

    /// Starts following `repo` and loads the series of its current branch.
    pub fn attach(&mut self, repo: GitRepository) -> Result<()> {
        debug!("Attached to {}", repo.root().display());
        self.repo = Some(repo);
        self.reload()
    }

    /// Stops following the repository.
    pub fn detach(&mut self) {
        if self.repo.take().is_some() {
            info!("Detached from repository");
        }
        self.head.clear();
        self.series = self.store.defaults().series();
        self.cover_letter.clear();
    }

    /// Re-reads the current branch and its remembered series.
    pub fn reload(&mut self) -> Result<()> {
        self.head = match &self.repo {
            Some(repo) => repo.current_branch()?.unwrap_or_default(),
            None => String::new(),
        };
        self.series = self.store.get_series(&self.head)?;
        self.cover_letter = self.store.get_cover_letter(&self.head)?;
        debug!("Loaded series for '{}'", self.head);
        self.publish()
    }

    pub fn view(&self) -> Result<SeriesView> {
        build_view(
            self.repo.as_ref(),
            &self.settings,
            &self.store,
            &self.head,
            &self.series,
            &self.cover_letter,
        )
    }

    fn publish(&self) -> Result<()> {
        self.broadcaster.publish(self.view()?);
        Ok(())
    }

    fn on_series_changed(&mut self) -> Result<()> {
        self.store.save_series(&self.head, &self.series)?;
        self.publish()
    }

    fn on_cover_letter_changed(&mut self) -> Result<()> {
        self.store.save_cover_letter(&self.head, &self.cover_letter)?;
        self.publish()
    }

    fn require_repo(&self) -> Result<&GitRepository> {
        self.repo.as_ref().ok_or(SeriesError::NotAttached)
    }

    fn require_head(&self) -> Result<&str> {
        if self.head.is_empty() {
            Err(SeriesError::NoHead)
        } else {
            Ok(&self.head)
        }
    }

    /// Applies one command and returns what the caller should show.
    pub async fn handle(&mut self, command: Command) -> Result<Outcome> {
        debug!("Handling {:?}", command);
        match command {
            Command::SetPrefix { prefix } => self.set_prefix(prefix)?,
            Command::SetVersion { version } => self.set_version(version)?,
            Command::SetTitle { title } => self.set_title(title)?,
            Command::AddEmail { kind, email } => self.add_email(kind, &email)?,
            Command::EditEmail { kind, index, email } => self.edit_email(kind, index, &email)?,
            Command::AddPerson { kind, entry } => self.add_person(kind, &entry)?,
            Command::GetMaintainers { kind } => self.get_maintainers(kind).await?,
            Command::AddPatch => self.add_patch()?,
            Command::RemovePatch => self.remove_patch()?,
            Command::Bump => self.bump()?,
            Command::Send => self.send().await?,
            Command::Checkpatch => self.checkpatch().await?,
            Command::Inspect { commit } => return Ok(Outcome::Patches(self.inspect(commit).await?)),
            Command::RangeDiff => self.range_diff().await?,
            Command::RebaseInteractive => self.rebase_interactive().await?,
            Command::ForgetSentSeries { index } => self.forget_sent_series(index)?,
            Command::OpenEmail { message_id } => {
                return Ok(Outcome::Url(self.open_email(&message_id).await?))
            }
            Command::ChangeHead { branch } => self.change_head(&branch)?,
            Command::ForgetSeries { branch } => self.forget_series(&branch)?,
            Command::CopyFromSeries { branch, fields } => self.copy_from_series(&branch, &fields)?,
            Command::SetCoverLetter { cover_letter } => self.set_cover_letter(cover_letter)?,
            Command::GetContent => {}
        }
        Ok(Outcome::View(self.view()?))
    }

    pub fn set_prefix(&mut self, prefix: String) -> Result<()> {
        self.series.prefix = prefix;
        self.on_series_changed()
    }

    pub fn set_version(&mut self, version: u32) -> Result<()> {
        if version == 0 {
            return Err(SeriesError::InvalidVersion(version));
        }
        self.series.version = version;
        self.on_series_changed()
    }

    pub fn set_title(&mut self, title: String) -> Result<()> {
        self.series.title = title;
        self.on_series_changed()
    }

    pub fn set_cover_letter(&mut self, cover_letter: String) -> Result<()> {
        self.cover_letter = cover_letter;
        self.on_cover_letter_changed()
    }

    pub fn add_email(&mut self, kind: RecipientKind, email: &str) -> Result<()> {
        if self.series.add_email(kind, email) {
            self.on_series_changed()?;
        }
        Ok(())
    }

    pub fn edit_email(&mut self, kind: RecipientKind, index: usize, email: &str) -> Result<()> {
        self.series
            .edit_email(kind, index, email)
            .ok_or(SeriesError::RecipientIndex { kind, index })?;
        self.on_series_changed()
    }

    pub fn add_person(&mut self, kind: RecipientKind, entry: &str) -> Result<()> {
        self.add_email(kind, maintainers::sanitize_maintainers_email(entry))
    }

    pub fn add_patch(&mut self) -> Result<()> {
        self.series.add_patch();
        self.on_series_changed()
    }

    pub fn remove_patch(&mut self) -> Result<()> {
        self.series.remove_patch();
        self.on_series_changed()
    }

    pub fn forget_sent_series(&mut self, index: usize) -> Result<()> {
        self.series
            .forget_sent(index)
            .ok_or(SeriesError::SentIndex(index))?;
        self.on_series_changed()
    }

    /// Entries of the workspace MAINTAINERS file matching `query`.
    pub fn possible_recipients(&self, query: &str) -> Result<Vec<String>> {
        let repo = self.require_repo()?;
        let path = self.settings.maintainers(repo.root());
        tools::require("MAINTAINERS", &path)?;

        let entries = maintainers::possible_recipients(&path)?;
        Ok(maintainers::search(&entries, query)
            .into_iter()
            .map(str::to_string)
            .collect())
    }

    /// Whether the previous version of this series is both remembered and
    /// still has its branch.
    pub fn has_previous_version(&self) -> Result<bool> {
        has_previous_version(self.repo.as_ref(), &self.store, &self.head, &self.series)
    }

    pub fn list_series(&self) -> Result<Vec<SeriesSummary>> {
        self.store
            .all_branches()?
            .into_iter()
            .map(|branch| {
                let series = self.store.get_series(&branch)?;
                Ok(SeriesSummary {
                    current: branch == self.head,
                    description: series.summary(),
                    branch,
                })
            })
            .collect()
    }

    pub fn change_head(&mut self, branch: &str) -> Result<()> {
        self.require_repo()?.checkout(branch)?;
        self.reload()
    }

    pub fn forget_series(&mut self, branch: &str) -> Result<()> {
        if self.store.forget_series(branch)? {
            info!("Forgot series of {}", branch);
        }
        if branch == self.head {
            self.series = self.store.get_series(&self.head)?;
        }
        self.publish()
    }

    pub fn copy_from_series(&mut self, branch: &str, fields: &[SeriesField]) -> Result<()> {
        if fields.is_empty() {
            return Ok(());
        }

        let source = self.store.get_series(branch)?;
        for field in fields {
            match field {
                SeriesField::CoverLetter => {
                    self.cover_letter = self.store.get_cover_letter(branch)?;
                    self.store.save_cover_letter(&self.head, &self.cover_letter)?;
                }
                field => field.copy(&source, &mut self.series),
            }
        }
        self.on_series_changed()
    }

    /// Copies the series to the branch of its next version and checks that
    /// branch out.
    pub fn bump(&mut self) -> Result<()> {
        let repo = self.require_repo()?;
        let head = self.require_head()?;
        let new_head = next_head(head, self.series.version);

        if repo.branch_exists(&new_head)? {
            return Err(SeriesError::BranchExists(new_head));
        }

        repo.create_branch(&new_head, true)?;

        let mut series = self.series.clone();
        series.version += 1;
        self.store.save_cover_letter(&new_head, &self.cover_letter)?;
        self.store.save_series(&new_head, &series)?;
        info!("Bumped {} to {}", self.head, new_head);

        self.reload()
    }

    async fn format_patch(&self) -> Result<PatchSet> {
        let repo = self.require_repo()?;
        Ok(tools::format_patch(
            repo,
            &self.series,
            &self.cover_letter,
            &self.settings.format_patch_args,
        )
        .await?)
    }

    /// Formats the series and leaves the patches on disk. With `commit`,
    /// only the patch of that commit is returned, 1 being HEAD.
    pub async fn inspect(&self, commit: Option<usize>) -> Result<Vec<PathBuf>> {
        let patches = self.format_patch().await?.keep();
        let Some(commit) = commit else {
            return Ok(patches);
        };

        let available = patches.len();
        if commit == 0 || commit > available {
            return Err(SeriesError::PatchIndex { commit, available });
        }
        Ok(vec![patches[available - commit].clone()])
    }

    pub async fn checkpatch(&self) -> Result<()> {
        let repo = self.require_repo()?;
        let script = self.settings.checkpatch(repo.root());
        tools::require("checkpatch", &script)?;

        let patches = self.format_patch().await?;
        tools::run_interactive(script.as_os_str(), patches.patches(), repo.root()).await?;
        Ok(())
    }

    /// Fills recipients of `kind` from get_maintainer.
    pub async fn get_maintainers(&mut self, kind: RecipientKind) -> Result<()> {
        let repo = self.require_repo()?;
        let script = self.settings.get_maintainer(repo.root());
        tools::require("get_maintainer", &script)?;

        let patches = self.format_patch().await?;
        let mut cli = args::get_maintainer_args(kind, &self.settings)
            .into_iter()
            .map(OsString::from)
            .collect::<Vec<_>>();
        cli.extend(patches.patches().iter().map(Into::into));

        let output = tools::run_captured(script.as_os_str(), cli, repo.root()).await?;
        let found = args::parse_get_maintainer(&output);
        info!("get_maintainer suggested {} {} recipients", found.len(), kind);

        for email in &found {
            self.series.add_email(kind, email);
        }
        self.on_series_changed()
    }

    pub async fn range_diff(&self) -> Result<()> {
        let repo = self.require_repo()?;
        let previous = previous_head(&self.head, self.series.version);
        if !self.has_previous_version()? {
            return Err(SeriesError::NoPreviousVersion(previous));
        }

        let previous_series = self.store.get_series(&previous)?;
        let cli = args::range_diff_args(
            &previous,
            previous_series.nb_patches,
            self.series.nb_patches,
        );
        tools::run_interactive(repo.git_path().as_os_str(), cli, repo.root()).await?;
        Ok(())
    }

    pub async fn rebase_interactive(&mut self) -> Result<()> {
        let repo = self.require_repo()?;
        let cli = args::rebase_interactive_args(self.series.nb_patches);
        tools::run_interactive(repo.git_path().as_os_str(), cli, repo.root()).await?;
        self.reload()
    }

    /// Returns the archive link of a sent email and opens it when a browser
    /// is configured.
    pub async fn open_email(&self, message_id: &str) -> Result<String> {
        let url = self.settings.archive_url(message_id);
        if let Some(browser) = &self.settings.browser_command {
            let cwd = match &self.repo {
                Some(repo) => repo.root().to_path_buf(),
                None => std::env::temp_dir(),
            };
            tools::open_url(browser, &url, &cwd).await?;
        }
        Ok(url)
    }

    /// Sends the series, recording every confirmed email as it is reported.
    pub async fn send(&mut self) -> Result<()> {
        let patches = self.format_patch().await?;
        let repo = self.repo.as_ref().ok_or(SeriesError::NotAttached)?;
        let command = tools::send_email_command(repo, &self.series, patches.patches());

        let mut scraper = SendScraper::new();
        let span = tracing::info_span!("send", session = %scraper.session_id(), head = %self.head);
        info!(
            "[{}] Sending {} patches of {}",
            scraper.session_id(),
            patches.len(),
            self.series.summary()
        );

        let head = self.head.clone();
        let store = &self.store;
        let settings = &self.settings;
        let broadcaster = &self.broadcaster;
        let cover_letter = &self.cover_letter;
        let series = &mut self.series;
        let mut stdout = tokio::io::stdout();

        let result = tools::stream_output(command, &mut stdout, |chunk: &[u8]| -> Result<()> {
            if scraper.process(chunk, series, &head) == 0 {
                return Ok(());
            }
            store.save_series(&head, series)?;
            broadcaster.publish(build_view(
                Some(repo),
                settings,
                store,
                &head,
                series,
                cover_letter,
            )?);
            Ok(())
        })
        .instrument(span)
        .await;

        let recorded = scraper.finish();
        if let Err(e) = &result {
            warn!("Send of {} stopped after {} emails: {}", head, recorded, e);
        } else {
            info!("Send of {} recorded {} emails", head, recorded);
        }
        result
    }
}

fn has_previous_version<S: KeyValueStore>(
    repo: Option<&GitRepository>,
    store: &SeriesStore<S>,
    head: &str,
    series: &Series,
) -> Result<bool> {
    let Some(repo) = repo else {
        return Ok(false);
    };
    if head.is_empty() || series.version <= 1 {
        return Ok(false);
    }

    let previous = previous_head(head, series.version);
    if previous == head {
        return Ok(false);
    }
    Ok(store.has_series(&previous)? && repo.branch_exists(&previous)?)
}

fn build_view<S: KeyValueStore>(
    repo: Option<&GitRepository>,
    settings: &Settings,
    store: &SeriesStore<S>,
    head: &str,
    series: &Series,
    cover_letter: &str,
) -> Result<SeriesView> {
    let (log, has_get_maintainer, has_checkpatch, has_maintainers) = match repo {
        Some(repo) => {
            let root = repo.root();
            (
                repo.log(series.nb_patches as usize)?,
                settings.get_maintainer(root).exists(),
                settings.checkpatch(root).exists(),
                settings.maintainers(root).exists(),
            )
        }
        None => (Vec::new(), false, false, false),
    };

    Ok(SeriesView {
        series: series.clone(),
        head: head.to_string(),
        log,
        cover_letter: cover_letter.to_string(),
        has_get_maintainer,
        has_checkpatch,
        has_maintainers,
        has_previous_version: has_previous_version(repo, store, head, series)?,
    })
}

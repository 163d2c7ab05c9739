mod cli;
mod render;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use log::{debug, error, warn};
use thiserror::Error;

use cli::{CliArgs, CliCommand};
use sendseries::config::default_config_path;
use sendseries::db::default_database_path;
use sendseries::logging::{default_directive, init_logging, LogFormat};
use sendseries::{
    load_settings, load_settings_or_default, Command, Database, GitRepository, SeriesController,
    SeriesDefaults, SeriesError, SeriesStore, Settings, ViewBroadcaster, WorkspaceState,
};

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Series(#[from] SeriesError),

    #[error("Invalid JSON command: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No MAINTAINERS entry matches '{0}'")]
    NoMatch(String),

    #[error("'{query}' matches several entries:\n  {}", .matches.join("\n  "))]
    Ambiguous { query: String, matches: Vec<String> },

    #[error("Failed to read cover letter from '{path}': {source}")]
    ReadCoverLetter {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Editor '{editor}' failed: {message}")]
    Editor { editor: String, message: String },
}

type CliResult<T> = std::result::Result<T, CliError>;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    let options = &args.global_options;

    let format = if options.log_json {
        LogFormat::Json
    } else {
        LogFormat::Text
    };
    let logging = init_logging(default_directive(options.verbose, options.quiet), format);
    if let Err(e) = &logging {
        eprintln!("Failed to initialize logging: {}", e);
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if logging.is_ok() {
                error!("{}", e);
            } else {
                eprintln!("Error: {}", e);
            }
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: Option<&Path>) -> CliResult<Settings> {
    let settings = match path {
        Some(path) => load_settings(path).map_err(SeriesError::from)?,
        None => match default_config_path() {
            Some(path) => load_settings_or_default(path).map_err(SeriesError::from)?,
            None => Settings::default(),
        },
    };
    Ok(settings)
}

fn open_database(settings: &Settings) -> CliResult<Database> {
    let path = settings.database_path.clone().or_else(default_database_path);
    let db = match path {
        Some(path) => {
            debug!("Using database {}", path.display());
            Database::open(&path).map_err(SeriesError::from)?
        }
        None => {
            warn!("No data directory found, series will not be remembered");
            Database::open_in_memory().map_err(SeriesError::from)?
        }
    };
    Ok(db)
}

async fn run(args: CliArgs) -> CliResult<()> {
    let options = args.global_options;
    let settings = load_config(options.config.as_deref())?;
    let db = open_database(&settings)?;

    let repo = GitRepository::discover(&options.repo, &settings.git_path)
        .map_err(SeriesError::from)?;
    let workspace = repo.root().to_string_lossy().into_owned();
    let store = SeriesStore::new(
        WorkspaceState::new(db, workspace),
        SeriesDefaults::from(&settings),
    );

    let mut controller = SeriesController::new(store, settings, ViewBroadcaster::default());
    controller.attach(repo)?;

    let command = match args.command.unwrap_or(CliCommand::Show) {
        CliCommand::List => {
            let series = controller.list_series()?;
            if options.json {
                println!("{}", serde_json::to_string_pretty(&series)?);
            } else {
                print!("{}", render::series_list(&series));
            }
            return Ok(());
        }
        CliCommand::Maintainers { query } => {
            let entries = controller.possible_recipients(&query)?;
            if options.json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                for entry in entries {
                    println!("{}", entry);
                }
            }
            return Ok(());
        }
        CliCommand::CoverLetter { file: None, edit: false } => {
            print!("{}", controller.cover_letter());
            return Ok(());
        }
        CliCommand::AddPerson { kind, query } => {
            let mut matches = controller.possible_recipients(&query)?;
            match matches.len() {
                0 => return Err(CliError::NoMatch(query)),
                1 => Command::AddPerson {
                    kind,
                    entry: matches.remove(0),
                },
                _ => return Err(CliError::Ambiguous { query, matches }),
            }
        }
        CliCommand::CoverLetter { file, edit } => {
            let cover_letter = if edit {
                edit_text(controller.cover_letter())?
            } else {
                read_cover_letter(file.as_deref())?
            };
            Command::SetCoverLetter { cover_letter }
        }
        CliCommand::Exec { json } => serde_json::from_str(&json)?,
        other => to_command(other),
    };

    let outcome = controller.handle(command).await?;
    if options.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print!("{}", render::outcome(&outcome));
    }
    Ok(())
}

/// Maps the subcommands that need no extra input.
fn to_command(command: CliCommand) -> Command {
    match command {
        CliCommand::Prefix { prefix } => Command::SetPrefix { prefix },
        CliCommand::Version { version } => Command::SetVersion { version },
        CliCommand::Title { title } => Command::SetTitle { title },
        CliCommand::AddEmail { kind, email } => Command::AddEmail { kind, email },
        CliCommand::EditEmail { kind, index, email } => Command::EditEmail { kind, index, email },
        CliCommand::RemoveEmail { kind, index } => Command::EditEmail {
            kind,
            index,
            email: String::new(),
        },
        CliCommand::GetMaintainers { kind } => Command::GetMaintainers { kind },
        CliCommand::AddPatch => Command::AddPatch,
        CliCommand::RemovePatch => Command::RemovePatch,
        CliCommand::Bump => Command::Bump,
        CliCommand::Send => Command::Send,
        CliCommand::Checkpatch => Command::Checkpatch,
        CliCommand::Inspect { commit } => Command::Inspect { commit },
        CliCommand::RangeDiff => Command::RangeDiff,
        CliCommand::Rebase => Command::RebaseInteractive,
        CliCommand::ForgetSent { index } => Command::ForgetSentSeries { index },
        CliCommand::OpenEmail { message_id } => Command::OpenEmail { message_id },
        CliCommand::Checkout { branch } => Command::ChangeHead { branch },
        CliCommand::Forget { branch } => Command::ForgetSeries { branch },
        CliCommand::CopyFrom { branch, fields } => Command::CopyFromSeries { branch, fields },
        CliCommand::Show
        | CliCommand::List
        | CliCommand::Maintainers { .. }
        | CliCommand::AddPerson { .. }
        | CliCommand::CoverLetter { .. }
        | CliCommand::Exec { .. } => Command::GetContent,
    }
}

fn read_cover_letter(file: Option<&Path>) -> CliResult<String> {
    let path = file.unwrap_or(Path::new("-"));
    let read_error = |source| CliError::ReadCoverLetter {
        path: path.to_path_buf(),
        source,
    };

    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .map_err(read_error)?;
        Ok(text)
    } else {
        std::fs::read_to_string(path).map_err(read_error)
    }
}

/// Lets the user edit `current` in `$VISUAL` / `$EDITOR`.
fn edit_text(current: &str) -> CliResult<String> {
    let editor = std::env::var("VISUAL")
        .or_else(|_| std::env::var("EDITOR"))
        .unwrap_or_else(|_| "vi".to_string());
    let editor_error = |message: String| CliError::Editor {
        editor: editor.clone(),
        message,
    };

    let file = tempfile::Builder::new()
        .prefix("sendseries-cover-letter-")
        .suffix(".txt")
        .tempfile()
        .map_err(|e| editor_error(e.to_string()))?;
    std::fs::write(file.path(), current).map_err(|e| editor_error(e.to_string()))?;

    let mut parts = editor.split_whitespace();
    let program = parts.next().unwrap_or("vi");
    let status = std::process::Command::new(program)
        .args(parts)
        .arg(file.path())
        .status()
        .map_err(|e| editor_error(e.to_string()))?;
    if !status.success() {
        return Err(editor_error(format!(
            "exit code {}",
            status.code().unwrap_or(-1)
        )));
    }

    std::fs::read_to_string(file.path()).map_err(|source| CliError::ReadCoverLetter {
        path: file.path().to_path_buf(),
        source,
    })
}

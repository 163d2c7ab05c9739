use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use sendseries::{RecipientKind, SeriesField};

#[derive(Debug, Parser)]
#[command(bin_name = "sendseries")]
#[command(about = "Prepare, version and send patch series with git send-email")]
#[command(version)]
#[command(next_line_help = true)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Option<CliCommand>,

    #[command(flatten)]
    pub global_options: GlobalOptions,
}

#[derive(Debug, Args)]
pub struct GlobalOptions {
    #[arg(global = true, long, help = "Settings file [default: <config dir>/sendseries/config.yaml]")]
    pub config: Option<PathBuf>,

    #[arg(global = true, long, default_value = ".", help = "Any path inside the repository")]
    pub repo: PathBuf,

    #[arg(global = true, long, short = 'j', help = "Print output as JSON")]
    pub json: bool,

    #[arg(global = true, long, short = 'v', action = clap::ArgAction::Count, help = "More log output (-vv for trace)")]
    pub verbose: u8,

    #[arg(global = true, long, short = 'q', help = "Only log warnings and errors")]
    pub quiet: bool,

    #[arg(global = true, long, help = "Log as JSON lines")]
    pub log_json: bool,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    #[clap(about = "Show the series of the current branch (default)")]
    Show,

    #[clap(about = "List every remembered series")]
    List,

    #[clap(about = "Set the subject prefix, e.g. `PATCH net-next`")]
    Prefix { prefix: String },

    #[clap(about = "Set the version number")]
    Version { version: u32 },

    #[clap(about = "Set the cover letter title")]
    Title { title: String },

    #[clap(about = "Add a recipient")]
    AddEmail { kind: RecipientKind, email: String },

    #[clap(about = "Replace a recipient; an empty email removes it")]
    EditEmail {
        kind: RecipientKind,
        index: usize,
        email: String,
    },

    #[clap(about = "Remove a recipient")]
    RemoveEmail { kind: RecipientKind, index: usize },

    #[clap(about = "Add the single MAINTAINERS entry matching a query")]
    AddPerson { kind: RecipientKind, query: String },

    #[clap(about = "List MAINTAINERS entries matching a query")]
    Maintainers {
        #[arg(default_value = "")]
        query: String,
    },

    #[clap(about = "Fill recipients using get_maintainer")]
    GetMaintainers { kind: RecipientKind },

    #[clap(about = "Include one more commit in the series")]
    AddPatch,

    #[clap(about = "Include one commit less in the series")]
    RemovePatch,

    #[clap(about = "Copy the series to a new `-vN` branch and check it out")]
    Bump,

    #[clap(about = "Send the series with git send-email")]
    Send,

    #[clap(about = "Run checkpatch on the series")]
    Checkpatch,

    #[clap(about = "Format the series and print the patch paths")]
    Inspect {
        #[arg(help = "Only the patch of this commit, 1 being HEAD")]
        commit: Option<usize>,
    },

    #[clap(about = "Compare with the previous version using git range-diff")]
    RangeDiff,

    #[clap(about = "Rework the series with git rebase -i")]
    Rebase,

    #[clap(about = "Forget one entry of the send history")]
    ForgetSent { index: usize },

    #[clap(about = "Print the archive link of a sent email and open it")]
    OpenEmail { message_id: String },

    #[clap(about = "Check out another branch")]
    Checkout { branch: String },

    #[clap(about = "Forget the series remembered for a branch")]
    Forget { branch: String },

    #[clap(about = "Copy fields of another remembered series")]
    CopyFrom {
        branch: String,
        #[arg(
            long,
            value_delimiter = ',',
            required = true,
            help = "prefix, version, title, cover-letter, nb-patches, ccs, tos, sent-emails"
        )]
        fields: Vec<SeriesField>,
    },

    #[clap(about = "Set the cover letter, from a file, stdin (`-`) or $EDITOR")]
    CoverLetter {
        #[arg(long, conflicts_with = "edit")]
        file: Option<PathBuf>,
        #[arg(long)]
        edit: bool,
    },

    #[clap(about = "Run a JSON command, e.g. '{\"command\":\"addPatch\"}'")]
    Exec { json: String },
}

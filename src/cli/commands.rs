use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "wp", about = concat!("weekplan v", env!("CARGO_PKG_VERSION"), " - day notes and to-dos in plain markdown"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different vault directory
    #[arg(short = 'C', long = "vault-dir", global = true)]
    pub vault_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new vault in the current directory
    Init(InitArgs),
    /// Open (creating if needed) today's note
    Today,
    /// Open the note for the next working day
    Tomorrow,
    /// Open the note for the previous working day
    Yesterday,
    /// Open the note for a given date
    Day(DayArgs),
    /// Show the next working day after a date
    NextDay(RelativeDayArgs),
    /// Show the previous working day before a date
    PrevDay(RelativeDayArgs),
    /// Move a to-do to another note
    Mv(MvArgs),
    /// Capture a new to-do
    Add(AddArgs),
    /// Undo the last move or capture
    Undo,
    /// List moves that can be undone
    History(HistoryArgs),
    /// Show or change settings
    Settings(SettingsCmd),
    /// View the recovery log
    Recovery(RecoveryArgs),
}

// ---------------------------------------------------------------------------
// Init args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct InitArgs {
    /// Folder for day notes and the inbox
    #[arg(long, default_value = crate::model::settings::DEFAULT_BASE_DIR)]
    pub base_dir: String,
}

// ---------------------------------------------------------------------------
// Day note args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct DayArgs {
    /// Date (YYYY-MM-DD)
    pub date: String,
}

#[derive(Args)]
pub struct RelativeDayArgs {
    /// Date to count from (default: today)
    #[arg(long)]
    pub from: Option<String>,
}

// ---------------------------------------------------------------------------
// To-do args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct MvArgs {
    /// Note holding the to-do (vault path, or a bare day-note name)
    pub file: String,
    /// Line number of the to-do (1-based)
    pub line: usize,
    /// Destination: inbox, today, tomorrow, yesterday, YYYY-MM-DD,
    /// tag:<name> or note:<path> (asks when omitted)
    #[arg(long)]
    pub to: Option<String>,
    /// Section to file the to-do under
    #[arg(long, default_value = crate::ops::move_ops::DEFAULT_HEADER)]
    pub header: String,
}

#[derive(Args)]
pub struct AddArgs {
    /// To-do text
    pub text: String,
    /// Destination (default: today)
    #[arg(long, default_value = "today")]
    pub to: String,
    /// Section to file the to-do under
    #[arg(long, default_value = crate::ops::move_ops::DEFAULT_HEADER)]
    pub header: String,
}

#[derive(Args)]
pub struct HistoryArgs {
    /// Maximum number of entries to show
    #[arg(long)]
    pub limit: Option<usize>,
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct SettingsCmd {
    #[command(subcommand)]
    pub action: Option<SettingsAction>,
}

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print current settings
    Show,
    /// Change a setting
    Set(SettingsSetArgs),
}

#[derive(Args)]
pub struct SettingsSetArgs {
    /// Setting name (working_days, base_dir, daily_note_template, tag_base_folder)
    pub key: String,
    /// New value (empty clears the daily note template)
    pub value: String,
}

// ---------------------------------------------------------------------------
// Recovery log
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct RecoveryArgs {
    /// Maximum number of entries to show (default: 10)
    #[arg(long)]
    pub limit: Option<usize>,
    /// Print the absolute path to the recovery log
    #[arg(long)]
    pub path: bool,
}

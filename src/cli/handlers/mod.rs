mod init;
pub use init::cmd_init;

use std::io::Write;
use std::path::PathBuf;

use chrono::NaiveDate;

use crate::cli::commands::*;
use crate::cli::dialog::{DestinationOption, DestinationPicker, run_dialog};
use crate::cli::notify::{Notifier, StderrNotifier};
use crate::cli::output::*;
use crate::io::lock::VaultLock;
use crate::io::recovery::{self, RecoveryCategory};
use crate::io::settings_io;
use crate::io::state;
use crate::io::vault::{FsVault, Vault, VaultError};
use crate::model::paths::{day_file_name, resolve_active_file};
use crate::model::settings::{SettingChange, SettingKey, Settings};
use crate::ops::daily_ops::{self, DailyError, DayOffset, EnsuredNote};
use crate::ops::move_ops::{self, Destination, MoveError, MoveRequest};
use crate::ops::undo::{MoveAction, UndoLog};
use crate::parse::split_lines;
use crate::util::dates::{self, format_date};

/// Options shared by every command
pub struct Context {
    /// Set by -C
    pub vault_dir: Option<PathBuf>,
    pub json: bool,
}

/// A discovered vault with its settings loaded
struct Session {
    vault: FsVault,
    settings: Settings,
}

impl Session {
    fn root(&self) -> PathBuf {
        self.vault.root().to_path_buf()
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let vault_dir = match cli.vault_dir {
        Some(ref dir) => Some(
            std::fs::canonicalize(dir)
                .map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e))?,
        ),
        None => None,
    };
    let ctx = Context {
        vault_dir,
        json: cli.json,
    };
    let mut notifier = StderrNotifier;

    match cli.command {
        None => Err("no command given (try `wp --help`)".into()),
        Some(cmd) => match cmd {
            Commands::Init(args) => cmd_init(&ctx, args),

            // Day notes
            Commands::Today => cmd_open_day(&ctx, &mut notifier, DayOffset::Today),
            Commands::Tomorrow => cmd_open_day(&ctx, &mut notifier, DayOffset::NextWorkingDay),
            Commands::Yesterday => {
                cmd_open_day(&ctx, &mut notifier, DayOffset::PreviousWorkingDay)
            }
            Commands::Day(args) => cmd_day(&ctx, &mut notifier, args),
            Commands::NextDay(args) => {
                cmd_relative_day(&ctx, &mut notifier, DayOffset::NextWorkingDay, args)
            }
            Commands::PrevDay(args) => {
                cmd_relative_day(&ctx, &mut notifier, DayOffset::PreviousWorkingDay, args)
            }

            // To-dos
            Commands::Mv(args) => cmd_mv(&ctx, &mut notifier, args),
            Commands::Add(args) => cmd_add(&ctx, &mut notifier, args),
            Commands::Undo => cmd_undo(&ctx, &mut notifier),
            Commands::History(args) => cmd_history(&ctx, &mut notifier, args),

            // Maintenance
            Commands::Settings(args) => cmd_settings(&ctx, &mut notifier, args),
            Commands::Recovery(args) => cmd_recovery(&ctx, &mut notifier, args),
        },
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn start_dir(ctx: &Context) -> Result<PathBuf, std::io::Error> {
    match &ctx.vault_dir {
        Some(dir) => Ok(dir.clone()),
        None => std::env::current_dir(),
    }
}

fn load_session(ctx: &Context, notifier: &mut dyn Notifier) -> Result<Session, Box<dyn std::error::Error>> {
    let root = settings_io::discover_vault(&start_dir(ctx)?)?;
    let loaded = settings_io::load_settings(&root)?;
    for key in &loaded.reset {
        notifier.notice(&format!(
            "invalid {} in {}, using \"{}\"",
            key,
            settings_io::SETTINGS_FILE,
            loaded.settings.get(*key)
        ));
    }
    Ok(Session {
        vault: FsVault::new(root),
        settings: loaded.settings,
    })
}

fn load_history(session: &Session) -> UndoLog {
    state::read_history(&session.root()).unwrap_or_default()
}

fn save_history(session: &Session, log: &UndoLog) -> Result<(), Box<dyn std::error::Error>> {
    state::write_history(&session.root(), log)
        .map_err(|e| format!("could not save undo history: {}", e))?;
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_date_arg(value: &str) -> Result<NaiveDate, Box<dyn std::error::Error>> {
    Ok(dates::parse_date(value.trim())?)
}

/// Turn notice-level failures into a notice; anything else is returned.
fn notice_or_err(notifier: &mut dyn Notifier, err: MoveError) -> Result<(), Box<dyn std::error::Error>> {
    if err.is_notice() {
        log::warn!("{}", err);
        notifier.notice(&err.to_string());
        Ok(())
    } else {
        Err(err.into())
    }
}

fn daily_notice_or_err(
    notifier: &mut dyn Notifier,
    err: DailyError,
) -> Result<(), Box<dyn std::error::Error>> {
    notice_or_err(notifier, MoveError::Daily(err))
}

fn report_note(ctx: &Context, note: &EnsuredNote, date: NaiveDate) -> Result<(), Box<dyn std::error::Error>> {
    if ctx.json {
        return print_json(&note_to_json(note, &format_date(date)));
    }
    if note.created {
        println!("{} (created)", note.path);
    } else {
        println!("{}", note.path);
    }
    Ok(())
}

/// Record to-dos that a half-finished move or undo left in neither note.
fn record_incomplete(session: &Session, category: RecoveryCategory, err: &MoveError) {
    if let MoveError::Incomplete {
        source_path,
        todo,
        error,
        ..
    } = err
    {
        recovery::log_lost_todo(&session.root(), category, source_path, todo, &error.to_string());
        log::error!("\"{}\" saved to the recovery log (see `wp recovery`)", todo);
    }
}

// ---------------------------------------------------------------------------
// Day notes
// ---------------------------------------------------------------------------

fn cmd_open_day(
    ctx: &Context,
    notifier: &mut dyn Notifier,
    offset: DayOffset,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = load_session(ctx, notifier)?;
    let _lock = VaultLock::write(&session.root())?;

    let today = dates::today();
    let date = daily_ops::resolve_day(&session.settings, offset, today)?;
    match daily_ops::ensure_day_note(&mut session.vault, &session.settings, date) {
        Ok(note) => report_note(ctx, &note, date),
        Err(e) => daily_notice_or_err(notifier, e),
    }
}

fn cmd_day(ctx: &Context, notifier: &mut dyn Notifier, args: DayArgs) -> Result<(), Box<dyn std::error::Error>> {
    let date = parse_date_arg(&args.date)?;
    let mut session = load_session(ctx, notifier)?;
    let _lock = VaultLock::write(&session.root())?;

    match daily_ops::ensure_day_note(&mut session.vault, &session.settings, date) {
        Ok(note) => report_note(ctx, &note, date),
        Err(e) => daily_notice_or_err(notifier, e),
    }
}

fn cmd_relative_day(
    ctx: &Context,
    notifier: &mut dyn Notifier,
    offset: DayOffset,
    args: RelativeDayArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = load_session(ctx, notifier)?;
    let from = match args.from {
        Some(ref s) => parse_date_arg(s)?,
        None => dates::today(),
    };
    let date = daily_ops::resolve_day(&session.settings, offset, from)?;
    let path = day_file_name(&session.settings, date);

    if ctx.json {
        return print_json(&DayJson {
            date: format_date(date),
            path,
        });
    }
    println!("{}\t{}", format_date(date), path);
    Ok(())
}

// ---------------------------------------------------------------------------
// To-do commands
// ---------------------------------------------------------------------------

/// Ask on the terminal where the to-do on `line` should go.
fn pick_destination(
    session: &Session,
    source: &str,
    line: usize,
) -> Result<Option<Destination>, Box<dyn std::error::Error>> {
    let text = session.vault.read(source)?;
    let todo = split_lines(&text).get(line).cloned().unwrap_or_default();

    let today = dates::today();
    let mut options = Vec::new();
    for destination in [
        Destination::Inbox,
        Destination::Today,
        Destination::NextWorkingDay,
        Destination::PreviousWorkingDay,
    ] {
        let resolved = move_ops::resolve_destination(&session.settings, &destination, source, today)?;
        options.push(DestinationOption {
            destination,
            path: resolved.path,
        });
    }

    let mut picker = DestinationPicker::new(todo, options);
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    let picked = run_dialog(&mut picker, &mut stdin.lock(), &mut stdout)?;
    stdout.flush()?;
    Ok(picked)
}

fn report_action(ctx: &Context, action: &MoveAction) -> Result<(), Box<dyn std::error::Error>> {
    if ctx.json {
        return print_json(&move_to_json(action));
    }
    println!("{}", format_move(action));
    Ok(())
}

fn cmd_mv(ctx: &Context, notifier: &mut dyn Notifier, args: MvArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.line == 0 {
        return Err("line numbers start at 1".into());
    }
    let mut session = load_session(ctx, notifier)?;
    let source = resolve_active_file(&session.settings, &args.file);
    let line = args.line - 1;

    let destination = match args.to {
        Some(ref to) => to.parse::<Destination>()?,
        None => {
            if !session.vault.exists(&source) {
                return notice_or_err(
                    notifier,
                    MoveError::Vault(VaultError::NotFound(source)),
                );
            }
            match pick_destination(&session, &source, line)? {
                Some(d) => d,
                None => {
                    notifier.notice("move cancelled");
                    return Ok(());
                }
            }
        }
    };

    let _lock = VaultLock::write(&session.root())?;
    let mut history = load_history(&session);
    let request = MoveRequest {
        source,
        line,
        destination,
        header: args.header,
        today: dates::today(),
    };

    match move_ops::move_task(&mut session.vault, &session.settings, &mut history, &request) {
        Ok(action) => {
            save_history(&session, &history)?;
            report_action(ctx, &action)
        }
        Err(e) => {
            record_incomplete(&session, RecoveryCategory::Move, &e);
            notice_or_err(notifier, e)
        }
    }
}

fn cmd_add(ctx: &Context, notifier: &mut dyn Notifier, args: AddArgs) -> Result<(), Box<dyn std::error::Error>> {
    let destination = args.to.parse::<Destination>()?;
    let mut session = load_session(ctx, notifier)?;
    let _lock = VaultLock::write(&session.root())?;
    let mut history = load_history(&session);

    match move_ops::add_todo(
        &mut session.vault,
        &session.settings,
        &mut history,
        &destination,
        &args.header,
        &args.text,
        dates::today(),
    ) {
        Ok(action) => {
            save_history(&session, &history)?;
            report_action(ctx, &action)
        }
        Err(e) => notice_or_err(notifier, e),
    }
}

fn cmd_undo(ctx: &Context, notifier: &mut dyn Notifier) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = load_session(ctx, notifier)?;
    let _lock = VaultLock::write(&session.root())?;
    let mut history = load_history(&session);
    let before = history.len();

    let result = move_ops::undo_last(&mut session.vault, &mut history);
    if history.len() != before {
        save_history(&session, &history)?;
    }

    match result {
        Ok(action) => {
            if ctx.json {
                return print_json(&move_to_json(&action));
            }
            println!("undid: {}", format_move(&action));
            Ok(())
        }
        Err(e) => {
            record_incomplete(&session, RecoveryCategory::Undo, &e);
            notice_or_err(notifier, e)
        }
    }
}

fn cmd_history(
    ctx: &Context,
    notifier: &mut dyn Notifier,
    args: HistoryArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = load_session(ctx, notifier)?;
    let _lock = VaultLock::read(&session.root())?;
    let history = load_history(&session);
    let limit = args.limit.unwrap_or(usize::MAX);

    if ctx.json {
        let entries: Vec<MoveJson> = history.iter().take(limit).map(move_to_json).collect();
        return print_json(&entries);
    }
    if history.is_empty() {
        println!("no moves to undo");
        return Ok(());
    }
    for (i, action) in history.iter().take(limit).enumerate() {
        println!("{:>2}. {}", i + 1, format_move(action));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Settings and recovery
// ---------------------------------------------------------------------------

fn cmd_settings(
    ctx: &Context,
    notifier: &mut dyn Notifier,
    args: SettingsCmd,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = load_session(ctx, notifier)?;

    match args.action {
        None | Some(SettingsAction::Show) => {}
        Some(SettingsAction::Set(set)) => {
            let key: SettingKey = set.key.parse()?;
            let root = session.root();
            let _lock = VaultLock::write(&root)?;
            let change = settings_io::update_setting(&root, &mut session.settings, key, &set.value)?;
            if let SettingChange::Reverted { value } = change {
                notifier.notice(&format!(
                    "\"{}\" is not a valid {}, keeping \"{}\"",
                    set.value, key, value
                ));
            }
        }
    }

    if ctx.json {
        return print_json(&settings_to_json(&session.settings));
    }
    for line in format_settings(&session.settings) {
        println!("{}", line);
    }
    Ok(())
}

fn cmd_recovery(
    ctx: &Context,
    notifier: &mut dyn Notifier,
    args: RecoveryArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = load_session(ctx, notifier)?;
    let root = session.root();

    if args.path {
        println!("{}", recovery::recovery_log_path(&root).display());
        return Ok(());
    }

    let _lock = VaultLock::read(&root)?;
    let entries = recovery::read_recovery_entries(&root, Some(args.limit.unwrap_or(10)));
    if ctx.json {
        let out: Vec<RecoveryEntryJson> = entries.iter().map(recovery_to_json).collect();
        return print_json(&out);
    }
    if entries.is_empty() {
        println!("recovery log is empty");
        return Ok(());
    }
    for entry in &entries {
        println!(
            "{} {}: {}",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            entry.category,
            entry.description
        );
        for line in entry.body.lines() {
            println!("  {}", line);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::notify::CollectNotifier;
    use tempfile::TempDir;

    #[test]
    fn notices_are_not_errors() {
        let mut n = CollectNotifier::default();
        assert!(notice_or_err(&mut n, MoveError::NothingToUndo).is_ok());
        assert!(notice_or_err(&mut n, MoveError::Vault(VaultError::NotFound("a.md".into()))).is_ok());
        assert_eq!(n.notices, vec!["nothing to undo", "note not found: a.md"]);
    }

    #[test]
    fn other_errors_propagate() {
        let mut n = CollectNotifier::default();
        let err = MoveError::Vault(VaultError::Io {
            path: "a.md".into(),
            source: std::io::Error::other("disk full"),
        });
        assert!(notice_or_err(&mut n, err).is_err());
        assert!(n.notices.is_empty());
    }

    #[test]
    fn reset_settings_are_announced() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join(settings_io::SETTINGS_FILE),
            "working_days = \"Someday\"\n",
        )
        .unwrap();
        let ctx = Context {
            vault_dir: Some(tmp.path().to_path_buf()),
            json: false,
        };
        let mut n = CollectNotifier::default();
        let session = load_session(&ctx, &mut n).unwrap();
        assert_eq!(session.settings.working_days, "Mon,Tue,Wed,Thu,Fri");
        assert_eq!(
            n.notices,
            vec!["invalid working_days in weekplan.toml, using \"Mon,Tue,Wed,Thu,Fri\""]
        );
    }
}

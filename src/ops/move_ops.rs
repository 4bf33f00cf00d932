use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

use crate::io::vault::{Vault, VaultError};
use crate::model::paths::{date_from_file_name, inbox_file_name, tag_file_name};
use crate::model::settings::Settings;
use crate::ops::daily_ops::{self, DailyError, DayOffset};
use crate::ops::section_ops::{self, DeleteOutcome, SectionCleanup};
use crate::ops::undo::{MoveAction, UndoLog};
use crate::parse::todo::{ensure_todo, is_todo, section_header};
use crate::parse::{frontmatter_line_count, split_lines};
use crate::util::dates::{DateError, parse_date};

/// Section that moved and captured to-dos land under unless told otherwise
pub const DEFAULT_HEADER: &str = "Inbox";

/// Error type for move and undo operations
#[derive(Debug, thiserror::Error)]
pub enum MoveError {
    /// `line` is 0-based; messages show it 1-based
    #[error("line {} of {path} is not a to-do", .line + 1)]
    NotATodo { path: String, line: usize },
    #[error("{path} has no line {}", .line + 1)]
    LineNotFound { path: String, line: usize },
    #[error("to-do no longer in {path}: {todo}")]
    TodoMissing { path: String, todo: String },
    #[error("nothing to undo")]
    NothingToUndo,
    #[error("{path} changed since the move, not undoing")]
    UndoConflict { path: String },
    #[error("empty to-do text")]
    EmptyTodo,
    #[error("empty section header")]
    EmptyHeader,
    #[error("to-do taken from {source_path} but not written to {dest}: {error}")]
    Incomplete {
        source_path: String,
        dest: String,
        todo: String,
        error: VaultError,
    },
    #[error(transparent)]
    Daily(#[from] DailyError),
    #[error(transparent)]
    Vault(#[from] VaultError),
    #[error(transparent)]
    Date(#[from] DateError),
}

impl MoveError {
    /// Conditions reported to the user as a notice rather than a failure.
    pub fn is_notice(&self) -> bool {
        match self {
            MoveError::NotATodo { .. }
            | MoveError::LineNotFound { .. }
            | MoveError::TodoMissing { .. }
            | MoveError::NothingToUndo
            | MoveError::UndoConflict { .. }
            | MoveError::EmptyTodo
            | MoveError::EmptyHeader
            | MoveError::Daily(DailyError::TemplateNotFound(_)) => true,
            MoveError::Vault(e) | MoveError::Daily(DailyError::Vault(e)) => e.is_not_found(),
            _ => false,
        }
    }
}

/// Where a to-do should go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Inbox,
    Today,
    NextWorkingDay,
    PreviousWorkingDay,
    Date(NaiveDate),
    Tag(String),
    /// Any note, by vault path
    Note(String),
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Inbox => write!(f, "inbox"),
            Destination::Today => write!(f, "today"),
            Destination::NextWorkingDay => write!(f, "next working day"),
            Destination::PreviousWorkingDay => write!(f, "previous working day"),
            Destination::Date(d) => write!(f, "{}", d.format(crate::util::dates::DATE_FORMAT)),
            Destination::Tag(t) => write!(f, "#{}", t),
            Destination::Note(p) => write!(f, "{}", p),
        }
    }
}

impl FromStr for Destination {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "" => return Err("empty destination".to_string()),
            "inbox" => return Ok(Destination::Inbox),
            "today" => return Ok(Destination::Today),
            "tomorrow" | "next" => return Ok(Destination::NextWorkingDay),
            "yesterday" | "prev" | "previous" => return Ok(Destination::PreviousWorkingDay),
            _ => {}
        }
        if let Some(tag) = s.strip_prefix("tag:").or_else(|| s.strip_prefix('#')) {
            let tag = tag.trim();
            if tag.is_empty() {
                return Err("empty tag".to_string());
            }
            return Ok(Destination::Tag(tag.to_string()));
        }
        if let Some(path) = s.strip_prefix("note:") {
            return Ok(Destination::Note(path.trim().to_string()));
        }
        if let Ok(date) = parse_date(s) {
            return Ok(Destination::Date(date));
        }
        Err(format!(
            "unknown destination \"{}\" (expected inbox, today, tomorrow, yesterday, YYYY-MM-DD, tag:<name> or note:<path>)",
            s
        ))
    }
}

/// A destination turned into a vault path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDestination {
    pub path: String,
    /// Set for day notes, which are seeded from the daily template
    pub date: Option<NaiveDate>,
}

/// Resolve `destination` for a to-do currently in `source`. Working-day
/// destinations count from the source note's date, or from `today` when the
/// source is not a day note.
pub fn resolve_destination(
    settings: &Settings,
    destination: &Destination,
    source: &str,
    today: NaiveDate,
) -> Result<ResolvedDestination, DateError> {
    let reference = date_from_file_name(source).unwrap_or(today);
    let day = |offset| -> Result<ResolvedDestination, DateError> {
        let date = daily_ops::resolve_day(settings, offset, reference)?;
        Ok(day_destination(settings, date))
    };
    match destination {
        Destination::Inbox => Ok(ResolvedDestination {
            path: inbox_file_name(settings),
            date: None,
        }),
        Destination::Today => Ok(day_destination(settings, today)),
        Destination::NextWorkingDay => day(DayOffset::NextWorkingDay),
        Destination::PreviousWorkingDay => day(DayOffset::PreviousWorkingDay),
        Destination::Date(date) => Ok(day_destination(settings, *date)),
        Destination::Tag(tag) => Ok(ResolvedDestination {
            path: tag_file_name(settings, tag),
            date: None,
        }),
        Destination::Note(path) => Ok(ResolvedDestination {
            path: path.clone(),
            date: date_from_file_name(path),
        }),
    }
}

fn day_destination(settings: &Settings, date: NaiveDate) -> ResolvedDestination {
    ResolvedDestination {
        path: crate::model::paths::day_file_name(settings, date),
        date: Some(date),
    }
}

fn ensure_destination<V: Vault + ?Sized>(
    vault: &mut V,
    settings: &Settings,
    dest: &ResolvedDestination,
) -> Result<(), MoveError> {
    match dest.date {
        Some(date) if dest.path == crate::model::paths::day_file_name(settings, date) => {
            daily_ops::ensure_day_note(vault, settings, date)?;
        }
        _ => {
            daily_ops::ensure_note(vault, &dest.path, "")?;
        }
    }
    Ok(())
}

/// A request to move the to-do on `line` (0-based) of `source`
#[derive(Debug, Clone)]
pub struct MoveRequest {
    pub source: String,
    pub line: usize,
    pub destination: Destination,
    /// Section the to-do is filed under in the destination
    pub header: String,
    /// Reference date for `today` and for non-day source notes
    pub today: NaiveDate,
}

/// Move a to-do line out of its note and under `header` in the destination,
/// recording the move in `log`.
///
/// Nothing is written until the to-do and its destination are validated.
/// When source and destination are the same note, the insert works on the
/// content left by the removal.
pub fn move_task<V: Vault + ?Sized>(
    vault: &mut V,
    settings: &Settings,
    log: &mut UndoLog,
    request: &MoveRequest,
) -> Result<MoveAction, MoveError> {
    if request.header.trim().is_empty() {
        return Err(MoveError::EmptyHeader);
    }
    let source_text = vault.read(&request.source)?;
    let lines = split_lines(&source_text);
    let todo = lines
        .get(request.line)
        .ok_or_else(|| MoveError::LineNotFound {
            path: request.source.clone(),
            line: request.line,
        })?
        .clone();
    if !is_todo(&todo) || request.line < frontmatter_line_count(&source_text) {
        return Err(MoveError::NotATodo {
            path: request.source.clone(),
            line: request.line,
        });
    }

    let dest = resolve_destination(settings, &request.destination, &request.source, request.today)?;
    ensure_destination(vault, settings, &dest)?;

    let (after_delete, deleted) = section_ops::delete(
        &source_text,
        request.line,
        &todo,
        &SectionCleanup::Enclosing,
    );
    let (source_line, source_header) = match deleted {
        DeleteOutcome::Removed { line, collapsed } => (line, collapsed),
        DeleteOutcome::NotFound => {
            return Err(MoveError::TodoMissing {
                path: request.source.clone(),
                todo,
            });
        }
    };
    vault.write(&request.source, &after_delete)?;

    let incomplete = |error: VaultError| MoveError::Incomplete {
        source_path: request.source.clone(),
        dest: dest.path.clone(),
        todo: todo.clone(),
        error,
    };
    let dest_text = vault.read(&dest.path).map_err(incomplete)?;
    let (after_insert, inserted) = section_ops::insert(&dest_text, &request.header, &todo);
    vault.write(&dest.path, &after_insert).map_err(incomplete)?;

    log::info!(
        "moved \"{}\" from {} to {} under \"{}\"",
        todo.trim(),
        request.source,
        dest.path,
        request.header
    );

    let action = MoveAction {
        source_file: request.source.clone(),
        dest_file: dest.path,
        task_content: todo,
        source_line,
        inserted_lines: inserted.inserted_lines,
        header_added: inserted.header_added,
        header: request.header.clone(),
        header_line: inserted.header_line,
        blank_lines_removed: inserted.blank_lines_removed,
        source_header,
        source_ended_with_newline: source_text.ends_with('\n'),
    };
    log.push(action.clone());
    Ok(action)
}

/// Capture a new to-do under `header` in `destination`. The capture is
/// recorded in `log` like a move without a source.
pub fn add_todo<V: Vault + ?Sized>(
    vault: &mut V,
    settings: &Settings,
    log: &mut UndoLog,
    destination: &Destination,
    header: &str,
    text: &str,
    today: NaiveDate,
) -> Result<MoveAction, MoveError> {
    if text.trim().is_empty() {
        return Err(MoveError::EmptyTodo);
    }
    if header.trim().is_empty() {
        return Err(MoveError::EmptyHeader);
    }
    let todo = ensure_todo(text);
    let dest = resolve_destination(settings, destination, "", today)?;
    ensure_destination(vault, settings, &dest)?;

    let dest_text = vault.read(&dest.path)?;
    let (after_insert, inserted) = section_ops::insert(&dest_text, header, &todo);
    vault.write(&dest.path, &after_insert)?;
    log::info!("added \"{}\" to {} under \"{}\"", todo, dest.path, header);

    let action = MoveAction {
        source_file: String::new(),
        dest_file: dest.path,
        task_content: todo,
        source_line: 0,
        inserted_lines: inserted.inserted_lines,
        header_added: inserted.header_added,
        header: header.to_string(),
        header_line: inserted.header_line,
        blank_lines_removed: inserted.blank_lines_removed,
        source_header: None,
        source_ended_with_newline: true,
    };
    log.push(action.clone());
    Ok(action)
}

/// Whether the destination still holds exactly what the move put there.
fn inserted_lines_intact(dest_text: &str, action: &MoveAction) -> bool {
    let lines = split_lines(dest_text);
    let header = section_header(&action.header);
    let mut saw_todo = false;
    for &idx in &action.inserted_lines {
        let Some(line) = lines.get(idx) else {
            return false;
        };
        if *line == action.task_content {
            saw_todo = true;
        } else if !(line.trim().is_empty()
            || (action.header_added && idx == action.header_line && line.trim() == header))
        {
            return false;
        }
    }
    saw_todo
}

/// Reverse `action`: take the to-do back out of the destination and put it
/// back at its old line in the source, restoring any section header the move
/// collapsed.
///
/// Refuses, without writing anything, when the destination no longer has
/// the inserted lines where the move left them.
pub fn undo_move<V: Vault + ?Sized>(vault: &mut V, action: &MoveAction) -> Result<(), MoveError> {
    let dest_text = vault.read(&action.dest_file)?;
    if !inserted_lines_intact(&dest_text, action) {
        return Err(MoveError::UndoConflict {
            path: action.dest_file.clone(),
        });
    }
    if action.has_source() && !vault.exists(&action.source_file) {
        return Err(VaultError::NotFound(action.source_file.clone()).into());
    }

    let mut restored = section_ops::remove_lines(&dest_text, &action.inserted_lines);
    if action.blank_lines_removed > 0 {
        restored = section_ops::insert_lines(
            &restored,
            action.header_line + 1,
            &vec![String::new(); action.blank_lines_removed],
        );
    }
    vault.write(&action.dest_file, &restored)?;

    if !action.has_source() {
        log::info!("removed \"{}\" from {}", action.task_content, action.dest_file);
        return Ok(());
    }

    let incomplete = |error: VaultError| MoveError::Incomplete {
        source_path: action.dest_file.clone(),
        dest: action.source_file.clone(),
        todo: action.task_content.clone(),
        error,
    };
    let mut source_text = vault.read(&action.source_file).map_err(incomplete)?;
    let emptied = source_text.is_empty();
    if let Some(collapsed) = &action.source_header {
        let mut header_lines = vec![collapsed.text.clone()];
        if collapsed.trailing_blank {
            header_lines.push(String::new());
        }
        source_text = section_ops::insert_lines(&source_text, collapsed.line, &header_lines);
    }
    source_text = section_ops::insert_lines(
        &source_text,
        action.source_line,
        std::slice::from_ref(&action.task_content),
    );
    // An empty note cannot tell "x" from "x\n" once x is gone
    if emptied && !action.source_ended_with_newline && source_text.ends_with('\n') {
        source_text.pop();
    }
    vault.write(&action.source_file, &source_text).map_err(incomplete)?;

    log::info!(
        "undid move of \"{}\" from {} to {}",
        action.task_content.trim(),
        action.source_file,
        action.dest_file
    );
    Ok(())
}

/// Pop the latest entry from `log` and reverse it. The entry is consumed
/// even when reversing fails partway, so a broken entry cannot block the
/// ones below it.
pub fn undo_last<V: Vault + ?Sized>(vault: &mut V, log: &mut UndoLog) -> Result<MoveAction, MoveError> {
    let action = log.pop().ok_or(MoveError::NothingToUndo)?;
    undo_move(vault, &action)?;
    Ok(action)
}

use serde::Serialize;

use crate::io::recovery::RecoveryEntry;
use crate::model::settings::{SettingKey, Settings};
use crate::ops::daily_ops::EnsuredNote;
use crate::ops::undo::MoveAction;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct NoteJson {
    pub path: String,
    pub date: String,
    pub created: bool,
}

#[derive(Serialize)]
pub struct DayJson {
    pub date: String,
    pub path: String,
}

#[derive(Serialize)]
pub struct MoveJson {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub dest: String,
    pub todo: String,
    pub header: String,
    pub header_added: bool,
    /// 1-based line of the to-do in the destination
    pub line: usize,
}

#[derive(Serialize)]
pub struct SettingsJson {
    pub working_days: String,
    pub base_dir: String,
    pub daily_note_template: Option<String>,
    pub tag_base_folder: String,
}

#[derive(Serialize)]
pub struct RecoveryEntryJson {
    pub timestamp: String,
    pub category: String,
    pub description: String,
    pub body: String,
}

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

pub fn note_to_json(note: &EnsuredNote, date: &str) -> NoteJson {
    NoteJson {
        path: note.path.clone(),
        date: date.to_string(),
        created: note.created,
    }
}

/// Line of the to-do itself among the lines a move inserted
fn todo_line(action: &MoveAction) -> usize {
    action
        .inserted_lines
        .iter()
        .copied()
        .find(|&i| i != action.header_line || !action.header_added)
        .unwrap_or(action.header_line)
}

pub fn move_to_json(action: &MoveAction) -> MoveJson {
    MoveJson {
        source: action.has_source().then(|| action.source_file.clone()),
        dest: action.dest_file.clone(),
        todo: action.task_content.clone(),
        header: action.header.clone(),
        header_added: action.header_added,
        line: todo_line(action) + 1,
    }
}

pub fn settings_to_json(settings: &Settings) -> SettingsJson {
    SettingsJson {
        working_days: settings.working_days.clone(),
        base_dir: settings.base_dir.clone(),
        daily_note_template: settings.daily_note_template.clone(),
        tag_base_folder: settings.tag_base_folder.clone(),
    }
}

pub fn recovery_to_json(entry: &RecoveryEntry) -> RecoveryEntryJson {
    RecoveryEntryJson {
        timestamp: entry.timestamp.to_rfc3339(),
        category: entry.category.to_string(),
        description: entry.description.clone(),
        body: entry.body.clone(),
    }
}

// ---------------------------------------------------------------------------
// Text formatting
// ---------------------------------------------------------------------------

/// One-line summary of a move or capture
pub fn format_move(action: &MoveAction) -> String {
    let todo = action.task_content.trim();
    if action.has_source() {
        format!(
            "{} → {} ({}) under \"{}\"",
            todo, action.dest_file, action.source_file, action.header
        )
    } else {
        format!("{} → {} under \"{}\"", todo, action.dest_file, action.header)
    }
}

pub fn format_settings(settings: &Settings) -> Vec<String> {
    SettingKey::ALL
        .iter()
        .map(|key| format!("{} = {}", key, settings.get(*key)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action() -> MoveAction {
        MoveAction {
            source_file: "Daily/2022-10-21.md".into(),
            dest_file: "Daily/2022-10-24.md".into(),
            task_content: "- [ ] call bank".into(),
            source_line: 2,
            inserted_lines: vec![0, 1, 2],
            header_added: true,
            header: "Inbox".into(),
            header_line: 0,
            blank_lines_removed: 0,
            source_header: None,
            source_ended_with_newline: true,
        }
    }

    #[test]
    fn move_json_points_at_todo() {
        let json = move_to_json(&action());
        assert_eq!(json.line, 2);
        assert_eq!(json.source.as_deref(), Some("Daily/2022-10-21.md"));
    }

    #[test]
    fn capture_has_no_source() {
        let mut a = action();
        a.source_file.clear();
        a.header_added = false;
        a.inserted_lines = vec![4];
        let json = move_to_json(&a);
        assert!(json.source.is_none());
        assert_eq!(json.line, 5);
        assert_eq!(format_move(&a), "- [ ] call bank → Daily/2022-10-24.md under \"Inbox\"");
    }

    #[test]
    fn settings_lines() {
        let lines = format_settings(&Settings::default());
        assert_eq!(lines[0], "working_days = Mon,Tue,Wed,Thu,Fri");
        assert_eq!(lines[1], "base_dir = Week Planner");
        assert_eq!(lines[2], "daily_note_template = ");
    }
}

use std::fs;
use std::path::{Path, PathBuf};

use crate::io::recovery::atomic_write;
use crate::ops::undo::UndoLog;

/// Session history file at the vault root
const HISTORY_FILE: &str = ".weekplan-history.json";

pub fn history_path(vault_root: &Path) -> PathBuf {
    vault_root.join(HISTORY_FILE)
}

/// Read the undo history left by earlier commands.
///
/// A missing or unreadable file yields `None`; callers start a fresh log.
pub fn read_history(vault_root: &Path) -> Option<UndoLog> {
    let path = history_path(vault_root);
    let content = fs::read_to_string(&path).ok()?;
    match serde_json::from_str::<UndoLog>(&content) {
        Ok(mut log) => {
            log.enforce_limit();
            Some(log)
        }
        Err(e) => {
            log::warn!("ignoring unreadable history {}: {}", path.display(), e);
            None
        }
    }
}

/// Persist the undo history.
pub fn write_history(vault_root: &Path, log: &UndoLog) -> Result<(), std::io::Error> {
    let content = serde_json::to_string_pretty(log)?;
    atomic_write(&history_path(vault_root), content.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::undo::MoveAction;
    use tempfile::TempDir;

    fn action() -> MoveAction {
        MoveAction {
            source_file: "Daily/2022-10-24.md".into(),
            dest_file: "Daily/Inbox.md".into(),
            task_content: "- [ ] call bank".into(),
            source_line: 3,
            inserted_lines: vec![1],
            header_added: true,
            header: "Inbox".into(),
            header_line: 0,
            blank_lines_removed: 0,
            source_header: None,
            source_ended_with_newline: true,
        }
    }

    #[test]
    fn missing_history_is_none() {
        let tmp = TempDir::new().unwrap();
        assert!(read_history(tmp.path()).is_none());
    }

    #[test]
    fn write_then_read() {
        let tmp = TempDir::new().unwrap();
        let mut log = UndoLog::new();
        log.push(action());
        write_history(tmp.path(), &log).unwrap();

        let back = read_history(tmp.path()).unwrap();
        assert_eq!(back, log);
    }

    #[test]
    fn corrupt_history_is_ignored() {
        let tmp = TempDir::new().unwrap();
        fs::write(history_path(tmp.path()), "{ not json").unwrap();
        assert!(read_history(tmp.path()).is_none());
    }
}

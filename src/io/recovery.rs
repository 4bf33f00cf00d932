use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;

/// Header written at the top of a new recovery log.
const FILE_HEADER: &str = "\
<!-- weekplan recovery log: to-dos that could not be put back in a note.
     View with: wp recovery
     Safe to delete once you have copied anything you need. -->

---
";

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// Category of a recovery entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryCategory {
    /// A to-do was removed from its source but never reached its destination
    Move,
    /// A to-do could not be restored by undo
    Undo,
}

impl fmt::Display for RecoveryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoveryCategory::Move => write!(f, "move"),
            RecoveryCategory::Undo => write!(f, "undo"),
        }
    }
}

impl RecoveryCategory {
    pub fn parse_category(s: &str) -> Option<Self> {
        match s {
            "move" => Some(RecoveryCategory::Move),
            "undo" => Some(RecoveryCategory::Undo),
            _ => None,
        }
    }
}

/// A single entry in the recovery log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryEntry {
    pub timestamp: DateTime<Utc>,
    pub category: RecoveryCategory,
    pub description: String,
    pub fields: Vec<(String, String)>,
    pub body: String,
}

/// Return the path to the recovery log file.
pub fn recovery_log_path(vault_root: &Path) -> PathBuf {
    vault_root.join(".weekplan-recovery.md")
}

// ---------------------------------------------------------------------------
// Atomic file write
// ---------------------------------------------------------------------------

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Entry formatting
// ---------------------------------------------------------------------------

impl RecoveryEntry {
    fn to_markdown(&self) -> String {
        let mut out = format!(
            "## {} | {}: {}\n\n",
            self.timestamp
                .to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            self.category,
            self.description,
        );

        for (key, value) in &self.fields {
            out.push_str(&format!("{}: {}\n", key, value));
        }

        if !self.body.is_empty() {
            out.push_str("\n```text\n");
            out.push_str(&self.body);
            if !self.body.ends_with('\n') {
                out.push('\n');
            }
            out.push_str("```\n");
        }

        out.push('\n');
        out.push_str("---\n");
        out
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Append a recovery entry to the log. Failures are reported through `log`.
pub fn log_recovery(vault_root: &Path, entry: RecoveryEntry) {
    if let Err(e) = append_entry(vault_root, &entry) {
        log::error!("could not write to recovery log: {}", e);
    }
}

fn append_entry(vault_root: &Path, entry: &RecoveryEntry) -> io::Result<()> {
    let path = recovery_log_path(vault_root);
    let needs_header = std::fs::metadata(&path).map_or(true, |m| m.len() == 0);

    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    if needs_header {
        file.write_all(FILE_HEADER.as_bytes())?;
    }
    file.write_all(entry.to_markdown().as_bytes())
}

/// Record a to-do line that left `source` without arriving anywhere.
pub fn log_lost_todo(vault_root: &Path, category: RecoveryCategory, source: &str, todo: &str, error: &str) {
    log_recovery(
        vault_root,
        RecoveryEntry {
            timestamp: Utc::now(),
            category,
            description: "to-do not written".to_string(),
            fields: vec![
                ("Source".to_string(), source.to_string()),
                ("Error".to_string(), error.to_string()),
            ],
            body: todo.to_string(),
        },
    );
}

// ---------------------------------------------------------------------------
// Reading entries
// ---------------------------------------------------------------------------

/// Read recovery entries, most recent first.
pub fn read_recovery_entries(vault_root: &Path, limit: Option<usize>) -> Vec<RecoveryEntry> {
    let content = match std::fs::read_to_string(recovery_log_path(vault_root)) {
        Ok(c) => c,
        Err(_) => return Vec::new(),
    };

    let mut entries = parse_entries(&content);
    if let Some(n) = limit {
        let skip = entries.len().saturating_sub(n);
        entries.drain(..skip);
    }
    entries.reverse();
    entries
}

fn parse_entries(content: &str) -> Vec<RecoveryEntry> {
    let mut entries = Vec::new();
    let mut lines = content.lines();

    while let Some(line) = lines.next() {
        let Some(mut entry) = line.strip_prefix("## ").and_then(parse_entry_header) else {
            continue;
        };

        let mut body_lines: Vec<&str> = Vec::new();
        let mut in_code_block = false;
        for line in lines.by_ref() {
            if in_code_block {
                if line == "```" {
                    in_code_block = false;
                } else {
                    body_lines.push(line);
                }
                continue;
            }
            if line == "---" {
                break;
            }
            if line.starts_with("```") {
                in_code_block = true;
            } else if let Some((key, value)) = line.split_once(": ") {
                entry.fields.push((key.to_string(), value.to_string()));
            }
        }
        entry.body = body_lines.join("\n");
        entries.push(entry);
    }

    entries
}

/// Parse `<timestamp> | <category>: <description>`.
fn parse_entry_header(header: &str) -> Option<RecoveryEntry> {
    let (ts, rest) = header.split_once(" | ")?;
    let (category, description) = rest.split_once(": ")?;
    let timestamp = DateTime::parse_from_rfc3339(ts).ok()?.with_timezone(&Utc);
    Some(RecoveryEntry {
        timestamp,
        category: RecoveryCategory::parse_category(category)?,
        description: description.to_string(),
        fields: Vec::new(),
        body: String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(desc: &str, body: &str) -> RecoveryEntry {
        RecoveryEntry {
            timestamp: DateTime::parse_from_rfc3339("2022-10-24T09:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            category: RecoveryCategory::Move,
            description: desc.to_string(),
            fields: vec![("Source".into(), "Daily/2022-10-24.md".into())],
            body: body.to_string(),
        }
    }

    #[test]
    fn atomic_write_replaces_content() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("note.md");
        atomic_write(&path, b"one").unwrap();
        atomic_write(&path, b"two").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "two");
    }

    #[test]
    fn log_and_read_back() {
        let tmp = TempDir::new().unwrap();
        log_recovery(tmp.path(), entry("first", "- [ ] a"));
        log_recovery(tmp.path(), entry("second", "- [ ] b\n- [ ] c"));

        let content = std::fs::read_to_string(recovery_log_path(tmp.path())).unwrap();
        assert!(content.starts_with("<!-- weekplan recovery log"));
        assert_eq!(content.matches("## 2022-10-24T09:00:00Z").count(), 2);

        let entries = read_recovery_entries(tmp.path(), None);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].description, "second");
        assert_eq!(entries[0].body, "- [ ] b\n- [ ] c");
        assert_eq!(entries[1], entry("first", "- [ ] a"));
    }

    #[test]
    fn limit_keeps_most_recent() {
        let tmp = TempDir::new().unwrap();
        for i in 0..5 {
            log_recovery(tmp.path(), entry(&format!("e{}", i), ""));
        }
        let entries = read_recovery_entries(tmp.path(), Some(2));
        let names: Vec<_> = entries.iter().map(|e| e.description.as_str()).collect();
        assert_eq!(names, vec!["e4", "e3"]);
    }

    #[test]
    fn missing_log_reads_empty() {
        let tmp = TempDir::new().unwrap();
        assert!(read_recovery_entries(tmp.path(), None).is_empty());
    }
}

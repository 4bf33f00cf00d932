use serde::{Deserialize, Serialize};

use crate::parse::todo::{header_name, is_header_line, is_todo, section_header};
use crate::parse::{frontmatter_line_count, join_lines, split_lines};

/// What an insert did to a note, in enough detail to reverse it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertOutcome {
    /// Indices (in the edited content) of every line the insert added
    pub inserted_lines: Vec<usize>,
    /// True when the section header did not exist and was created
    pub header_added: bool,
    /// Index of the section header in the edited content
    pub header_line: usize,
    /// Blank lines directly under an existing header that were collapsed
    #[serde(default)]
    pub blank_lines_removed: usize,
}

/// Which section to tidy up after a line is removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionCleanup {
    /// The `## ` section the removed line lived under
    Enclosing,
    /// The first `## <name>` section in the note, wherever the line was
    Named(String),
}

/// A section header removed because its last to-do went away.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollapsedHeader {
    /// Index the header occupied before removal
    pub line: usize,
    pub text: String,
    /// Whether a blank line directly after the header went with it
    pub trailing_blank: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Removed {
        /// Index of the removed line in the original content
        line: usize,
        collapsed: Option<CollapsedHeader>,
    },
    NotFound,
}

/// First line at or after `start` that reads exactly `## <name>` once trimmed.
pub fn find_header_line_from(lines: &[String], name: &str, start: usize) -> Option<usize> {
    let wanted = section_header(name);
    lines
        .iter()
        .enumerate()
        .skip(start)
        .find(|(_, l)| l.trim() == wanted)
        .map(|(i, _)| i)
}

pub fn find_header_line(lines: &[String], name: &str) -> Option<usize> {
    find_header_line_from(lines, name, 0)
}

fn is_blank(lines: &[String], idx: usize) -> bool {
    idx < lines.len() && lines[idx].trim().is_empty()
}

/// The empty string left after a final newline by [`split_lines`].
fn is_final_newline(lines: &[String], idx: usize) -> bool {
    idx + 1 == lines.len() && lines[idx].is_empty()
}

/// Insert `text` under the `## <header>` section, creating the section when
/// it is missing.
///
/// New sections go directly after any frontmatter (or at the top of the
/// note) as `## <header>`, `text`, blank line. Existing sections get `text`
/// appended after their current items, followed by exactly one blank line.
pub fn insert(content: &str, header: &str, text: &str) -> (String, InsertOutcome) {
    let mut lines = split_lines(content);
    let insert_start = frontmatter_line_count(content);

    let outcome = match find_header_line_from(&lines, header, insert_start) {
        Some(h) => {
            let mut blank_lines_removed = 0;
            while is_blank(&lines, h + 1) {
                lines.remove(h + 1);
                blank_lines_removed += 1;
            }

            let mut at = h + 1;
            while at < lines.len() && !lines[at].trim().is_empty() && !is_header_line(&lines[at]) {
                at += 1;
            }

            lines.insert(at, text.to_string());
            let mut inserted_lines = vec![at];
            if !is_blank(&lines, at + 1) {
                lines.insert(at + 1, String::new());
                inserted_lines.push(at + 1);
            }

            InsertOutcome {
                inserted_lines,
                header_added: false,
                header_line: h,
                blank_lines_removed,
            }
        }
        None => {
            let at = insert_start.min(lines.len());
            lines.splice(
                at..at,
                [section_header(header), text.to_string(), String::new()],
            );
            InsertOutcome {
                inserted_lines: vec![at, at + 1, at + 2],
                header_added: true,
                header_line: at,
                blank_lines_removed: 0,
            }
        }
    };

    log::debug!(
        "inserted under \"{}\" at lines {:?} (header added: {})",
        header,
        outcome.inserted_lines,
        outcome.header_added
    );
    (join_lines(&lines), outcome)
}

/// Remove the line `expected`, preferring index `line_number` and falling
/// back to its first occurrence anywhere in the note, then drop the section
/// named by `cleanup` if it no longer holds any to-do.
///
/// A missing line leaves the content untouched and reports
/// [`DeleteOutcome::NotFound`].
pub fn delete(
    content: &str,
    line_number: usize,
    expected: &str,
    cleanup: &SectionCleanup,
) -> (String, DeleteOutcome) {
    let mut lines = split_lines(content);

    let idx = if lines.get(line_number).is_some_and(|l| l == expected) {
        line_number
    } else {
        match lines.iter().position(|l| l == expected) {
            Some(i) => {
                log::debug!(
                    "line {} no longer matches, removing match at line {}",
                    line_number,
                    i
                );
                i
            }
            None => return (content.to_string(), DeleteOutcome::NotFound),
        }
    };
    lines.remove(idx);

    let body_start = frontmatter_line_count(content);
    let header_idx = match cleanup {
        SectionCleanup::Enclosing => enclosing_section(&lines, idx, body_start),
        SectionCleanup::Named(name) => find_header_line_from(&lines, name, body_start),
    };
    let collapsed = header_idx.and_then(|h| collapse_empty_section(&mut lines, h));

    (
        join_lines(&lines),
        DeleteOutcome::Removed {
            line: idx,
            collapsed,
        },
    )
}

/// Nearest `## ` header above `idx` (exclusive), not reaching into frontmatter.
fn enclosing_section(lines: &[String], idx: usize, body_start: usize) -> Option<usize> {
    let h = (body_start..idx.min(lines.len()))
        .rev()
        .find(|&i| is_header_line(&lines[i]))?;
    lines[h].trim().starts_with("## ").then_some(h)
}

/// Number of to-do lines in the section whose header sits at `header_idx`.
pub fn section_todo_count(lines: &[String], header_idx: usize) -> usize {
    lines
        .iter()
        .skip(header_idx + 1)
        .take_while(|l| !is_header_line(l))
        .filter(|l| is_todo(l))
        .count()
}

/// Remove the header at `header_idx` (and one blank line after it) when its
/// section holds no to-do lines.
pub fn collapse_empty_section(lines: &mut Vec<String>, header_idx: usize) -> Option<CollapsedHeader> {
    if header_idx >= lines.len() || section_todo_count(lines, header_idx) > 0 {
        return None;
    }
    let text = lines.remove(header_idx);
    let trailing_blank = is_blank(lines, header_idx) && !is_final_newline(lines, header_idx);
    if trailing_blank {
        lines.remove(header_idx);
    }
    log::debug!(
        "removed empty section \"{}\"",
        header_name(&text).unwrap_or(&text)
    );
    Some(CollapsedHeader {
        line: header_idx,
        text,
        trailing_blank,
    })
}

/// Remove the given line indices, highest first. Out-of-range indices are ignored.
pub fn remove_lines(content: &str, indices: &[usize]) -> String {
    let mut lines = split_lines(content);
    let mut sorted = indices.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    sorted.dedup();
    for idx in sorted {
        if idx < lines.len() {
            lines.remove(idx);
        }
    }
    join_lines(&lines)
}

/// Insert `new_lines` before index `at`, pushing later lines down.
///
/// Positions past the end land before the final newline, so the note keeps
/// ending the way it did.
pub fn insert_lines(content: &str, at: usize, new_lines: &[String]) -> String {
    let mut lines = split_lines(content);
    let last = lines.len() - 1;
    let limit = if lines[last].is_empty() { last } else { lines.len() };
    let at = at.min(limit);
    lines.splice(at..at, new_lines.iter().cloned());
    join_lines(&lines)
}

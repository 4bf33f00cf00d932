/// Marker that opens an unfinished to-do line.
pub const OPEN_MARKER: &str = "- [ ] ";

/// Marker that opens a completed to-do line.
pub const DONE_MARKER: &str = "- [x] ";

const DONE_MARKER_UPPER: &str = "- [X] ";

pub fn is_open_todo(line: &str) -> bool {
    line.trim_start().starts_with(OPEN_MARKER)
}

pub fn is_done_todo(line: &str) -> bool {
    let t = line.trim_start();
    t.starts_with(DONE_MARKER) || t.starts_with(DONE_MARKER_UPPER)
}

/// Whether a line is a to-do item, open or done.
pub fn is_todo(line: &str) -> bool {
    is_open_todo(line) || is_done_todo(line)
}

/// Whether a line is an ATX markdown header (`#` through `######` followed by a space).
///
/// A bare `#tag` at the start of a line is not a header.
pub fn is_header_line(line: &str) -> bool {
    let t = line.trim();
    let hashes = t.chars().take_while(|c| *c == '#').count();
    (1..=6).contains(&hashes) && t[hashes..].starts_with(' ')
}

/// The exact header line a named section is looked up by.
pub fn section_header(name: &str) -> String {
    format!("## {}", name)
}

/// Text of the header with its `#` prefix removed, if `line` is a header.
pub fn header_name(line: &str) -> Option<&str> {
    if !is_header_line(line) {
        return None;
    }
    Some(line.trim().trim_start_matches('#').trim())
}

/// Prefix `text` with the open marker unless it already is a to-do line.
pub fn ensure_todo(text: &str) -> String {
    let text = text.trim();
    if is_todo(text) {
        text.to_string()
    } else {
        format!("{}{}", OPEN_MARKER, text)
    }
}

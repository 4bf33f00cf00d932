use std::sync::LazyLock;

use regex::Regex;

/// A `---` fenced block at the very start of a note. The closing fence may
/// be the last line of the file.
static FRONTMATTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\A---\n(?s:.*?)\n---(?:\n|\z)").expect("valid frontmatter regex"));

/// Number of lines occupied by leading frontmatter, including both fences.
/// Returns 0 when the note has none.
pub fn frontmatter_line_count(content: &str) -> usize {
    match FRONTMATTER.find(content) {
        Some(m) => {
            let block = m.as_str();
            let newlines = block.matches('\n').count();
            if block.ends_with('\n') {
                newlines
            } else {
                newlines + 1
            }
        }
        None => 0,
    }
}

/// The frontmatter block itself, fences included.
pub fn frontmatter(content: &str) -> Option<&str> {
    FRONTMATTER.find(content).map(|m| m.as_str())
}

pub mod frontmatter;
pub mod todo;

pub use frontmatter::{frontmatter, frontmatter_line_count};
pub use todo::{is_done_todo, is_header_line, is_open_todo, is_todo, section_header};

/// Split note content into lines without losing the trailing newline.
///
/// `"a\nb\n"` becomes `["a", "b", ""]`, so [`join_lines`] restores the
/// exact original bytes.
pub fn split_lines(content: &str) -> Vec<String> {
    content.split('\n').map(|l| l.to_string()).collect()
}

/// Inverse of [`split_lines`].
pub fn join_lines(lines: &[String]) -> String {
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_join_is_lossless() {
        for text in ["", "\n", "a", "a\n", "a\n\nb\n\n", "---\nx: 1\n---"] {
            assert_eq!(join_lines(&split_lines(text)), text);
        }
    }
}

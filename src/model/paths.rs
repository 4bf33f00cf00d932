use chrono::NaiveDate;

use crate::model::settings::Settings;
use crate::util::dates::{format_date, parse_date};

/// Name of the inbox note inside the base directory
pub const INBOX_FILE: &str = "Inbox.md";

/// Vault path of the note for `date`: `<base_dir>/<YYYY-MM-DD>.md`.
pub fn day_file_name(settings: &Settings, date: NaiveDate) -> String {
    format!("{}/{}.md", settings.base_dir, format_date(date))
}

/// Vault path of the inbox note.
pub fn inbox_file_name(settings: &Settings) -> String {
    format!("{}/{}", settings.base_dir, INBOX_FILE)
}

/// Make a tag usable as a file name: drop a leading `#` and replace path
/// separators with spaces.
pub fn sanitize_tag(tag: &str) -> String {
    let tag = tag.trim();
    let tag = tag.strip_prefix('#').unwrap_or(tag);
    tag.replace(['/', '\\', ':'], " ").trim().to_string()
}

/// Vault path of the page collecting to-dos for `tag`.
pub fn tag_file_name(settings: &Settings, tag: &str) -> String {
    format!("{}/{}.md", settings.tag_base_folder, sanitize_tag(tag))
}

/// Turn the bare file name of an open note into its vault path.
///
/// Names that already carry a folder are taken as vault paths.
pub fn resolve_active_file(settings: &Settings, bare_filename: &str) -> String {
    let name = bare_filename.trim();
    if name.contains('/') {
        return name.to_string();
    }
    let name = if name.ends_with(".md") {
        name.to_string()
    } else {
        format!("{}.md", name)
    };
    format!("{}/{}", settings.base_dir, name)
}

/// The date a day note stands for, read from its file name.
///
/// Returns `None` for empty paths and for notes that are not day notes;
/// callers choose the fallback date.
pub fn date_from_file_name(path: &str) -> Option<NaiveDate> {
    let name = path.rsplit('/').next()?;
    let stem = name.strip_suffix(".md").unwrap_or(name);
    if stem.is_empty() {
        return None;
    }
    parse_date(stem).ok()
}

/// Folder part of a vault path, if any.
pub fn parent_folder(path: &str) -> Option<&str> {
    path.rfind('/').map(|i| &path[..i]).filter(|p| !p.is_empty())
}

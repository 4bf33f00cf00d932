use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::util::dates::{DEFAULT_WORKING_DAYS, is_valid_working_days};

/// Default folder for day notes and the inbox
pub const DEFAULT_BASE_DIR: &str = "Week Planner";

/// Default folder for tag pages
pub const DEFAULT_TAG_BASE_FOLDER: &str = "Tags";

/// Planner settings, stored in `weekplan.toml` at the vault root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Comma-separated weekday abbreviations, e.g. `Mon,Tue,Wed,Thu,Fri`
    #[serde(default = "default_working_days")]
    pub working_days: String,
    /// Folder (a single path segment) holding day notes and the inbox
    #[serde(default = "default_base_dir")]
    pub base_dir: String,
    /// Note used as the initial content of new day notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_note_template: Option<String>,
    /// Folder holding one page per tag
    #[serde(default = "default_tag_base_folder")]
    pub tag_base_folder: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            working_days: default_working_days(),
            base_dir: default_base_dir(),
            daily_note_template: None,
            tag_base_folder: default_tag_base_folder(),
        }
    }
}

fn default_working_days() -> String {
    DEFAULT_WORKING_DAYS.to_string()
}

fn default_base_dir() -> String {
    DEFAULT_BASE_DIR.to_string()
}

fn default_tag_base_folder() -> String {
    DEFAULT_TAG_BASE_FOLDER.to_string()
}

/// A base directory must be one non-empty path segment.
pub fn is_valid_base_dir(value: &str) -> bool {
    let v = value.trim();
    !v.is_empty()
        && v != "."
        && v != ".."
        && !v.contains(['/', '\\', ':'])
        && !v.chars().any(char::is_control)
}

/// Settings keys that can be changed from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    WorkingDays,
    BaseDir,
    DailyNoteTemplate,
    TagBaseFolder,
}

impl SettingKey {
    pub const ALL: [SettingKey; 4] = [
        SettingKey::WorkingDays,
        SettingKey::BaseDir,
        SettingKey::DailyNoteTemplate,
        SettingKey::TagBaseFolder,
    ];

    /// Key as written in `weekplan.toml`
    pub fn as_str(self) -> &'static str {
        match self {
            SettingKey::WorkingDays => "working_days",
            SettingKey::BaseDir => "base_dir",
            SettingKey::DailyNoteTemplate => "daily_note_template",
            SettingKey::TagBaseFolder => "tag_base_folder",
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('-', "_").to_ascii_lowercase();
        match normalized.as_str() {
            "working_days" | "workingdays" => Ok(SettingKey::WorkingDays),
            "base_dir" | "basedir" => Ok(SettingKey::BaseDir),
            "daily_note_template" | "dailynotetemplate" | "template" => {
                Ok(SettingKey::DailyNoteTemplate)
            }
            "tag_base_folder" | "tagbasefolder" => Ok(SettingKey::TagBaseFolder),
            _ => Err(format!(
                "unknown setting \"{}\" (expected one of: working_days, base_dir, daily_note_template, tag_base_folder)",
                s
            )),
        }
    }
}

/// Result of applying a user-supplied value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingChange {
    /// The value was accepted as given
    Applied,
    /// The value was rejected and the setting now holds `value`
    Reverted { value: String },
}

impl Settings {
    pub fn get(&self, key: SettingKey) -> String {
        match key {
            SettingKey::WorkingDays => self.working_days.clone(),
            SettingKey::BaseDir => self.base_dir.clone(),
            SettingKey::DailyNoteTemplate => self.daily_note_template.clone().unwrap_or_default(),
            SettingKey::TagBaseFolder => self.tag_base_folder.clone(),
        }
    }

    /// Apply `value` to `key`. Invalid working days fall back to the default
    /// week; an invalid base directory keeps the current one.
    pub fn apply(&mut self, key: SettingKey, value: &str) -> SettingChange {
        let value = value.trim();
        match key {
            SettingKey::WorkingDays => {
                if is_valid_working_days(value) {
                    self.working_days = value.to_string();
                    SettingChange::Applied
                } else {
                    self.working_days = default_working_days();
                    SettingChange::Reverted {
                        value: self.working_days.clone(),
                    }
                }
            }
            SettingKey::BaseDir => {
                if is_valid_base_dir(value) {
                    self.base_dir = value.to_string();
                    SettingChange::Applied
                } else {
                    SettingChange::Reverted {
                        value: self.base_dir.clone(),
                    }
                }
            }
            SettingKey::DailyNoteTemplate => {
                self.daily_note_template = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                };
                SettingChange::Applied
            }
            SettingKey::TagBaseFolder => {
                if value.is_empty() {
                    self.tag_base_folder = default_tag_base_folder();
                    SettingChange::Reverted {
                        value: self.tag_base_folder.clone(),
                    }
                } else {
                    self.tag_base_folder = value.trim_end_matches('/').to_string();
                    SettingChange::Applied
                }
            }
        }
    }

    /// Replace invalid loaded values with defaults, returning the keys that were reset.
    pub fn sanitize(&mut self) -> Vec<SettingKey> {
        let mut reset = Vec::new();
        if !is_valid_working_days(&self.working_days) {
            self.working_days = default_working_days();
            reset.push(SettingKey::WorkingDays);
        }
        if !is_valid_base_dir(&self.base_dir) {
            self.base_dir = default_base_dir();
            reset.push(SettingKey::BaseDir);
        }
        if self.tag_base_folder.trim().is_empty() {
            self.tag_base_folder = default_tag_base_folder();
            reset.push(SettingKey::TagBaseFolder);
        }
        reset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let s = Settings::default();
        assert_eq!(s.working_days, "Mon,Tue,Wed,Thu,Fri");
        assert_eq!(s.base_dir, "Week Planner");
        assert_eq!(s.tag_base_folder, "Tags");
        assert!(s.daily_note_template.is_none());
    }

    #[test]
    fn serde_defaults_on_empty_document() {
        let s: Settings = toml::from_str("").unwrap();
        assert_eq!(s, Settings::default());
    }

    #[test]
    fn invalid_working_days_revert_to_default() {
        let mut s = Settings::default();
        assert_eq!(s.apply(SettingKey::WorkingDays, "Mon,Wed"), SettingChange::Applied);
        assert_eq!(s.working_days, "Mon,Wed");
        assert_eq!(
            s.apply(SettingKey::WorkingDays, "Mon,Blursday"),
            SettingChange::Reverted {
                value: "Mon,Tue,Wed,Thu,Fri".into()
            }
        );
        assert_eq!(s.working_days, "Mon,Tue,Wed,Thu,Fri");
    }

    #[test]
    fn base_dir_rejects_separators_and_keeps_last_good() {
        let mut s = Settings::default();
        assert_eq!(s.apply(SettingKey::BaseDir, "Daily"), SettingChange::Applied);
        for bad in ["a/b", "a\\b", "C:", "", "..", "Daily\nbase_dir = 1"] {
            assert_eq!(
                s.apply(SettingKey::BaseDir, bad),
                SettingChange::Reverted {
                    value: "Daily".into()
                }
            );
        }
        assert_eq!(s.base_dir, "Daily");
        assert_eq!(s.apply(SettingKey::BaseDir, "My \"Plans\""), SettingChange::Applied);
    }

    #[test]
    fn empty_template_clears_it() {
        let mut s = Settings::default();
        s.apply(SettingKey::DailyNoteTemplate, "Templates/Daily");
        assert_eq!(s.daily_note_template.as_deref(), Some("Templates/Daily"));
        s.apply(SettingKey::DailyNoteTemplate, "  ");
        assert!(s.daily_note_template.is_none());
    }

    #[test]
    fn sanitize_resets_bad_values() {
        let mut s = Settings {
            working_days: "Nope".into(),
            base_dir: "x/y".into(),
            daily_note_template: None,
            tag_base_folder: "_tags".into(),
        };
        let reset = s.sanitize();
        assert_eq!(reset, vec![SettingKey::WorkingDays, SettingKey::BaseDir]);
        assert_eq!(s.working_days, DEFAULT_WORKING_DAYS);
        assert_eq!(s.base_dir, DEFAULT_BASE_DIR);
        assert_eq!(s.tag_base_folder, "_tags");
    }

    #[test]
    fn key_parsing_accepts_variants() {
        assert_eq!("working-days".parse::<SettingKey>(), Ok(SettingKey::WorkingDays));
        assert_eq!("baseDir".parse::<SettingKey>(), Ok(SettingKey::BaseDir));
        assert_eq!("template".parse::<SettingKey>(), Ok(SettingKey::DailyNoteTemplate));
        assert!("colour".parse::<SettingKey>().is_err());
    }
}

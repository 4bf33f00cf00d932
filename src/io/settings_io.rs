use std::fs;
use std::path::{Path, PathBuf};

use crate::io::recovery::atomic_write;
use crate::model::settings::{SettingChange, SettingKey, Settings};

/// Settings file name at the vault root
pub const SETTINGS_FILE: &str = "weekplan.toml";

const SETTINGS_TEMPLATE: &str = r##"# weekplan settings

# Days that count as working days when moving to-dos to the next or
# previous day. Comma-separated: Mon,Tue,Wed,Thu,Fri,Sat,Sun
working_days = "Mon,Tue,Wed,Thu,Fri"

# Folder for day notes (YYYY-MM-DD.md) and Inbox.md. A single folder name.
base_dir = "Week Planner"

# Folder for tag pages
tag_base_folder = "Tags"

# Note used as the starting content of new day notes.
# {{date}} and {{title}} are replaced with the note's date.
# daily_note_template = "Templates/Daily"
"##;

/// Error type for settings I/O
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("not a weekplan vault: no {SETTINGS_FILE} found")]
    NotAVault,
    #[error("weekplan vault already exists at {0}")]
    AlreadyExists(PathBuf),
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {SETTINGS_FILE}: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("could not edit {SETTINGS_FILE}: {0}")]
    EditError(#[from] toml_edit::TomlError),
}

/// Settings loaded from disk, with the keys that had to fall back to defaults
#[derive(Debug, Clone)]
pub struct LoadedSettings {
    pub settings: Settings,
    pub reset: Vec<SettingKey>,
}

pub fn settings_path(vault_root: &Path) -> PathBuf {
    vault_root.join(SETTINGS_FILE)
}

/// Find the vault by walking up from `start`, looking for `weekplan.toml`.
pub fn discover_vault(start: &Path) -> Result<PathBuf, SettingsError> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(SETTINGS_FILE).is_file() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(SettingsError::NotAVault);
        }
    }
}

fn read_text(path: &Path) -> Result<String, SettingsError> {
    fs::read_to_string(path).map_err(|e| SettingsError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })
}

fn write_text(path: &Path, text: &str) -> Result<(), SettingsError> {
    atomic_write(path, text.as_bytes()).map_err(|e| SettingsError::WriteError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Load settings, replacing invalid values with defaults.
///
/// Reset values are only corrected in memory; the file is rewritten the
/// next time a setting is changed.
pub fn load_settings(vault_root: &Path) -> Result<LoadedSettings, SettingsError> {
    let text = read_text(&settings_path(vault_root))?;
    let mut settings: Settings = toml::from_str(&text)?;
    let reset = settings.sanitize();
    for key in &reset {
        log::warn!(
            "invalid {} in {}, using \"{}\"",
            key,
            SETTINGS_FILE,
            settings.get(*key)
        );
    }
    Ok(LoadedSettings { settings, reset })
}

/// Write a fresh settings file into `vault_root`.
pub fn init_settings(vault_root: &Path, base_dir: &str) -> Result<PathBuf, SettingsError> {
    let path = settings_path(vault_root);
    if path.exists() {
        return Err(SettingsError::AlreadyExists(vault_root.to_path_buf()));
    }
    let mut doc: toml_edit::DocumentMut = SETTINGS_TEMPLATE.parse()?;
    let settings = Settings {
        base_dir: base_dir.to_string(),
        ..Settings::default()
    };
    set_in_document(&mut doc, &settings, SettingKey::BaseDir);
    write_text(&path, &doc.to_string())?;
    Ok(path)
}

/// Store `settings[key]` in the document, keeping comments and layout.
pub fn set_in_document(doc: &mut toml_edit::DocumentMut, settings: &Settings, key: SettingKey) {
    match key {
        SettingKey::DailyNoteTemplate => match &settings.daily_note_template {
            Some(template) => doc[key.as_str()] = toml_edit::value(template.as_str()),
            None => {
                doc.remove(key.as_str());
            }
        },
        _ => doc[key.as_str()] = toml_edit::value(settings.get(key)),
    }
}

/// Apply `value` to `key` and persist the result immediately. Whatever the
/// setting ends up holding (the new value or its fallback) is written.
pub fn update_setting(
    vault_root: &Path,
    settings: &mut Settings,
    key: SettingKey,
    value: &str,
) -> Result<SettingChange, SettingsError> {
    let path = settings_path(vault_root);
    let mut doc: toml_edit::DocumentMut = read_text(&path)?.parse()?;

    let change = settings.apply(key, value);
    if let SettingChange::Reverted { value: kept } = &change {
        log::warn!("rejected {} = \"{}\", keeping \"{}\"", key, value, kept);
    }

    set_in_document(&mut doc, settings, key);
    write_text(&path, &doc.to_string())?;
    Ok(change)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn init_then_load() {
        let tmp = TempDir::new().unwrap();
        init_settings(tmp.path(), "Daily").unwrap();
        let loaded = load_settings(tmp.path()).unwrap();
        assert_eq!(loaded.settings.base_dir, "Daily");
        assert_eq!(loaded.settings.working_days, "Mon,Tue,Wed,Thu,Fri");
        assert!(loaded.settings.daily_note_template.is_none());
        assert!(loaded.reset.is_empty());

        assert!(matches!(
            init_settings(tmp.path(), "Daily"),
            Err(SettingsError::AlreadyExists(_))
        ));
    }

    #[test]
    fn init_escapes_base_dir() {
        let tmp = TempDir::new().unwrap();
        init_settings(tmp.path(), "My \"Plans\" 2022").unwrap();
        let loaded = load_settings(tmp.path()).unwrap();
        assert_eq!(loaded.settings.base_dir, "My \"Plans\" 2022");
        assert!(loaded.reset.is_empty());

        let text = fs::read_to_string(settings_path(tmp.path())).unwrap();
        assert!(text.contains("# Folder for day notes"));
    }

    #[test]
    fn discover_from_subfolder() {
        let tmp = TempDir::new().unwrap();
        init_settings(tmp.path(), "Daily").unwrap();
        let sub = tmp.path().join("Daily").join("deeper");
        fs::create_dir_all(&sub).unwrap();
        assert_eq!(discover_vault(&sub).unwrap(), tmp.path());
    }

    #[test]
    fn discover_fails_outside_vault() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(discover_vault(tmp.path()), Err(SettingsError::NotAVault)));
    }

    #[test]
    fn invalid_values_are_reset_on_load() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            settings_path(tmp.path()),
            "working_days = \"Mon,Someday\"\nbase_dir = \"a/b\"\n",
        )
        .unwrap();
        let loaded = load_settings(tmp.path()).unwrap();
        assert_eq!(loaded.settings.working_days, "Mon,Tue,Wed,Thu,Fri");
        assert_eq!(loaded.settings.base_dir, "Week Planner");
        assert_eq!(loaded.reset, vec![SettingKey::WorkingDays, SettingKey::BaseDir]);
    }

    #[test]
    fn update_preserves_comments() {
        let tmp = TempDir::new().unwrap();
        init_settings(tmp.path(), "Daily").unwrap();
        let mut settings = load_settings(tmp.path()).unwrap().settings;

        let change = update_setting(tmp.path(), &mut settings, SettingKey::WorkingDays, "Mon,Wed").unwrap();
        assert_eq!(change, SettingChange::Applied);

        let text = fs::read_to_string(settings_path(tmp.path())).unwrap();
        assert!(text.contains("working_days = \"Mon,Wed\""));
        assert!(text.contains("# Folder for tag pages"));
        assert_eq!(load_settings(tmp.path()).unwrap().settings.working_days, "Mon,Wed");
    }

    #[test]
    fn rejected_update_persists_fallback() {
        let tmp = TempDir::new().unwrap();
        init_settings(tmp.path(), "Daily").unwrap();
        let mut settings = load_settings(tmp.path()).unwrap().settings;
        update_setting(tmp.path(), &mut settings, SettingKey::WorkingDays, "Sat").unwrap();

        let change = update_setting(tmp.path(), &mut settings, SettingKey::WorkingDays, "nope").unwrap();
        assert!(matches!(change, SettingChange::Reverted { .. }));
        assert_eq!(
            load_settings(tmp.path()).unwrap().settings.working_days,
            "Mon,Tue,Wed,Thu,Fri"
        );
    }

    #[test]
    fn template_can_be_set_and_cleared() {
        let tmp = TempDir::new().unwrap();
        init_settings(tmp.path(), "Daily").unwrap();
        let mut settings = load_settings(tmp.path()).unwrap().settings;

        update_setting(tmp.path(), &mut settings, SettingKey::DailyNoteTemplate, "Templates/Day").unwrap();
        let loaded = load_settings(tmp.path()).unwrap().settings;
        assert_eq!(loaded.daily_note_template.as_deref(), Some("Templates/Day"));

        update_setting(tmp.path(), &mut settings, SettingKey::DailyNoteTemplate, "").unwrap();
        let loaded = load_settings(tmp.path()).unwrap().settings;
        assert!(loaded.daily_note_template.is_none());
    }
}

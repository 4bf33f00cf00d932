use chrono::NaiveDate;

use crate::io::vault::{Entry, Vault, VaultError};
use crate::model::paths::{day_file_name, parent_folder};
use crate::model::settings::Settings;
use crate::util::dates::{self, DateError, format_date};

/// Error type for day-note operations
#[derive(Debug, thiserror::Error)]
pub enum DailyError {
    #[error("daily note template not found: {0}")]
    TemplateNotFound(String),
    #[error(transparent)]
    Vault(#[from] VaultError),
    #[error(transparent)]
    Date(#[from] DateError),
}

/// Which day note to open, relative to a reference date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayOffset {
    Today,
    NextWorkingDay,
    PreviousWorkingDay,
}

/// A note that is known to exist after an `ensure_*` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnsuredNote {
    pub path: String,
    pub created: bool,
}

/// Create `path` with `initial` content if nothing exists there yet,
/// creating its folder first.
pub fn ensure_note<V: Vault + ?Sized>(
    vault: &mut V,
    path: &str,
    initial: &str,
) -> Result<EnsuredNote, VaultError> {
    match vault.stat(path) {
        Entry::File => Ok(EnsuredNote {
            path: path.to_string(),
            created: false,
        }),
        Entry::Folder => Err(VaultError::NotAFile(path.to_string())),
        Entry::NotFound => {
            if let Some(folder) = parent_folder(path)
                && !vault.exists(folder)
            {
                vault.create_folder(folder)?;
            }
            vault.create(path, initial)?;
            log::info!("created {}", path);
            Ok(EnsuredNote {
                path: path.to_string(),
                created: true,
            })
        }
    }
}

/// Vault path of the configured template, with `.md` added when missing.
pub fn template_path(settings: &Settings) -> Option<String> {
    let raw = settings.daily_note_template.as_deref()?.trim();
    if raw.is_empty() {
        return None;
    }
    Some(if raw.ends_with(".md") {
        raw.to_string()
    } else {
        format!("{}.md", raw)
    })
}

/// Fill `{{date}}` and `{{title}}` placeholders for the note of `date`.
pub fn render_template(template: &str, date: NaiveDate) -> String {
    let formatted = format_date(date);
    template
        .replace("{{date}}", &formatted)
        .replace("{{title}}", &formatted)
}

/// Make sure the note for `date` exists, seeding it from the daily template.
pub fn ensure_day_note<V: Vault + ?Sized>(
    vault: &mut V,
    settings: &Settings,
    date: NaiveDate,
) -> Result<EnsuredNote, DailyError> {
    let path = day_file_name(settings, date);
    if vault.stat(&path) == Entry::File {
        return Ok(EnsuredNote {
            path,
            created: false,
        });
    }

    let initial = match template_path(settings) {
        Some(template) => match vault.read(&template) {
            Ok(text) => render_template(&text, date),
            Err(e) if e.is_not_found() => return Err(DailyError::TemplateNotFound(template)),
            Err(e) => return Err(e.into()),
        },
        None => String::new(),
    };

    Ok(ensure_note(vault, &path, &initial)?)
}

/// The date `offset` points at, counted from `reference`.
pub fn resolve_day(
    settings: &Settings,
    offset: DayOffset,
    reference: NaiveDate,
) -> Result<NaiveDate, DateError> {
    match offset {
        DayOffset::Today => Ok(reference),
        DayOffset::NextWorkingDay => dates::next_working_day(&settings.working_days, reference),
        DayOffset::PreviousWorkingDay => {
            dates::previous_working_day(&settings.working_days, reference)
        }
    }
}

/// Open (creating if needed) the note `offset` days from `today`.
pub fn open_relative_day<V: Vault + ?Sized>(
    vault: &mut V,
    settings: &Settings,
    offset: DayOffset,
    today: NaiveDate,
) -> Result<EnsuredNote, DailyError> {
    let date = resolve_day(settings, offset, today)?;
    ensure_day_note(vault, settings, date)
}

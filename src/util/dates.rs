use chrono::{Datelike, Local, NaiveDate, Weekday};

/// The one date format used for display, parsing, and day-note file names.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Working days used when the configured value is missing or invalid.
pub const DEFAULT_WORKING_DAYS: &str = "Mon,Tue,Wed,Thu,Fri";

/// Upper bound on the number of days a working-day search may step.
pub const MAX_SEARCH_DAYS: u32 = 366;

const WEEKDAY_ABBREVIATIONS: [(&str, Weekday); 7] = [
    ("Mon", Weekday::Mon),
    ("Tue", Weekday::Tue),
    ("Wed", Weekday::Wed),
    ("Thu", Weekday::Thu),
    ("Fri", Weekday::Fri),
    ("Sat", Weekday::Sat),
    ("Sun", Weekday::Sun),
];

/// Error type for date and calendar operations
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DateError {
    #[error("invalid working days \"{0}\": expected a comma-separated list like Mon,Tue,Wed")]
    InvalidWorkingDays(String),
    #[error("no working day found within {MAX_SEARCH_DAYS} days of {0}")]
    NoWorkingDay(NaiveDate),
    #[error("invalid date \"{0}\": expected YYYY-MM-DD")]
    InvalidDate(String),
}

/// A parsed set of working days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkingDays {
    mask: u8,
}

impl WorkingDays {
    pub fn contains(&self, day: Weekday) -> bool {
        self.mask & (1 << day.num_days_from_monday()) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.mask == 0
    }

    pub fn days(&self) -> Vec<Weekday> {
        WEEKDAY_ABBREVIATIONS
            .iter()
            .map(|(_, d)| *d)
            .filter(|d| self.contains(*d))
            .collect()
    }
}

fn weekday_from_abbreviation(token: &str) -> Option<Weekday> {
    WEEKDAY_ABBREVIATIONS
        .iter()
        .find(|(abbr, _)| *abbr == token)
        .map(|(_, d)| *d)
}

fn abbreviation(day: Weekday) -> &'static str {
    WEEKDAY_ABBREVIATIONS[day.num_days_from_monday() as usize].0
}

/// Parse a working-days string such as `"Mon,Tue,Wed,Thu,Fri"`.
///
/// Tokens may carry surrounding whitespace but are otherwise matched exactly.
/// An empty string or any unrecognized token rejects the whole value.
pub fn parse_working_days(day_list: &str) -> Result<WorkingDays, DateError> {
    let mut mask = 0u8;
    for token in day_list.split(',') {
        let day = weekday_from_abbreviation(token.trim())
            .ok_or_else(|| DateError::InvalidWorkingDays(day_list.to_string()))?;
        mask |= 1 << day.num_days_from_monday();
    }
    if mask == 0 {
        return Err(DateError::InvalidWorkingDays(day_list.to_string()));
    }
    Ok(WorkingDays { mask })
}

/// Whether `day_list` is an acceptable working-days setting.
pub fn is_valid_working_days(day_list: &str) -> bool {
    parse_working_days(day_list).is_ok()
}

/// Whether `date` falls on one of the days named in `day_list`.
pub fn is_working_day(date: NaiveDate, day_list: &str) -> Result<bool, DateError> {
    let days = parse_working_days(day_list)?;
    Ok(days.contains(date.weekday()))
}

/// The first working day strictly after `from`.
pub fn next_working_day(day_list: &str, from: NaiveDate) -> Result<NaiveDate, DateError> {
    step_to_working_day(day_list, from, 1)
}

/// The last working day strictly before `from`.
pub fn previous_working_day(day_list: &str, from: NaiveDate) -> Result<NaiveDate, DateError> {
    step_to_working_day(day_list, from, -1)
}

fn step_to_working_day(day_list: &str, from: NaiveDate, step: i64) -> Result<NaiveDate, DateError> {
    let days = parse_working_days(day_list)?;
    let mut date = from;
    for _ in 0..MAX_SEARCH_DAYS {
        date = date
            .checked_add_signed(chrono::Duration::days(step))
            .ok_or(DateError::NoWorkingDay(from))?;
        if days.contains(date.weekday()) {
            return Ok(date);
        }
    }
    Err(DateError::NoWorkingDay(from))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_date(s: &str) -> Result<NaiveDate, DateError> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|_| DateError::InvalidDate(s.to_string()))
}

/// Today's date in the local timezone.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Render a working-day set back into its settings form.
pub fn format_working_days(days: &WorkingDays) -> String {
    days.days()
        .into_iter()
        .map(abbreviation)
        .collect::<Vec<_>>()
        .join(",")
}

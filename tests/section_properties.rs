use chrono::{Datelike, Duration, NaiveDate, Weekday};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;

use weekplan::io::vault::{MemoryVault, Vault};
use weekplan::model::settings::Settings;
use weekplan::ops::move_ops::{self, Destination, MoveRequest};
use weekplan::ops::section_ops::{self, DeleteOutcome, SectionCleanup};
use weekplan::ops::undo::UndoLog;
use weekplan::parse::{frontmatter, split_lines, todo};
use weekplan::util::dates;

const FIXTURES: &[&str] = &[
    "day_note.md",
    "inbox.md",
    "plain_note.md",
    "no_final_newline.md",
    "empty.md",
];

fn load_fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("Could not read fixture {}: {}", name, e))
}

fn todo_lines(content: &str) -> Vec<usize> {
    let body_start = frontmatter::frontmatter_line_count(content);
    split_lines(content)
        .iter()
        .enumerate()
        .filter(|(i, l)| *i >= body_start && todo::is_todo(l))
        .map(|(i, _)| i)
        .collect()
}

fn date(s: &str) -> NaiveDate {
    dates::parse_date(s).unwrap()
}

// ============================================================================
// Section editor
// ============================================================================

/// Whether a to-do sits in the body before the first header, where a new
/// section placed at the top of the body would take it in.
fn has_loose_todo(content: &str) -> bool {
    let body_start = frontmatter::frontmatter_line_count(content);
    split_lines(content)
        .iter()
        .skip(body_start)
        .take_while(|l| !todo::is_header_line(l))
        .any(|l| todo::is_todo(l))
}

#[test]
fn insert_then_delete_under_new_header() {
    for name in FIXTURES {
        let original = load_fixture(name);
        let (inserted, outcome) = section_ops::insert(&original, "Someday", "- [ ] learn to juggle");
        assert!(outcome.header_added, "{}", name);

        let todo_idx = outcome.header_line + 1;
        let (restored, deleted) = section_ops::delete(
            &inserted,
            todo_idx,
            "- [ ] learn to juggle",
            &SectionCleanup::Enclosing,
        );

        if has_loose_todo(&original) {
            // the loose to-do now belongs to the new section, which keeps it
            assert!(
                matches!(deleted, DeleteOutcome::Removed { collapsed: None, .. }),
                "{}",
                name
            );
            let body_start = frontmatter::frontmatter_line_count(&original);
            let expected = section_ops::insert_lines(
                &original,
                body_start,
                &["## Someday".to_string(), String::new()],
            );
            assert_eq!(restored, expected, "{}", name);
        } else {
            assert!(
                matches!(deleted, DeleteOutcome::Removed { collapsed: Some(_), .. }),
                "{}",
                name
            );
            assert_eq!(restored, original, "insert/delete changed fixture {}", name);
        }
    }
}

#[test]
fn loose_todo_fixture_is_covered() {
    assert!(has_loose_todo(&load_fixture("plain_note.md")));
    assert!(!has_loose_todo(&load_fixture("inbox.md")));
}

#[test]
fn repeated_inserts_land_together_under_one_header() {
    for name in FIXTURES {
        let mut content = load_fixture(name);
        for i in 0..3 {
            content = section_ops::insert(&content, "Someday", &format!("- [ ] item {}", i)).0;
        }
        let lines = split_lines(&content);
        let headers: Vec<usize> = lines
            .iter()
            .enumerate()
            .filter(|(_, l)| l.as_str() == "## Someday")
            .map(|(i, _)| i)
            .collect();
        assert_eq!(headers.len(), 1, "{}", name);
        let h = headers[0];
        assert_eq!(
            &lines[h + 1..h + 4],
            &["- [ ] item 0", "- [ ] item 1", "- [ ] item 2"],
            "{}",
            name
        );
    }
}

#[test]
fn frontmatter_survives_edits() {
    let original = load_fixture("day_note.md");
    let fm = frontmatter::frontmatter(&original).unwrap().to_string();

    let (inserted, _) = section_ops::insert(&original, "Tasks", "- [ ] water plants");
    assert!(inserted.starts_with(&fm));

    let (inserted, _) = section_ops::insert(&inserted, "Brand New", "- [ ] water plants");
    assert!(inserted.starts_with(&fm));

    let idx = todo_lines(&inserted)[0];
    let line = split_lines(&inserted)[idx].clone();
    let (deleted, _) = section_ops::delete(&inserted, idx, &line, &SectionCleanup::Enclosing);
    assert!(deleted.starts_with(&fm));
}

// ============================================================================
// Move and undo
// ============================================================================

#[test]
fn move_then_undo_restores_both_notes() {
    let settings = Settings {
        base_dir: "Daily".into(),
        ..Settings::default()
    };
    let dest_original = "## Inbox\n\n- [ ] existing\n";

    for name in FIXTURES {
        let original = load_fixture(name);
        for line in todo_lines(&original) {
            let mut vault = MemoryVault::new()
                .with_file("Daily/2022-10-21.md", &original)
                .with_file("Tags/home.md", dest_original);
            let mut log = UndoLog::new();

            let request = MoveRequest {
                source: "Daily/2022-10-21.md".into(),
                line,
                destination: Destination::Note("Tags/home.md".into()),
                header: "Inbox".into(),
                today: date("2022-10-21"),
            };
            move_ops::move_task(&mut vault, &settings, &mut log, &request).unwrap();
            assert_eq!(log.len(), 1);

            move_ops::undo_last(&mut vault, &mut log).unwrap();
            assert!(log.is_empty());
            assert_eq!(
                vault.get("Daily/2022-10-21.md"),
                Some(original.as_str()),
                "source of {} line {}",
                name,
                line
            );
            assert_eq!(vault.get("Tags/home.md"), Some(dest_original), "{} line {}", name, line);
        }
    }
}

#[test]
fn same_note_move_then_undo_restores_note() {
    let settings = Settings::default();

    for name in FIXTURES {
        let original = load_fixture(name);
        for line in todo_lines(&original) {
            let mut vault = MemoryVault::new().with_file("Notes/week.md", &original);
            let mut log = UndoLog::new();

            let request = MoveRequest {
                source: "Notes/week.md".into(),
                line,
                destination: Destination::Note("Notes/week.md".into()),
                header: "Later".into(),
                today: date("2022-10-21"),
            };
            let action = move_ops::move_task(&mut vault, &settings, &mut log, &request).unwrap();
            let moved = vault.read("Notes/week.md").unwrap();
            assert_eq!(
                split_lines(&moved).iter().filter(|l| **l == action.task_content).count(),
                split_lines(&original).iter().filter(|l| **l == action.task_content).count(),
                "{} line {}",
                name,
                line
            );

            move_ops::undo_last(&mut vault, &mut log).unwrap();
            assert_eq!(vault.get("Notes/week.md"), Some(original.as_str()), "{} line {}", name, line);
        }
    }
}

// ============================================================================
// Working days
// ============================================================================

#[test]
fn next_working_day_is_later_and_working() {
    for day_list in ["Mon,Tue,Wed,Thu,Fri", "Sat,Sun", "Wed", "Mon,Tue,Wed,Thu,Fri,Sat,Sun"] {
        let mut day = date("2022-01-01");
        for _ in 0..400 {
            let next = dates::next_working_day(day_list, day).unwrap();
            assert!(next > day);
            assert!(next - day <= Duration::days(7));
            assert!(dates::is_working_day(next, day_list).unwrap());

            let prev = dates::previous_working_day(day_list, day).unwrap();
            assert!(prev < day);
            assert!(dates::is_working_day(prev, day_list).unwrap());
            day += Duration::days(1);
        }
    }
}

#[test]
fn weekend_skips_to_monday() {
    let saturday = date("2022-10-22");
    assert_eq!(saturday.weekday(), Weekday::Sat);
    let next = dates::next_working_day("Mon,Tue,Wed,Thu,Fri", saturday).unwrap();
    assert_eq!(dates::format_date(next), "2022-10-24");
}

#[test]
fn date_format_round_trips() {
    let mut day = date("2020-02-27");
    for _ in 0..800 {
        assert_eq!(dates::parse_date(&dates::format_date(day)).unwrap(), day);
        day += Duration::days(1);
    }
}

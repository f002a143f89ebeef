//! Filename normalization and date prefixes.
//!
//! Organized files are named `YYYY-MM-DD-<sanitized name>`. This module holds the
//! pure string rules behind that layout: stripping characters that are illegal on
//! common filesystems, detecting an existing date prefix, and building a new one.
//!
//! # Examples
//!
//! ```
//! use chrono::{Datelike, NaiveDate};
//! use dirsort::filename::{create_dated_filename, parse_date_prefix, sanitize};
//!
//! assert_eq!(sanitize("My Holiday_photo.jpg"), "My-Holiday-photo.jpg");
//!
//! let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
//! let dated = create_dated_filename("photo.jpg", date);
//! assert_eq!(dated, "2024-03-01-photo.jpg");
//! assert_eq!(parse_date_prefix(&dated), Some(date));
//! ```

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use std::sync::LazyLock;

/// Format of the date part of a prefix.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Separator between the date and the rest of the name.
pub const DATE_SEPARATOR: char = '-';

/// Length of `YYYY-MM-DD`.
const DATE_LEN: usize = 10;

/// Length of `YYYY-MM-DD-`.
pub const PREFIX_LEN: usize = DATE_LEN + 1;

static INVALID_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*]"#).expect("invalid-chars pattern compiles"));

static HYPHEN_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-+").expect("hyphen-run pattern compiles"));

/// Sanitizes a filename.
///
/// Removes `< > : " / \ | ? *`, turns spaces and underscores into hyphens,
/// collapses hyphen runs and trims hyphens at both ends. The result may be
/// empty; callers decide whether that is usable.
pub fn sanitize(name: &str) -> String {
    let clean = INVALID_CHARS.replace_all(name, "");
    let clean = clean.replace([' ', '_'], "-");
    let clean = HYPHEN_RUNS.replace_all(&clean, "-");
    clean.trim_matches('-').to_string()
}

/// Returns the date encoded in a valid `YYYY-MM-DD-` prefix.
///
/// The first ten characters must be a real calendar date from year 1 on, in
/// exactly that layout, and the eleventh must be `-`. Anything else, including
/// names that are too short, yields `None`.
pub fn parse_date_prefix(name: &str) -> Option<NaiveDate> {
    let bytes = name.as_bytes();
    if bytes.get(DATE_LEN) != Some(&(DATE_SEPARATOR as u8)) {
        return None;
    }

    let date_part = &bytes[..DATE_LEN];
    let layout_ok = date_part.iter().enumerate().all(|(i, b)| match i {
        4 | 7 => *b == b'-',
        _ => b.is_ascii_digit(),
    });
    if !layout_ok {
        return None;
    }

    // Only ASCII bytes so far, so the slice sits on a char boundary.
    NaiveDate::parse_from_str(&name[..DATE_LEN], DATE_FORMAT)
        .ok()
        .filter(|date| date.year() >= 1)
}

/// True when `name` starts with a valid date prefix.
pub fn has_date_prefix(name: &str) -> bool {
    parse_date_prefix(name).is_some()
}

/// Builds `YYYY-MM-DD-<sanitized name>` for the given date.
///
/// If the sanitized name already carries a valid prefix, that prefix is
/// replaced rather than stacked.
pub fn create_dated_filename(original_name: &str, date: NaiveDate) -> String {
    let prefix = format!("{}{}", date.format(DATE_FORMAT), DATE_SEPARATOR);
    let clean = sanitize(original_name);

    let rest = if has_date_prefix(&clean) {
        &clean[PREFIX_LEN..]
    } else {
        clean.as_str()
    };

    format!("{prefix}{rest}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_sanitize_removes_invalid_characters() {
        assert_eq!(sanitize(r#"a<b>c:d"e/f\g|h?i*j.txt"#), "abcdefghij.txt");
    }

    #[test]
    fn test_sanitize_replaces_spaces_and_underscores() {
        assert_eq!(sanitize("my file_name.txt"), "my-file-name.txt");
    }

    #[test]
    fn test_sanitize_collapses_and_trims_hyphens() {
        assert_eq!(sanitize("--a  __ b--.txt-"), "a-b-.txt");
        assert_eq!(sanitize("_ leading and trailing _"), "leading-and-trailing");
    }

    #[test]
    fn test_sanitize_can_produce_empty_name() {
        assert_eq!(sanitize("___"), "");
        assert_eq!(sanitize("???"), "");
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let samples = [
            "My Report (final)_v2.pdf",
            "--a  __ b--.txt-",
            r#"we<ird>:na"me|?.txt"#,
            "2024-01-01 notes.md",
            "ünïcödé файл.txt",
            "- - -",
            "",
        ];
        for name in samples {
            let once = sanitize(name);
            assert_eq!(sanitize(&once), once, "not idempotent for {name:?}");
        }
    }

    #[test]
    fn test_parse_date_prefix_valid() {
        assert_eq!(
            parse_date_prefix("2024-01-01-report.pdf"),
            Some(date(2024, 1, 1))
        );
        assert_eq!(parse_date_prefix("2020-02-29-x"), Some(date(2020, 2, 29)));
    }

    #[test]
    fn test_parse_date_prefix_requires_separator() {
        assert_eq!(parse_date_prefix("2024-01-01report.pdf"), None);
        assert_eq!(parse_date_prefix("2024-01-01_report.pdf"), None);
        assert_eq!(parse_date_prefix("2024-01-01"), None);
    }

    #[test]
    fn test_parse_date_prefix_rejects_bad_dates() {
        assert_eq!(parse_date_prefix("2024-13-01-x"), None);
        assert_eq!(parse_date_prefix("2024-01-32-x"), None);
        assert_eq!(parse_date_prefix("2023-02-29-x"), None);
        assert_eq!(parse_date_prefix("abcd-01-01-x"), None);
        assert_eq!(parse_date_prefix("2024-1-01--x"), None);
    }

    #[test]
    fn test_parse_date_prefix_rejects_year_zero() {
        assert_eq!(parse_date_prefix("0000-01-01-x"), None);
        assert_eq!(parse_date_prefix("0001-01-01-x"), Some(date(1, 1, 1)));
    }

    #[test]
    fn test_parse_date_prefix_short_and_multibyte_names() {
        assert_eq!(parse_date_prefix(""), None);
        assert_eq!(parse_date_prefix("2024"), None);
        assert_eq!(parse_date_prefix("2024-01-0é-x"), None);
        assert_eq!(parse_date_prefix("ééééé-x"), None);
    }

    #[test]
    fn test_create_dated_filename_prefixes_sanitized_name() {
        assert_eq!(
            create_dated_filename("My Photo.jpg", date(2024, 3, 1)),
            "2024-03-01-My-Photo.jpg"
        );
    }

    #[test]
    fn test_create_dated_filename_replaces_existing_prefix() {
        assert_eq!(
            create_dated_filename("2020-05-05-report.pdf", date(2024, 3, 1)),
            "2024-03-01-report.pdf"
        );
        // Sanitizing turns the underscore into the separator first.
        assert_eq!(
            create_dated_filename("2020-05-05_report.pdf", date(2024, 3, 1)),
            "2024-03-01-report.pdf"
        );
    }

    #[test]
    fn test_create_dated_filename_keeps_prefix_when_separator_lost() {
        // "2020-05-05?x" loses the '?' and no longer has a separator at index 10.
        assert_eq!(
            create_dated_filename("2020-05-05?x.txt", date(2024, 3, 1)),
            "2024-03-01-2020-05-05x.txt"
        );
    }

    #[test]
    fn test_dated_filename_round_trips_date() {
        let names = ["photo.jpg", "a b c", "2019-12-31-old.txt", "x"];
        let dates = [date(1999, 12, 31), date(2024, 2, 29), date(2030, 1, 1)];
        for name in names {
            for d in dates {
                let dated = create_dated_filename(name, d);
                assert_eq!(parse_date_prefix(&dated), Some(d), "for {dated}");
            }
        }
    }
}

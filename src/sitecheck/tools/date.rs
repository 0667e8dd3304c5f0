//! Normalization of human-entered inspection dates.
//!
//! Sheets carry dates as ISO text, as `M/D/YY`-style text in a handful of
//! separators, as spreadsheet serial numbers, or as cells the reader already
//! typed as dates. Everything funnels into a zero-padded `yyyy-mm-dd` string;
//! anything unreadable becomes an empty string and the caller decides whether
//! that is fatal.

use std::sync::LazyLock;

use chrono::{DateTime, Datelike, Days, Local, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;

use crate::sitecheck::tools::model::{CellValue, ISO_DATE_FORMAT};

/// Serial number of 1970-01-01 in the spreadsheet day count.
pub const UNIX_EPOCH_SERIAL: f64 = 25569.0;

/// Largest serial a spreadsheet accepts (9999-12-31).
const MAX_SERIAL: f64 = 2_958_465.0;

/// Two-digit years up to this value land in the current century.
const TWO_DIGIT_YEAR_PIVOT: i32 = 50;

#[derive(Debug, Clone, Copy)]
enum FieldOrder {
    YearMonthDay,
    MonthDayYear,
}

static PATTERNS: LazyLock<Vec<(Regex, FieldOrder)>> = LazyLock::new(|| {
    [
        (r"^(\d{4})-(\d{1,2})-(\d{1,2})$", FieldOrder::YearMonthDay),
        (r"^(\d{1,2})/(\d{1,2})/(\d{2}|\d{4})$", FieldOrder::MonthDayYear),
        (r"^(\d{1,2})-(\d{1,2})-(\d{2}|\d{4})$", FieldOrder::MonthDayYear),
        (r"^(\d{1,2})\.(\d{1,2})\.(\d{2}|\d{4})$", FieldOrder::MonthDayYear),
    ]
    .into_iter()
    .filter_map(|(pattern, order)| Regex::new(pattern).ok().map(|regex| (regex, order)))
    .collect()
});

/// Last-resort date layouts tried after the numeric patterns.
const FALLBACK_DATE_FORMATS: &[&str] = &[
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%Y. %m. %d.",
    "%Y. %m. %d",
    "%Y년 %m월 %d일",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

const FALLBACK_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

/// Normalizes a raw cell into `yyyy-mm-dd`, or an empty string when it cannot
/// be read as a date. Two-digit years pivot around the current year.
pub fn normalize(raw: &CellValue) -> String {
    normalize_with_year(raw, Local::now().year())
}

/// Same as [`normalize`] with an explicit reference year for the two-digit pivot.
pub fn normalize_with_year(raw: &CellValue, current_year: i32) -> String {
    parse_cell(raw, current_year)
        .map(|date| date.format(ISO_DATE_FORMAT).to_string())
        .unwrap_or_default()
}

/// Parses a raw cell into a calendar date.
pub fn parse_cell(raw: &CellValue, current_year: i32) -> Option<NaiveDate> {
    match raw {
        CellValue::Empty | CellValue::Boolean(_) => None,
        CellValue::Date(date) => Some(*date),
        CellValue::Number(value) => from_serial(*value),
        CellValue::Text(text) => parse_text(text, current_year),
    }
}

/// Converts a spreadsheet serial day count (days since 1899-12-30) to a date.
/// The time-of-day fraction is dropped.
pub fn from_serial(value: f64) -> Option<NaiveDate> {
    if !value.is_finite() || value < 0.0 || value > MAX_SERIAL {
        return None;
    }
    let epoch = DateTime::<Utc>::UNIX_EPOCH.date_naive();
    let offset = value.floor() - UNIX_EPOCH_SERIAL;
    if offset >= 0.0 {
        epoch.checked_add_days(Days::new(offset as u64))
    } else {
        epoch.checked_sub_days(Days::new(offset.abs() as u64))
    }
}

/// Converts a date back into its serial day count.
pub fn to_serial(date: NaiveDate) -> f64 {
    let epoch = DateTime::<Utc>::UNIX_EPOCH.date_naive();
    UNIX_EPOCH_SERIAL + (date - epoch).num_days() as f64
}

/// Parses free-form date text.
pub fn parse_text(text: &str, current_year: i32) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    for (pattern, order) in PATTERNS.iter() {
        let Some(captures) = pattern.captures(text) else {
            continue;
        };
        let fields: Vec<&str> = captures
            .iter()
            .skip(1)
            .flatten()
            .map(|group| group.as_str())
            .collect();
        let &[first, second, third] = fields.as_slice() else {
            continue;
        };
        let (year, month, day) = match order {
            FieldOrder::YearMonthDay => (first, second, third),
            FieldOrder::MonthDayYear => (third, first, second),
        };
        let Some(year) = expand_year(year, current_year) else {
            continue;
        };
        let (Ok(month), Ok(day)) = (month.parse::<u32>(), day.parse::<u32>()) else {
            continue;
        };
        // from_ymd_opt rejects dates that would roll over, e.g. 31 June
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some(date);
        }
    }

    parse_generic(text)
}

fn expand_year(raw: &str, current_year: i32) -> Option<i32> {
    let value: i32 = raw.parse().ok()?;
    if raw.len() != 2 {
        return Some(value);
    }
    let century = current_year.div_euclid(100) * 100;
    Some(if value <= TWO_DIGIT_YEAR_PIVOT {
        century + value
    } else {
        century - 100 + value
    })
}

fn parse_generic(text: &str) -> Option<NaiveDate> {
    if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
        return Some(datetime.date_naive());
    }
    FALLBACK_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|datetime| datetime.date())
        .or_else(|| {
            FALLBACK_DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> CellValue {
        CellValue::text(value)
    }

    #[test]
    fn iso_dates_pass_through() {
        assert_eq!(normalize_with_year(&text("2025-06-03"), 2025), "2025-06-03");
        assert_eq!(normalize_with_year(&text("2025-6-3"), 2025), "2025-06-03");
    }

    #[test]
    fn invalid_iso_date_is_rejected() {
        assert_eq!(normalize_with_year(&text("2025-02-30"), 2025), "");
    }

    #[test]
    fn two_digit_years_pivot() {
        assert_eq!(normalize_with_year(&text("6/3/25"), 2025), "2025-06-03");
        assert_eq!(normalize_with_year(&text("6-3-73"), 2025), "1973-06-03");
        assert_eq!(normalize_with_year(&text("6.3.50"), 2025), "2050-06-03");
        assert_eq!(normalize_with_year(&text("6/3/2025"), 1999), "2025-06-03");
    }

    #[test]
    fn shape_match_with_impossible_values_is_rejected() {
        assert_eq!(normalize_with_year(&text("13/45/99"), 2025), "");
        assert_eq!(normalize_with_year(&text("6/31/25"), 2025), "");
    }

    #[test]
    fn serial_dates_use_spreadsheet_epoch() {
        assert_eq!(normalize(&CellValue::Number(45811.0)), "2025-06-03");
        assert_eq!(normalize(&CellValue::Number(25569.0)), "1970-01-01");
        assert_eq!(normalize(&CellValue::Number(45811.75)), "2025-06-03");
        assert_eq!(normalize(&CellValue::Number(f64::NAN)), "");
        assert_eq!(normalize(&CellValue::Number(-3.0)), "");
    }

    #[test]
    fn serial_conversion_inverts() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 3).unwrap();
        assert_eq!(to_serial(date), 45811.0);
        assert_eq!(from_serial(to_serial(date)), Some(date));
    }

    #[test]
    fn generic_fallbacks() {
        assert_eq!(normalize_with_year(&text("2025/6/3"), 2025), "2025-06-03");
        assert_eq!(normalize_with_year(&text("2025. 6. 3."), 2025), "2025-06-03");
        assert_eq!(normalize_with_year(&text("2025년 6월 3일"), 2025), "2025-06-03");
        assert_eq!(normalize_with_year(&text("June 3, 2025"), 2025), "2025-06-03");
        assert_eq!(
            normalize_with_year(&text("2025-06-03T09:30:00"), 2025),
            "2025-06-03"
        );
    }

    #[test]
    fn structured_and_unreadable_values() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();
        assert_eq!(normalize(&CellValue::Date(date)), "2024-12-01");
        assert_eq!(normalize(&CellValue::Empty), "");
        assert_eq!(normalize(&text("next tuesday")), "");
    }
}

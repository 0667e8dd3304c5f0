//! Score and score-range coercion.
//!
//! All default-on-malformed-input policy for score cells lives here: a missing
//! or unreadable range becomes `0/1`, an unreadable achieved score becomes 0.

use tracing::debug;

use crate::sitecheck::tools::model::{CellValue, ScoreRange};

/// Separator between the achieved and maximum halves of a range.
const RANGE_SEPARATOR: char = '/';

/// Parses a `"<min>/<max>"` specifier.
///
/// Each half is coerced independently; `min` falls back to 0 and `max` to 1.
/// Text without exactly one separator yields the full default.
pub fn parse_range(text: &str) -> ScoreRange {
    let text = text.trim();
    let default = ScoreRange::default();
    if text.is_empty() {
        return default;
    }

    let mut parts = text.split(RANGE_SEPARATOR);
    let (Some(min), Some(max), None) = (parts.next(), parts.next(), parts.next()) else {
        debug!(text, "score range without a single separator, using default");
        return default;
    };

    ScoreRange {
        min: leading_integer(min)
            .and_then(|value| u32::try_from(value).ok())
            .unwrap_or(default.min),
        max: leading_integer(max)
            .and_then(|value| u32::try_from(value).ok())
            .filter(|value| *value >= 1)
            .unwrap_or(default.max),
    }
}

/// Outcome of coercing an achieved-score cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreCoercion {
    /// The cell held a clean integer (or was blank, which counts as 0).
    Exact(u32),
    /// The cell needed lossy coercion; the value is the lenient reading.
    Coerced(u32),
}

impl ScoreCoercion {
    pub fn value(self) -> u32 {
        match self {
            ScoreCoercion::Exact(value) | ScoreCoercion::Coerced(value) => value,
        }
    }
}

/// Coerces an achieved-score cell into a non-negative integer.
///
/// The lenient reading takes the leading integer of the text (`"3점"` is 3),
/// truncates fractional numbers, and maps anything else, negatives included,
/// to 0. Callers decide whether a [`ScoreCoercion::Coerced`] result is
/// acceptable.
pub fn coerce_score(cell: &CellValue) -> ScoreCoercion {
    match cell {
        CellValue::Empty => ScoreCoercion::Exact(0),
        CellValue::Number(value) => {
            if !value.is_finite() || *value < 0.0 {
                ScoreCoercion::Coerced(0)
            } else if value.fract() == 0.0 && *value <= f64::from(u32::MAX) {
                ScoreCoercion::Exact(*value as u32)
            } else {
                ScoreCoercion::Coerced(value.trunc().min(f64::from(u32::MAX)) as u32)
            }
        }
        other => {
            let text = other.trimmed();
            if text.is_empty() {
                return ScoreCoercion::Exact(0);
            }
            if let Ok(value) = text.parse::<u32>() {
                return ScoreCoercion::Exact(value);
            }
            let lenient = leading_integer(&text)
                .and_then(|value| u32::try_from(value).ok())
                .unwrap_or(0);
            ScoreCoercion::Coerced(lenient)
        }
    }
}

/// Reads an optionally signed run of leading digits, ignoring surrounding
/// whitespace and anything after the digits.
fn leading_integer(text: &str) -> Option<i64> {
    let text = text.trim();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let end = digits
        .find(|ch: char| !ch.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let magnitude: i64 = digits[..end].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

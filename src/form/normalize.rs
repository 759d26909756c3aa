use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static CANONICAL_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,2}:\d{2}(:\d{2})?$").expect("valid regex"));

static MERIDIEM_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d{1,2}):?(\d{2})?\s*(AM|PM)").expect("valid regex"));

static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})$").expect("valid regex"));

static THREE_PART_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})[/\-](\d{1,2})[/\-](\d{4})$").expect("valid regex"));

/// How a three-part `a/b/yyyy` date is read, and how display dates are
/// written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateOrder {
    /// `DD/MM/YYYY`
    #[default]
    DayFirst,
    /// `MM/DD/YYYY`
    MonthFirst,
}

/// Canonicalize a time to 24-hour `HH:MM`.
///
/// `H:MM` and `H:MM:SS` are already canonical and pass through. Anything
/// else that is not a 12-hour time is returned unchanged.
pub fn normalize_time(value: &str) -> String {
    let value = value.trim();

    if CANONICAL_TIME.is_match(value) {
        return value.to_string();
    }

    let Some(caps) = MERIDIEM_TIME.captures(value) else {
        return value.to_string();
    };

    let Ok(mut hours) = caps[1].parse::<u32>() else {
        return value.to_string();
    };
    let minutes = caps.get(2).map_or("00", |m| m.as_str());
    let pm = caps[3].eq_ignore_ascii_case("pm");

    if pm && hours < 12 {
        hours += 12;
    }
    if !pm && hours == 12 {
        hours = 0;
    }

    format!("{:02}:{}", hours, minutes)
}

/// Canonicalize a date to ISO `YYYY-MM-DD` (`iso`) or the display format
/// for `order`. Day and month are zero-padded. Unrecognized shapes are
/// returned unchanged.
pub fn normalize_date(value: &str, iso: bool, order: DateOrder) -> String {
    let value = value.trim();

    let parts = if let Some(caps) = ISO_DATE.captures(value) {
        Some((caps[1].to_string(), caps[2].to_string(), caps[3].to_string()))
    } else if let Some(caps) = THREE_PART_DATE.captures(value) {
        let (first, second) = (caps[1].to_string(), caps[2].to_string());
        let year = caps[3].to_string();
        match order {
            DateOrder::DayFirst => Some((year, second, first)),
            DateOrder::MonthFirst => Some((year, first, second)),
        }
    } else {
        None
    };

    let Some((year, month, day)) = parts else {
        return value.to_string();
    };
    let month = format!("{:0>2}", month);
    let day = format!("{:0>2}", day);

    match (iso, order) {
        (true, _) => format!("{}-{}-{}", year, month, day),
        (false, DateOrder::DayFirst) => format!("{}/{}/{}", day, month, year),
        (false, DateOrder::MonthFirst) => format!("{}/{}/{}", month, day, year),
    }
}

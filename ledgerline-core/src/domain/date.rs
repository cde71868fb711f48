//! Date normalization for statement rows
//!
//! Bank exports disagree on date formats. `parse_date` accepts ISO timestamps,
//! numeric dates with `-`, `/` or `.` separators, and dates with month names,
//! and always yields a calendar date or `None`.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// How to read a numeric date whose first two groups could both be a month
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DateOrder {
    /// `03/04/2024` is March 4th
    #[default]
    MonthFirst,
    /// `03/04/2024` is April 3rd
    DayFirst,
}

impl std::str::FromStr for DateOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', '_'], "").as_str() {
            "monthfirst" | "mdy" | "us" => Ok(Self::MonthFirst),
            "dayfirst" | "dmy" | "eu" => Ok(Self::DayFirst),
            other => Err(format!("Unknown date order: {}", other)),
        }
    }
}

/// What the parser does with a row whose date cannot be read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DateFallback {
    /// Drop the row and record a warning
    #[default]
    Skip,
    /// Keep the row dated today and record a warning
    Today,
}

const MONTHS: [&str; 12] = [
    "january", "february", "march", "april", "may", "june",
    "july", "august", "september", "october", "november", "december",
];

/// Parse a raw date cell into a calendar date
pub fn parse_date(raw: &str, order: DateOrder) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Some(date) = parse_timestamp(s) {
        return Some(date);
    }

    let s = strip_time_suffix(s);
    parse_numeric(s, order).or_else(|| parse_with_month_name(s))
}

/// Full timestamps: RFC 3339, RFC 2822 and ISO date-times without offset.
/// The date is taken in the timestamp's own offset.
fn parse_timestamp(s: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.date_naive());
    }

    let formats = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    formats
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.date())
}

/// `01/15/2023 10:30 AM` -> `01/15/2023`
fn strip_time_suffix(s: &str) -> &str {
    let mut tokens = s.split_whitespace();
    let first = tokens.next().unwrap_or(s);
    let rest: Vec<&str> = tokens.collect();
    let is_time = |t: &&str| {
        t.contains(':') || t.eq_ignore_ascii_case("am") || t.eq_ignore_ascii_case("pm")
    };
    if !rest.is_empty() && rest.iter().all(is_time) {
        first
    } else {
        s
    }
}

/// `YYYY-MM-DD`, `YYYY/MM/DD`, `MM/DD/YYYY`, `DD/MM/YYYY`, `MM-DD-YYYY`, `DD-MM-YYYY`
fn parse_numeric(s: &str, order: DateOrder) -> Option<NaiveDate> {
    let parts: Vec<&str> = s.split(['-', '/', '.']).collect();
    if parts.len() != 3
        || parts
            .iter()
            .any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()))
    {
        return None;
    }

    if parts[0].len() == 4 {
        let year: i32 = parts[0].parse().ok()?;
        let month: u32 = parts[1].parse().ok()?;
        let day: u32 = parts[2].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    if parts[0].len() > 2 || parts[1].len() > 2 {
        return None;
    }
    let first: u32 = parts[0].parse().ok()?;
    let second: u32 = parts[1].parse().ok()?;
    let year = parse_year(parts[2])?;

    let month_first = NaiveDate::from_ymd_opt(year, first, second);
    let day_first = NaiveDate::from_ymd_opt(year, second, first);

    match (month_first, day_first) {
        (Some(md), Some(dm)) => Some(match order {
            DateOrder::MonthFirst => md,
            DateOrder::DayFirst => dm,
        }),
        (Some(md), None) => Some(md),
        (None, Some(dm)) => Some(dm),
        (None, None) => None,
    }
}

/// `January 15, 2023`, `Jan 15 2023`, `15 January 2023`, `15-Jan-2023`
fn parse_with_month_name(s: &str) -> Option<NaiveDate> {
    let tokens: Vec<&str> = s
        .split(|c: char| c.is_whitespace() || matches!(c, ',' | '-' | '/' | '.'))
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.len() != 3 {
        return None;
    }

    let is_alpha = |t: &str| t.chars().all(|c| c.is_ascii_alphabetic());
    let (month_token, day_token, year_token) = if is_alpha(tokens[0]) {
        (tokens[0], tokens[1], tokens[2])
    } else if is_alpha(tokens[1]) {
        (tokens[1], tokens[0], tokens[2])
    } else {
        return None;
    };

    let month = month_from_name(month_token)?;
    let day: u32 = strip_ordinal(day_token).parse().ok()?;
    let year = parse_year(year_token)?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Month number from a full name, a 3-letter abbreviation, or (last resort)
/// any prefix of at least 3 letters such as `Sept`
fn month_from_name(name: &str) -> Option<u32> {
    let name = name.to_lowercase();
    if name.len() < 3 {
        return None;
    }

    let position = MONTHS
        .iter()
        .position(|m| *m == name)
        .or_else(|| MONTHS.iter().position(|m| m[..3] == name))
        .or_else(|| MONTHS.iter().position(|m| m.starts_with(name.as_str())))?;
    Some(position as u32 + 1)
}

fn strip_ordinal(day: &str) -> &str {
    let lower = day.to_ascii_lowercase();
    for suffix in ["st", "nd", "rd", "th"] {
        if lower.ends_with(suffix) && day.len() > suffix.len() {
            return &day[..day.len() - suffix.len()];
        }
    }
    day
}

/// Four-digit years as-is, two-digit years in 2000-2099
fn parse_year(s: &str) -> Option<i32> {
    if !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match s.len() {
        4 => s.parse().ok(),
        2 => s.parse::<i32>().ok().map(|y| 2000 + y),
        _ => None,
    }
}

//! Occurrence projection for open-ended recurring tasks.
//!
//! Nothing here stores or reads occurrence history: whether a pattern lands
//! on a date is decided from the origin date alone, so calendar views can ask
//! about any range without materializing instances.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::UpkeepError;

/// Furthest ahead [`next_occurrence`] looks before giving up.
const NEXT_OCCURRENCE_SEARCH_DAYS: u64 = 4 * 366 + 1;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(try_from = "String", into = "String")]
pub enum RecurrenceKind {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
    Annual,
    /// Every `n` days from the origin.
    EveryDays(u32),
    /// On each listed weekday.
    Weekdays(Vec<Weekday>),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RecurrencePattern {
    pub origin: NaiveDate,
    pub kind: RecurrenceKind,
}

impl RecurrencePattern {
    pub fn new(origin: NaiveDate, kind: RecurrenceKind) -> Self {
        Self { origin, kind }
    }
}

/// Number of days in the month containing (`year`, `month`).
pub fn last_day_of_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(28)
}

/// `day`, pulled back to the last day of `target`'s month if that month is shorter.
fn clamped_day(day: u32, target: NaiveDate) -> u32 {
    day.min(last_day_of_month(target.year(), target.month()))
}

/// Whether `pattern` has an occurrence on `target`. Always false before the origin.
pub fn occurs_on(pattern: &RecurrencePattern, target: NaiveDate) -> bool {
    let origin = pattern.origin;
    if target < origin {
        return false;
    }
    let elapsed = (target - origin).num_days();
    match &pattern.kind {
        RecurrenceKind::Daily => true,
        RecurrenceKind::Weekly => target.weekday() == origin.weekday(),
        RecurrenceKind::Biweekly => target.weekday() == origin.weekday() && elapsed % 14 == 0,
        RecurrenceKind::Monthly => target.day() == clamped_day(origin.day(), target),
        RecurrenceKind::Annual => {
            target.month() == origin.month() && target.day() == clamped_day(origin.day(), target)
        }
        RecurrenceKind::EveryDays(0) => elapsed == 0,
        RecurrenceKind::EveryDays(n) => elapsed % i64::from(*n) == 0,
        RecurrenceKind::Weekdays(days) => days.contains(&target.weekday()),
    }
}

/// Occurrences in `start..=end`, computed lazily.
pub fn occurrences_between(
    pattern: &RecurrencePattern,
    start: NaiveDate,
    end: NaiveDate,
) -> impl Iterator<Item = NaiveDate> + '_ {
    start
        .max(pattern.origin)
        .iter_days()
        .take_while(move |d| *d <= end)
        .filter(move |d| occurs_on(pattern, *d))
}

/// First occurrence on or after `from`.
pub fn next_occurrence(pattern: &RecurrencePattern, from: NaiveDate) -> Option<NaiveDate> {
    from.max(pattern.origin)
        .iter_days()
        .take(NEXT_OCCURRENCE_SEARCH_DAYS as usize)
        .find(|d| occurs_on(pattern, *d))
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "mon",
        Weekday::Tue => "tue",
        Weekday::Wed => "wed",
        Weekday::Thu => "thu",
        Weekday::Fri => "fri",
        Weekday::Sat => "sat",
        Weekday::Sun => "sun",
    }
}

impl fmt::Display for RecurrenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecurrenceKind::Daily => f.write_str("daily"),
            RecurrenceKind::Weekly => f.write_str("weekly"),
            RecurrenceKind::Biweekly => f.write_str("biweekly"),
            RecurrenceKind::Monthly => f.write_str("monthly"),
            RecurrenceKind::Annual => f.write_str("annual"),
            RecurrenceKind::EveryDays(n) => write!(f, "every:{n}"),
            RecurrenceKind::Weekdays(days) => {
                let names: Vec<&str> = days.iter().map(|d| weekday_name(*d)).collect();
                write!(f, "weekdays:{}", names.join(","))
            }
        }
    }
}

impl FromStr for RecurrenceKind {
    type Err = UpkeepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || UpkeepError::InvalidPattern(s.to_string());
        let lower = s.trim().to_lowercase();
        match lower.as_str() {
            "daily" => return Ok(RecurrenceKind::Daily),
            "weekly" => return Ok(RecurrenceKind::Weekly),
            "biweekly" | "fortnightly" => return Ok(RecurrenceKind::Biweekly),
            "monthly" => return Ok(RecurrenceKind::Monthly),
            "annual" | "annually" | "yearly" => return Ok(RecurrenceKind::Annual),
            _ => {}
        }
        if let Some(n) = lower.strip_prefix("every:") {
            let n: u32 = n.trim().parse().map_err(|_| invalid())?;
            if n == 0 {
                return Err(invalid());
            }
            return Ok(RecurrenceKind::EveryDays(n));
        }
        if let Some(list) = lower.strip_prefix("weekdays:") {
            let mut days = Vec::new();
            for name in list.split(',').map(str::trim).filter(|n| !n.is_empty()) {
                let day: Weekday = name.parse().map_err(|_| invalid())?;
                if !days.contains(&day) {
                    days.push(day);
                }
            }
            if days.is_empty() {
                return Err(invalid());
            }
            days.sort_by_key(|d| d.num_days_from_monday());
            return Ok(RecurrenceKind::Weekdays(days));
        }
        Err(invalid())
    }
}

impl TryFrom<String> for RecurrenceKind {
    type Error = UpkeepError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RecurrenceKind> for String {
    fn from(kind: RecurrenceKind) -> Self {
        kind.to_string()
    }
}

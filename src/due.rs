//! Next-due computation and due status for maintenance items.
//!
//! Everything here is a pure function of the item's fields. Callers decide
//! whether to persist what [`refresh`] writes back.

use std::fmt;

use chrono::{Days, NaiveDate};

use crate::models::{MaintenanceItem, UsageBasis};

/// Share of a usage interval left at which a meter counts as due soon.
const USAGE_DUE_SOON_FRACTION: f64 = 0.10;

/// Where a due date came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueBasis {
    /// `last_completed + frequency_days`.
    Frequency,
    /// The user's `manual_due_date`.
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueDate {
    pub date: NaiveDate,
    pub basis: DueBasis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DueStatus {
    /// No due date can be computed.
    Unknown,
    Ok,
    DueSoon,
    Overdue,
}

impl DueStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DueStatus::Unknown => "unknown",
            DueStatus::Ok => "ok",
            DueStatus::DueSoon => "due soon",
            DueStatus::Overdue => "overdue",
        }
    }
}

impl fmt::Display for DueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Computes the date-basis due date.
///
/// A completed item with a day interval is due `frequency_days` after its
/// last completion. Otherwise a manual due date is used as-is. An item with
/// neither is dormant and has no due date, as is one whose interval runs
/// past the last representable date.
pub fn compute_next_due(item: &MaintenanceItem) -> Option<DueDate> {
    if let (Some(last), Some(days)) = (item.last_completed, item.frequency_days) {
        return last
            .checked_add_days(Days::new(u64::from(days)))
            .map(|date| DueDate { date, basis: DueBasis::Frequency });
    }
    item.manual_due_date.map(|date| DueDate { date, basis: DueBasis::Manual })
}

/// True when the item has a day interval but its next due date is out of range.
pub fn frequency_out_of_range(item: &MaintenanceItem) -> bool {
    item.last_completed.is_some() && item.frequency_days.is_some() && compute_next_due(item).is_none()
}

/// Reading at which the next usage-based service falls due, if the item has a meter
/// with both an interval and a last reading.
pub fn compute_next_due_usage(item: &MaintenanceItem) -> Option<f64> {
    let (_, meter) = item.subject.meter()?;
    Some(meter.last_reading? + meter.frequency?)
}

/// Writes the derived `next_due_*` fields back onto the item.
///
/// A frequency-based date consumes any manual override. Returns `true` if
/// anything changed.
pub fn refresh(item: &mut MaintenanceItem) -> bool {
    let before = item.clone();
    let due = compute_next_due(item);
    item.next_due_date = due.map(|d| d.date);
    if matches!(due, Some(DueDate { basis: DueBasis::Frequency, .. })) {
        item.manual_due_date = None;
    }
    let usage = compute_next_due_usage(item);
    if let Some(meter) = item.subject.meter_mut() {
        meter.next_due = usage;
    }
    *item != before
}

/// Calendar days from `today` until the item is due. Negative when overdue.
pub fn days_until(item: &MaintenanceItem, today: NaiveDate) -> Option<i64> {
    compute_next_due(item).map(|d| (d.date - today).num_days())
}

/// Date-basis status. Compares calendar dates only.
pub fn status(item: &MaintenanceItem, today: NaiveDate) -> DueStatus {
    match days_until(item, today) {
        None => DueStatus::Unknown,
        Some(d) if d < 0 => DueStatus::Overdue,
        Some(d) if d <= item.source_type().due_soon_days() => DueStatus::DueSoon,
        Some(_) => DueStatus::Ok,
    }
}

/// Status on each basis an item is scheduled on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BasisStatus {
    pub date: DueStatus,
    pub usage: Option<(UsageBasis, DueStatus)>,
}

impl BasisStatus {
    /// The most urgent status across bases.
    pub fn worst(&self) -> DueStatus {
        match self.usage {
            Some((_, usage)) => self.date.max(usage),
            None => self.date,
        }
    }
}

pub fn status_by_basis(item: &MaintenanceItem, today: NaiveDate) -> BasisStatus {
    let usage = item.subject.meter().map(|(basis, meter)| {
        let st = match (compute_next_due_usage(item), meter.current_reading) {
            (Some(next), Some(current)) => usage_status(next - current, meter.frequency.unwrap_or(0.0)),
            _ => DueStatus::Unknown,
        };
        (basis, st)
    });
    BasisStatus { date: status(item, today), usage }
}

fn usage_status(remaining: f64, frequency: f64) -> DueStatus {
    if remaining < 0.0 {
        DueStatus::Overdue
    } else if remaining <= frequency * USAGE_DUE_SOON_FRACTION {
        DueStatus::DueSoon
    } else {
        DueStatus::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_thresholds() {
        assert_eq!(usage_status(-1.0, 5000.0), DueStatus::Overdue);
        assert_eq!(usage_status(0.0, 5000.0), DueStatus::DueSoon);
        assert_eq!(usage_status(500.0, 5000.0), DueStatus::DueSoon);
        assert_eq!(usage_status(501.0, 5000.0), DueStatus::Ok);
    }
}

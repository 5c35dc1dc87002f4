//! Dedup keys for reminders.
//!
//! Items that fall due on the same day for the same reason at the same place
//! share a reminder. The key is built from normalized text so cosmetic edits
//! ("Front Yard" vs "front_yard ") do not split a bucket.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

use crate::error::ProvenanceError;
use crate::models::{MaintenanceItem, ReminderScope};
use crate::provenance::{Provenance, Target};

/// Location component used when an item has none.
pub const UNLOCATED: &str = "unlocated";

/// Label component used when an item's label normalizes to nothing.
const UNTITLED: &str = "untitled";

const DATE_FMT: &str = "%Y-%m-%d";

/// Lowercases, trims, and collapses runs of whitespace and separator
/// characters into a single `_`.
pub fn normalize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_sep = false;
    for ch in s.chars() {
        if ch.is_whitespace() || matches!(ch, '/' | '\\' | '-' | '_' | ':' | '@') {
            pending_sep = !out.is_empty();
        } else {
            if pending_sep {
                out.push('_');
                pending_sep = false;
            }
            out.extend(ch.to_lowercase());
        }
    }
    out
}

/// Typed group key. All components are already normalized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey {
    pub due: NaiveDate,
    pub label: String,
    pub location: String,
}

impl GroupKey {
    pub fn new(due: NaiveDate, label: &str, location: Option<&str>) -> Self {
        let label = normalize(label);
        let location = location.map(normalize).unwrap_or_default();
        Self {
            due,
            label: if label.is_empty() { UNTITLED.to_string() } else { label },
            location: if location.is_empty() { UNLOCATED.to_string() } else { location },
        }
    }

    pub fn is_located(&self) -> bool {
        self.location != UNLOCATED
    }
}

/// Wire form: `<iso_date>_<label>`, with `@<location>` appended for located keys.
impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.due.format(DATE_FMT), self.label)?;
        if self.is_located() {
            write!(f, "@{}", self.location)?;
        }
        Ok(())
    }
}

impl FromStr for GroupKey {
    type Err = ProvenanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || ProvenanceError::BadGroupKey(s.to_string());
        let date = s.get(..10).ok_or_else(bad)?;
        let rest = s.get(10..).and_then(|r| r.strip_prefix('_')).ok_or_else(bad)?;
        let due = NaiveDate::parse_from_str(date, DATE_FMT).map_err(|_| bad())?;
        let (label, location) = match rest.split_once('@') {
            Some((label, location)) => (label, location),
            None => (rest, UNLOCATED),
        };
        // only canonical keys parse, so parse-then-format is the identity
        if label.is_empty() || location.is_empty() || normalize(label) != label || normalize(location) != location {
            return Err(bad());
        }
        let key = GroupKey { due, label: label.to_string(), location: location.to_string() };
        if key.to_string() != s {
            return Err(bad());
        }
        Ok(key)
    }
}

/// Group key for an item falling due on `due`.
pub fn group_key(item: &MaintenanceItem, due: NaiveDate) -> GroupKey {
    GroupKey::new(due, &item.label, item.subject.location())
}

/// Provenance of the reminder an item due on `due` belongs to.
pub fn bucket_key(item: &MaintenanceItem, due: NaiveDate) -> Provenance {
    let source = item.source_type();
    let target = match source.scope() {
        ReminderScope::Grouped => Target::Group(group_key(item, due)),
        ReminderScope::PerRecord => Target::Item(item.id),
    };
    Provenance { source, target }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_separators() {
        assert_eq!(normalize("  Front   Yard "), "front_yard");
        assert_eq!(normalize("front_yard "), "front_yard");
        assert_eq!(normalize("Barn / North-Paddock"), "barn_north_paddock");
        assert_eq!(normalize("__x__"), "x");
        assert_eq!(normalize("   "), "");
    }
}

//! Reconciles generated reminders with the items that are currently due.
//!
//! A pass is scoped to one source type and recomputes everything from the
//! store. No lock is taken: overlapping passes can create sibling reminders
//! for the same key, and every pass retires all but the earliest-created one,
//! so the store converges to one active reminder per key.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::AddAssign;

use chrono::{Days, NaiveDate};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::due::{compute_next_due, frequency_out_of_range, refresh};
use crate::error::{Result, UpkeepError};
use crate::grouping::bucket_key;
use crate::models::{MaintenanceItem, NewReminder, ReminderScope, ReminderTask, SourceType};
use crate::provenance::{tag_of, Provenance, Target};
use crate::store::RecordStore;

/// Counts of reminder changes made by a pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncStats {
    pub created: usize,
    pub updated: usize,
    pub retired: usize,
}

impl SyncStats {
    pub fn is_noop(&self) -> bool {
        self.created == 0 && self.updated == 0 && self.retired == 0
    }
}

impl AddAssign for SyncStats {
    fn add_assign(&mut self, rhs: Self) {
        self.created += rhs.created;
        self.updated += rhs.updated;
        self.retired += rhs.retired;
    }
}

/// The date range a pass schedules reminders for: anything overdue or due
/// within `horizon_days` of `today`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncWindow {
    pub today: NaiveDate,
    pub horizon_days: i64,
}

impl SyncWindow {
    pub fn new(today: NaiveDate, horizon_days: i64) -> Self {
        Self { today, horizon_days }
    }

    /// Last date inside the window, clamped to the last representable date.
    pub fn horizon(&self) -> NaiveDate {
        self.today
            .checked_add_days(Days::new(self.horizon_days.max(0).unsigned_abs()))
            .unwrap_or(NaiveDate::MAX)
    }
}

/// Items sharing one reminder.
#[derive(Debug)]
struct Bucket {
    due: NaiveDate,
    members: Vec<MaintenanceItem>,
}

impl Bucket {
    fn title(&self, source: SourceType) -> String {
        // members are sorted by id, so the first one is a stable choice
        let Some(first) = self.members.first() else {
            return String::new();
        };
        let label = first.label.trim();
        match source.scope() {
            ReminderScope::PerRecord => format!("{}: {}", label, first.subject.name().trim()),
            ReminderScope::Grouped => match first.subject.location().map(str::trim) {
                Some(loc) if !loc.is_empty() => format!("{label} ({loc})"),
                _ => label.to_string(),
            },
        }
    }

    fn notes(&self) -> Option<String> {
        if self.members.len() < 2 {
            return None;
        }
        let names: Vec<&str> = self.members.iter().map(|m| m.subject.name().trim()).collect();
        Some(names.join(", "))
    }
}

/// Recomputes and persists derived due fields of every active item, then
/// buckets the items the store reports as due inside the window.
fn collect_buckets<S: RecordStore + ?Sized>(
    store: &S,
    source: SourceType,
    window: SyncWindow,
) -> Result<BTreeMap<Provenance, Bucket>> {
    for mut item in store.list_active_items(source)? {
        if frequency_out_of_range(&item) {
            warn!(%source, id = item.id, frequency_days = item.frequency_days, "next due date out of range, treating item as dormant");
        }
        if refresh(&mut item) {
            match store.update_item(&item) {
                Ok(()) => {}
                Err(UpkeepError::ItemNotFound { source_type, id }) => {
                    warn!(%source_type, id, "item vanished during sync, skipping");
                }
                Err(e) => return Err(e),
            }
        }
    }

    let mut items = store.list_due_before(source, window.horizon())?;
    items.sort_by_key(|i| i.id);

    let mut buckets: BTreeMap<Provenance, Bucket> = BTreeMap::new();
    for item in items {
        let Some(due) = compute_next_due(&item) else {
            continue;
        };
        let key = bucket_key(&item, due.date);
        buckets
            .entry(key)
            .or_insert_with(|| Bucket { due: due.date, members: Vec::new() })
            .members
            .push(item);
    }
    Ok(buckets)
}

/// Keeps the earliest-created active reminder for `key` and retires the
/// rest. Returns the survivor and how many were retired.
pub fn reconcile_duplicates<S: RecordStore + ?Sized>(
    store: &S,
    key: &str,
) -> Result<(Option<ReminderTask>, usize)> {
    let mut tasks = store.find_active_by_provenance(key)?;
    tasks.sort_by_key(|t| (t.created_at, t.id));
    let mut iter = tasks.into_iter();
    let Some(survivor) = iter.next() else {
        return Ok((None, 0));
    };
    let mut retired = 0;
    for dup in iter {
        if store.retire_reminder(dup.id, None)? {
            retired += 1;
        }
    }
    if retired > 0 {
        info!(key, kept = survivor.id, retired, "retired duplicate reminders");
    }
    Ok((Some(survivor), retired))
}

/// Brings the active reminders of one source type in line with its due items.
pub fn sync<S: RecordStore + ?Sized>(store: &S, source: SourceType, window: SyncWindow) -> Result<SyncStats> {
    let buckets = collect_buckets(store, source, window)?;
    let mut stats = SyncStats::default();
    let mut desired: BTreeSet<String> = BTreeSet::new();

    for (prov, bucket) in &buckets {
        let key = prov.key();
        desired.insert(key.clone());
        let title = bucket.title(source);
        let notes = bucket.notes();

        let (survivor, retired) = reconcile_duplicates(store, &key)?;
        stats.retired += retired;

        match survivor {
            None => {
                let task = store.create_reminder(NewReminder {
                    title,
                    notes,
                    due_date: bucket.due,
                    due_time: None,
                    provenance: Some(key.clone()),
                })?;
                debug!(key = %key, id = task.id, due = %bucket.due, "created reminder");
                stats.created += 1;
                // a concurrent pass may have created the same reminder in the meantime
                let (_, raced) = reconcile_duplicates(store, &key)?;
                stats.retired += raced;
            }
            Some(mut task) => {
                if task.due_date != bucket.due || task.title != title || task.notes != notes {
                    debug!(key = %key, id = task.id, from = %task.due_date, to = %bucket.due, "rescheduled reminder");
                    task.due_date = bucket.due;
                    task.title = title;
                    task.notes = notes;
                    store.update_reminder(&task)?;
                    stats.updated += 1;
                }
            }
        }
    }

    stats.retired += retire_stale(store, source, &desired)?;

    if stats.is_noop() {
        debug!(%source, "sync: no changes");
    } else {
        info!(%source, created = stats.created, updated = stats.updated, retired = stats.retired, "sync finished");
    }
    Ok(stats)
}

/// Retires active reminders of `source` whose key is no longer due. Keys
/// of other source types are skipped before parsing. Keys that carry this
/// source's tag but do not parse are left alone.
fn retire_stale<S: RecordStore + ?Sized>(
    store: &S,
    source: SourceType,
    desired: &BTreeSet<String>,
) -> Result<usize> {
    let mut retired = 0;
    for task in store.list_active_reminders()? {
        let Some(raw) = task.provenance.as_deref() else {
            continue;
        };
        if tag_of(raw) != Some(source.provenance_tag()) {
            continue;
        }
        let prov: Provenance = match raw.parse() {
            Ok(p) => p,
            Err(e) => {
                warn!(id = task.id, provenance = raw, error = %e, "unparseable provenance, leaving reminder untouched");
                continue;
            }
        };
        if desired.contains(raw) {
            continue;
        }
        if store.retire_reminder(task.id, None)? {
            let reason = match prov.target {
                Target::Item(_) => "item no longer due",
                Target::Group(_) => "group no longer due",
            };
            debug!(id = task.id, provenance = raw, reason, "retired stale reminder");
            retired += 1;
        }
    }
    Ok(retired)
}

/// Runs [`sync`] for every source type. A failing source type is logged and
/// does not stop the others.
pub fn sync_all<S: RecordStore + ?Sized>(store: &S, window: SyncWindow) -> SyncStats {
    let mut total = SyncStats::default();
    for source in SourceType::ALL {
        match sync(store, source, window) {
            Ok(stats) => total += stats,
            Err(e) => error!(%source, error = %e, "sync failed"),
        }
    }
    total
}

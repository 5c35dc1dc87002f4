//! Feeds "done" back into the items that produced a reminder.
//!
//! Completing a reminder never fails because of the items behind it: a
//! missing item, an empty group or a key that no longer parses is logged and
//! the reminder is still marked done. A stuck reminder is worse than a missed
//! side effect.

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::due::{compute_next_due, refresh};
use crate::error::{Result, UpkeepError};
use crate::grouping::{group_key, GroupKey};
use crate::models::{MaintenanceItem, ReminderScope, SourceType, Subject};
use crate::provenance::{Provenance, Target};
use crate::store::RecordStore;
use crate::sync::{sync, SyncStats, SyncWindow};

/// A "done" event: when it happened and, for metered items, the meter reading at the time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Completion {
    pub on: NaiveDate,
    pub reading: Option<f64>,
}

impl Completion {
    pub fn on(on: NaiveDate) -> Self {
        Self { on, reading: None }
    }

    pub fn with_reading(mut self, reading: f64) -> Self {
        self.reading = Some(reading);
        self
    }
}

/// What completing a reminder did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionReport {
    pub reminder_id: u64,
    /// The reminder was already done; nothing else happened.
    pub already_completed: bool,
    pub provenance: Option<Provenance>,
    /// Ids of the items whose completion was recorded.
    pub updated_items: Vec<u64>,
    /// Other active reminders for the same key that were retired.
    pub siblings_retired: usize,
    /// Changes made by the follow-up sync of the source type.
    pub sync: SyncStats,
}

/// Records a completion on one item and recomputes its due dates.
///
/// Dispatches on the subject so every source type has to say what a
/// completion means for it.
pub fn record_completion(item: &mut MaintenanceItem, done: &Completion) {
    item.last_completed = Some(done.on);
    item.manual_due_date = None;
    match &mut item.subject {
        Subject::Vehicle { odometer: meter, .. } | Subject::Equipment { hour_meter: meter, .. } => {
            if let Some(reading) = done.reading {
                meter.last_reading = Some(reading);
                meter.current_reading = Some(meter.current_reading.map_or(reading, |c| c.max(reading)));
            }
        }
        Subject::Home { .. }
        | Subject::FarmArea { .. }
        | Subject::Animal { .. }
        | Subject::PlantWatering { .. }
        | Subject::PlantFertilizing { .. }
        | Subject::Gear { .. }
        | Subject::Training { .. }
        | Subject::Medical { .. } => {}
    }
    refresh(item);
}

/// Active items of `source` currently falling into the bucket `key`.
fn resolve_group<S: RecordStore + ?Sized>(
    store: &S,
    source: SourceType,
    key: &GroupKey,
) -> Result<Vec<MaintenanceItem>> {
    let mut items = store.list_active_items(source)?;
    items.retain(|item| compute_next_due(item).is_some_and(|d| group_key(item, d.date) == *key));
    Ok(items)
}

/// Applies `done` to every item behind `prov`. Returns the ids updated.
fn apply_to_sources<S: RecordStore + ?Sized>(store: &S, prov: &Provenance, done: &Completion) -> Result<Vec<u64>> {
    let targets = match &prov.target {
        Target::Item(id) => match store.get_item(prov.source, *id)? {
            Some(item) => vec![item],
            None => {
                warn!(source = %prov.source, id, "completed reminder points at a missing item");
                Vec::new()
            }
        },
        Target::Group(key) => {
            let members = resolve_group(store, prov.source, key)?;
            if members.is_empty() {
                warn!(source = %prov.source, group = %key, "completed group matches no current items");
            }
            members
        }
    };

    let mut updated = Vec::with_capacity(targets.len());
    for mut item in targets {
        record_completion(&mut item, done);
        match store.update_item(&item) {
            Ok(()) => updated.push(item.id),
            Err(UpkeepError::ItemNotFound { source_type, id }) => {
                warn!(%source_type, id, "item deleted while recording completion");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(updated)
}

/// Completes a reminder and propagates the completion to its source items.
///
/// After the source items are updated the reminder is retired, any sibling
/// reminders for the same key are retired with it, and the source type is
/// re-synced so the next occurrence shows up right away.
pub fn on_reminder_completed<S: RecordStore + ?Sized>(
    store: &S,
    reminder_id: u64,
    done: Completion,
    window: SyncWindow,
) -> Result<CompletionReport> {
    let task = store
        .get_reminder(reminder_id)?
        .ok_or(UpkeepError::ReminderNotFound(reminder_id))?;
    let mut report = CompletionReport { reminder_id, ..Default::default() };

    if !task.is_active || task.is_completed {
        report.already_completed = true;
        return Ok(report);
    }

    let Some(raw) = task.provenance.clone() else {
        store.retire_reminder(reminder_id, Some(done.on))?;
        return Ok(report);
    };

    let prov: Provenance = match raw.parse() {
        Ok(p) => p,
        Err(e) => {
            warn!(id = reminder_id, provenance = %raw, error = %e, "no handler for reminder provenance, completing anyway");
            store.retire_reminder(reminder_id, Some(done.on))?;
            return Ok(report);
        }
    };

    report.updated_items = apply_to_sources(store, &prov, &done)?;
    store.retire_reminder(reminder_id, Some(done.on))?;

    for sibling in store.find_active_by_provenance(&raw)? {
        if store.retire_reminder(sibling.id, Some(done.on))? {
            report.siblings_retired += 1;
        }
    }

    report.sync = sync(store, prov.source, window)?;
    info!(
        id = reminder_id,
        provenance = %raw,
        items = report.updated_items.len(),
        siblings = report.siblings_retired,
        "reminder completed"
    );
    report.provenance = Some(prov);
    Ok(report)
}

/// What marking a single item done did.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemCompletion {
    pub item: MaintenanceItem,
    /// Reminders for this item's occurrence that were closed.
    pub reminders_closed: usize,
    pub sync: SyncStats,
}

/// Marks one item done directly, without going through a reminder.
///
/// A per-record reminder for the finished occurrence is closed. A grouped
/// reminder stays with whichever members are still due; the follow-up sync
/// adjusts or retires it.
pub fn complete_item<S: RecordStore + ?Sized>(
    store: &S,
    source: SourceType,
    id: u64,
    done: Completion,
    window: SyncWindow,
) -> Result<ItemCompletion> {
    let mut item = store
        .get_item(source, id)?
        .ok_or(UpkeepError::ItemNotFound { source_type: source, id })?;

    let mut reminders_closed = 0;
    if source.scope() == ReminderScope::PerRecord {
        let key = Provenance::item(source, id).key();
        for task in store.find_active_by_provenance(&key)? {
            if store.retire_reminder(task.id, Some(done.on))? {
                reminders_closed += 1;
            }
        }
    }

    record_completion(&mut item, &done);
    store.update_item(&item)?;
    let stats = sync(store, source, window)?;
    info!(%source, id, on = %done.on, "item marked done");
    Ok(ItemCompletion { item, reminders_closed, sync: stats })
}

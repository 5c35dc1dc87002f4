//! The record store the engine reads items from and writes reminders to.
//!
//! Implementations only need per-operation atomicity. The engine never holds
//! a lock across operations; concurrent passes that race each other are
//! repaired by the duplicate cleanup in [`crate::sync`].

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::due::compute_next_due;
use crate::error::{Result, UpkeepError};
use crate::models::{MaintenanceItem, NewReminder, ReminderTask, SourceType, TaskTemplate};

pub trait RecordStore {
    /// All items of a source type, active or not.
    fn list_items(&self, source: SourceType) -> Result<Vec<MaintenanceItem>>;
    fn get_item(&self, source: SourceType, id: u64) -> Result<Option<MaintenanceItem>>;
    /// Stores a new item under a fresh id of its source type.
    fn insert_item(&self, item: MaintenanceItem) -> Result<MaintenanceItem>;
    /// Replaces the stored item with the same source type and id.
    fn update_item(&self, item: &MaintenanceItem) -> Result<()>;

    fn list_reminders(&self) -> Result<Vec<ReminderTask>>;
    fn get_reminder(&self, id: u64) -> Result<Option<ReminderTask>>;
    /// Stores a new reminder. Ids only ever increase, deletes included.
    fn create_reminder(&self, new: NewReminder) -> Result<ReminderTask>;
    fn update_reminder(&self, task: &ReminderTask) -> Result<()>;
    /// Marks a reminder completed and inactive. Returns `false` if it was
    /// already inactive or does not exist.
    fn retire_reminder(&self, id: u64, completed_on: Option<NaiveDate>) -> Result<bool>;
    fn delete_reminder(&self, id: u64) -> Result<bool>;

    fn list_templates(&self) -> Result<Vec<TaskTemplate>>;
    fn insert_template(&self, template: TaskTemplate) -> Result<TaskTemplate>;
    fn delete_template(&self, id: u64) -> Result<bool>;

    fn list_active_items(&self, source: SourceType) -> Result<Vec<MaintenanceItem>> {
        let mut items = self.list_items(source)?;
        items.retain(|i| i.is_active);
        Ok(items)
    }

    /// Active items whose recomputed due date is on or before `horizon`.
    /// Dormant items are left out.
    fn list_due_before(&self, source: SourceType, horizon: NaiveDate) -> Result<Vec<MaintenanceItem>> {
        let mut items = self.list_active_items(source)?;
        items.retain(|i| compute_next_due(i).is_some_and(|d| d.date <= horizon));
        Ok(items)
    }

    fn list_active_reminders(&self) -> Result<Vec<ReminderTask>> {
        let mut tasks = self.list_reminders()?;
        tasks.retain(|t| t.is_active);
        Ok(tasks)
    }

    fn find_active_by_provenance(&self, key: &str) -> Result<Vec<ReminderTask>> {
        let mut tasks = self.list_active_reminders()?;
        tasks.retain(|t| t.provenance.as_deref() == Some(key));
        Ok(tasks)
    }
}

/// Highest id handed out per table, kept so a deleted id is never reused.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default)]
pub(crate) struct IdCounters {
    /// Keyed by source type name; item ids are per source type.
    pub items: BTreeMap<String, u64>,
    pub reminders: u64,
    pub templates: u64,
}

/// Next id after both the stored high-water mark and the ids still present.
/// Rows written before the counters existed are covered by the second.
fn bump(mark: &mut u64, present: impl Iterator<Item = u64>) -> u64 {
    *mark = (*mark).max(present.max().unwrap_or(0)) + 1;
    *mark
}

/// Plain collections shared by the in-memory and JSON stores.
#[derive(Debug, Default, Clone)]
pub(crate) struct Tables {
    pub items: Vec<MaintenanceItem>,
    pub reminders: Vec<ReminderTask>,
    pub templates: Vec<TaskTemplate>,
    pub counters: IdCounters,
}

impl Tables {
    pub fn insert_item(&mut self, mut item: MaintenanceItem) -> MaintenanceItem {
        let source = item.source_type();
        let mark = self.counters.items.entry(source.as_str().to_string()).or_insert(0);
        item.id = bump(
            mark,
            self.items.iter().filter(|i| i.source_type() == source).map(|i| i.id),
        );
        self.items.push(item.clone());
        item
    }

    pub fn update_item(&mut self, item: &MaintenanceItem) -> Result<()> {
        let source = item.source_type();
        match self
            .items
            .iter_mut()
            .find(|i| i.id == item.id && i.source_type() == source)
        {
            Some(slot) => {
                *slot = item.clone();
                Ok(())
            }
            None => Err(UpkeepError::ItemNotFound { source_type: source, id: item.id }),
        }
    }

    pub fn create_reminder(&mut self, new: NewReminder) -> ReminderTask {
        let id = bump(&mut self.counters.reminders, self.reminders.iter().map(|t| t.id));
        let task = ReminderTask {
            id,
            title: new.title,
            notes: new.notes,
            due_date: new.due_date,
            due_time: new.due_time,
            provenance: new.provenance,
            is_active: true,
            is_completed: false,
            created_at: Utc::now(),
            completed_on: None,
        };
        self.reminders.push(task.clone());
        task
    }

    pub fn update_reminder(&mut self, task: &ReminderTask) -> Result<()> {
        match self.reminders.iter_mut().find(|t| t.id == task.id) {
            Some(slot) => {
                *slot = task.clone();
                Ok(())
            }
            None => Err(UpkeepError::ReminderNotFound(task.id)),
        }
    }

    pub fn retire_reminder(&mut self, id: u64, completed_on: Option<NaiveDate>) -> bool {
        match self.reminders.iter_mut().find(|t| t.id == id && t.is_active) {
            Some(task) => {
                task.is_active = false;
                task.is_completed = true;
                task.completed_on = completed_on;
                true
            }
            None => false,
        }
    }

    pub fn delete_reminder(&mut self, id: u64) -> bool {
        let before = self.reminders.len();
        self.reminders.retain(|t| t.id != id);
        self.reminders.len() != before
    }

    pub fn insert_template(&mut self, mut template: TaskTemplate) -> TaskTemplate {
        template.id = bump(&mut self.counters.templates, self.templates.iter().map(|t| t.id));
        self.templates.push(template.clone());
        template
    }

    pub fn delete_template(&mut self, id: u64) -> bool {
        let before = self.templates.len();
        self.templates.retain(|t| t.id != id);
        self.templates.len() != before
    }
}

/// Mutex-guarded in-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>> {
        self.tables.lock().map_err(|_| UpkeepError::LockPoisoned)
    }
}

impl RecordStore for MemoryStore {
    fn list_items(&self, source: SourceType) -> Result<Vec<MaintenanceItem>> {
        Ok(self
            .tables()?
            .items
            .iter()
            .filter(|i| i.source_type() == source)
            .cloned()
            .collect())
    }

    fn get_item(&self, source: SourceType, id: u64) -> Result<Option<MaintenanceItem>> {
        Ok(self
            .tables()?
            .items
            .iter()
            .find(|i| i.id == id && i.source_type() == source)
            .cloned())
    }

    fn insert_item(&self, item: MaintenanceItem) -> Result<MaintenanceItem> {
        Ok(self.tables()?.insert_item(item))
    }

    fn update_item(&self, item: &MaintenanceItem) -> Result<()> {
        self.tables()?.update_item(item)
    }

    fn list_reminders(&self) -> Result<Vec<ReminderTask>> {
        Ok(self.tables()?.reminders.clone())
    }

    fn get_reminder(&self, id: u64) -> Result<Option<ReminderTask>> {
        Ok(self.tables()?.reminders.iter().find(|t| t.id == id).cloned())
    }

    fn create_reminder(&self, new: NewReminder) -> Result<ReminderTask> {
        Ok(self.tables()?.create_reminder(new))
    }

    fn update_reminder(&self, task: &ReminderTask) -> Result<()> {
        self.tables()?.update_reminder(task)
    }

    fn retire_reminder(&self, id: u64, completed_on: Option<NaiveDate>) -> Result<bool> {
        Ok(self.tables()?.retire_reminder(id, completed_on))
    }

    fn delete_reminder(&self, id: u64) -> Result<bool> {
        Ok(self.tables()?.delete_reminder(id))
    }

    fn list_templates(&self) -> Result<Vec<TaskTemplate>> {
        Ok(self.tables()?.templates.clone())
    }

    fn insert_template(&self, template: TaskTemplate) -> Result<TaskTemplate> {
        Ok(self.tables()?.insert_template(template))
    }

    fn delete_template(&self, id: u64) -> Result<bool> {
        Ok(self.tables()?.delete_template(id))
    }
}

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, UpkeepError};
use crate::models::{MaintenanceItem, NewReminder, ReminderTask, SourceType, TaskTemplate};
use crate::store::{IdCounters, RecordStore, Tables};

const ITEMS_FILE: &str = "items.json";
const REMINDERS_FILE: &str = "reminders.json";
const TEMPLATES_FILE: &str = "templates.json";
const COUNTERS_FILE: &str = "counters.json";

/// Returns the default data directory.
///
/// `~/.local/share/upkeep` on Linux, `./upkeep` if no data directory is known.
pub fn default_data_dir() -> PathBuf {
    let mut p = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    p.push("upkeep");
    p
}

/// Record store backed by pretty-printed JSON files in one directory: one per
/// table plus the id high-water marks.
///
/// Every operation is a full read-modify-write under a process-local lock.
/// Separate processes sharing the directory get last-writer-wins.
#[derive(Debug)]
pub struct JsonStore {
    dir: PathBuf,
    lock: Mutex<()>,
}

impl JsonStore {
    /// Opens (and creates if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| UpkeepError::Io { path: dir.clone(), source })?;
        Ok(Self { dir, lock: Mutex::new(()) })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Deletes the items, reminders, templates and id counter files.
    pub fn delete_database(&self) -> Result<()> {
        let _guard = self.lock.lock().map_err(|_| UpkeepError::LockPoisoned)?;
        for name in [ITEMS_FILE, REMINDERS_FILE, TEMPLATES_FILE, COUNTERS_FILE] {
            let path = self.dir.join(name);
            if path.exists() {
                fs::remove_file(&path).map_err(|source| UpkeepError::Io { path, source })?;
            }
        }
        Ok(())
    }

    fn load(&self) -> Result<Tables> {
        Ok(Tables {
            items: load_table(&self.dir.join(ITEMS_FILE), "items")?,
            reminders: load_table(&self.dir.join(REMINDERS_FILE), "reminders")?,
            templates: load_table(&self.dir.join(TEMPLATES_FILE), "templates")?,
            counters: load_counters(&self.dir.join(COUNTERS_FILE))?,
        })
    }

    fn save(&self, tables: &Tables) -> Result<()> {
        save_table(&self.dir.join(ITEMS_FILE), &tables.items, "items")?;
        save_table(&self.dir.join(REMINDERS_FILE), &tables.reminders, "reminders")?;
        save_table(&self.dir.join(TEMPLATES_FILE), &tables.templates, "templates")?;
        save_table(&self.dir.join(COUNTERS_FILE), &tables.counters, "counters")
    }

    fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> Result<R> {
        let _guard = self.lock.lock().map_err(|_| UpkeepError::LockPoisoned)?;
        Ok(f(&self.load()?))
    }

    fn write<R>(&self, f: impl FnOnce(&mut Tables) -> Result<R>) -> Result<R> {
        let _guard = self.lock.lock().map_err(|_| UpkeepError::LockPoisoned)?;
        let mut tables = self.load()?;
        let out = f(&mut tables)?;
        self.save(&tables)?;
        Ok(out)
    }
}

/// Loads a JSON array, treating a missing file as empty.
fn load_table<T: DeserializeOwned>(path: &Path, what: &'static str) -> Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let s = fs::read_to_string(path).map_err(|source| UpkeepError::Io { path: path.to_path_buf(), source })?;
    if s.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&s).map_err(|source| UpkeepError::Json { what, source })
}

/// Missing counters start from zero; ids then continue after the rows present.
fn load_counters(path: &Path) -> Result<IdCounters> {
    if !path.exists() {
        return Ok(IdCounters::default());
    }
    let s = fs::read_to_string(path).map_err(|source| UpkeepError::Io { path: path.to_path_buf(), source })?;
    if s.trim().is_empty() {
        return Ok(IdCounters::default());
    }
    serde_json::from_str(&s).map_err(|source| UpkeepError::Json { what: "counters", source })
}

/// Writes through a temporary file so a crash never leaves half a table.
fn save_table<T: Serialize + ?Sized>(path: &Path, value: &T, what: &'static str) -> Result<()> {
    let s = serde_json::to_string_pretty(value).map_err(|source| UpkeepError::Json { what, source })?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, s).map_err(|source| UpkeepError::Io { path: tmp.clone(), source })?;
    fs::rename(&tmp, path).map_err(|source| UpkeepError::Io { path: path.to_path_buf(), source })
}

impl RecordStore for JsonStore {
    fn list_items(&self, source: SourceType) -> Result<Vec<MaintenanceItem>> {
        self.read(|t| {
            t.items
                .iter()
                .filter(|i| i.source_type() == source)
                .cloned()
                .collect()
        })
    }

    fn get_item(&self, source: SourceType, id: u64) -> Result<Option<MaintenanceItem>> {
        self.read(|t| {
            t.items
                .iter()
                .find(|i| i.id == id && i.source_type() == source)
                .cloned()
        })
    }

    fn insert_item(&self, item: MaintenanceItem) -> Result<MaintenanceItem> {
        self.write(|t| Ok(t.insert_item(item)))
    }

    fn update_item(&self, item: &MaintenanceItem) -> Result<()> {
        self.write(|t| t.update_item(item))
    }

    fn list_reminders(&self) -> Result<Vec<ReminderTask>> {
        self.read(|t| t.reminders.clone())
    }

    fn get_reminder(&self, id: u64) -> Result<Option<ReminderTask>> {
        self.read(|t| t.reminders.iter().find(|r| r.id == id).cloned())
    }

    fn create_reminder(&self, new: NewReminder) -> Result<ReminderTask> {
        self.write(|t| Ok(t.create_reminder(new)))
    }

    fn update_reminder(&self, task: &ReminderTask) -> Result<()> {
        self.write(|t| t.update_reminder(task))
    }

    fn retire_reminder(&self, id: u64, completed_on: Option<NaiveDate>) -> Result<bool> {
        self.write(|t| Ok(t.retire_reminder(id, completed_on)))
    }

    fn delete_reminder(&self, id: u64) -> Result<bool> {
        self.write(|t| Ok(t.delete_reminder(id)))
    }

    fn list_templates(&self) -> Result<Vec<TaskTemplate>> {
        self.read(|t| t.templates.clone())
    }

    fn insert_template(&self, template: TaskTemplate) -> Result<TaskTemplate> {
        self.write(|t| Ok(t.insert_template(template)))
    }

    fn delete_template(&self, id: u64) -> Result<bool> {
        self.write(|t| Ok(t.delete_template(id)))
    }
}

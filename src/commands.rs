use std::io::{self, Write};

use chrono::{Days, NaiveDate, NaiveTime};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use crate::completion::{complete_item, on_reminder_completed, Completion, CompletionReport, ItemCompletion};
use crate::due::{compute_next_due, days_until, refresh, status_by_basis, DueStatus};
use crate::error::{Result, UpkeepError};
use crate::models::{MaintenanceItem, NewReminder, ReminderTask, SourceType, Subject, TaskTemplate};
use crate::recurrence::{next_occurrence, occurrences_between, RecurrenceKind, RecurrencePattern};
use crate::storage::JsonStore;
use crate::store::RecordStore;
use crate::sync::{sync, sync_all, SyncStats, SyncWindow};

/// Parses a `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| UpkeepError::InvalidDate(s.to_string()))
}

/// Parses an optional date, defaulting to `today`.
fn date_or(s: Option<&str>, today: NaiveDate) -> Result<NaiveDate> {
    s.map(parse_date).transpose().map(|d| d.unwrap_or(today))
}

fn parse_time(s: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M").map_err(|_| UpkeepError::InvalidDate(s.to_string()))
}

fn time_left(days: i64) -> String {
    if days < 0 {
        format!("{}d overdue", days.abs())
    } else if days == 0 {
        "Today".to_string()
    } else {
        format!("{}d", days)
    }
}

fn status_color(status: DueStatus) -> Color {
    match status {
        DueStatus::Overdue => Color::Red,
        DueStatus::DueSoon => Color::Yellow,
        DueStatus::Ok => Color::Green,
        DueStatus::Unknown => Color::Grey,
    }
}

fn header(names: &[&str]) -> Vec<Cell> {
    names.iter().map(|n| Cell::new(n).add_attribute(Attribute::Bold)).collect()
}

fn fmt_num(v: Option<f64>) -> String {
    v.map(|v| format!("{:.0}", v)).unwrap_or_else(|| "-".into())
}

fn fmt_date(d: Option<NaiveDate>) -> String {
    d.map(|d| d.to_string()).unwrap_or_else(|| "-".into())
}

/// Fields for a new maintenance item.
#[derive(Debug, Clone, Default)]
pub struct NewItemArgs {
    pub label: String,
    /// Subject name: animal, plant, vehicle, area, member...
    pub name: String,
    pub location: Option<String>,
    pub every_days: Option<u32>,
    /// Usage interval on the item's meter (hours or distance).
    pub every_usage: Option<f64>,
    pub last: Option<String>,
    pub last_reading: Option<f64>,
    pub due: Option<String>,
    pub notes: Option<String>,
}

/// Adds a maintenance item and syncs its source type.
pub fn cmd_item_add(
    store: &dyn RecordStore,
    source: SourceType,
    args: NewItemArgs,
    window: SyncWindow,
    silent: bool,
) -> Result<MaintenanceItem> {
    let mut item = MaintenanceItem::new(0, args.label, Subject::build(source, &args.name, args.location));
    item.frequency_days = args.every_days;
    item.last_completed = args.last.as_deref().map(parse_date).transpose()?;
    item.manual_due_date = args.due.as_deref().map(parse_date).transpose()?;
    item.notes = args.notes;
    if let Some(meter) = item.subject.meter_mut() {
        meter.frequency = args.every_usage;
        meter.last_reading = args.last_reading;
        meter.current_reading = args.last_reading;
    }
    refresh(&mut item);
    let item = store.insert_item(item)?;
    let stats = sync(store, source, window)?;
    if !silent {
        println!("Item added ({} {}), next due {}", source, item.id, fmt_date(item.next_due_date));
        print_stats(&stats);
    }
    Ok(item)
}

/// Lists maintenance items with their due status, soonest first.
pub fn cmd_item_list(store: &dyn RecordStore, source: Option<SourceType>, all: bool, today: NaiveDate) -> Result<()> {
    let sources: Vec<SourceType> = match source {
        Some(s) => vec![s],
        None => SourceType::ALL.to_vec(),
    };
    let mut items = Vec::new();
    for s in sources {
        items.extend(store.list_items(s)?);
    }
    if !all {
        items.retain(|i| i.is_active);
    }
    if items.is_empty() {
        println!("No items found.");
        return Ok(());
    }
    items.sort_by_key(|i| (days_until(i, today).unwrap_or(i64::MAX), i.source_type(), i.id));

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header(&[
            "Type", "ID", "Label", "Subject", "Every", "Last", "Next Due", "Left", "Status", "Usage",
        ]));

    for item in items {
        let basis = status_by_basis(&item, today);
        let every = match (item.frequency_days, item.subject.meter().and_then(|(_, m)| m.frequency)) {
            (Some(d), Some(u)) => format!("{}d / {:.0}", d, u),
            (Some(d), None) => format!("{}d", d),
            (None, Some(u)) => format!("{:.0}", u),
            (None, None) => "-".into(),
        };
        let left = days_until(&item, today).map(time_left).unwrap_or_else(|| "-".into());
        let usage = match (basis.usage, item.subject.meter()) {
            (Some((_, st)), Some((_, meter))) => format!("{} @ {}", st, fmt_num(meter.next_due)),
            _ => "-".into(),
        };
        let usage_color = basis.usage.map(|(_, st)| status_color(st)).unwrap_or(Color::Reset);
        let status = if item.is_active { basis.date.to_string() } else { "inactive".into() };

        table.add_row(vec![
            Cell::new(item.source_type()),
            Cell::new(item.id),
            Cell::new(&item.label),
            Cell::new(item.subject.name()),
            Cell::new(every),
            Cell::new(fmt_date(item.last_completed)),
            Cell::new(fmt_date(compute_next_due(&item).map(|d| d.date))),
            Cell::new(left),
            Cell::new(status).fg(status_color(basis.date)),
            Cell::new(usage).fg(usage_color),
        ]);
    }

    println!("{table}");
    Ok(())
}

/// Changes to an existing item. `None` leaves a field alone.
#[derive(Debug, Clone, Default)]
pub struct ItemEdit {
    pub label: Option<String>,
    pub every_days: Option<u32>,
    pub every_usage: Option<f64>,
    pub last: Option<String>,
    pub due: Option<String>,
    pub reading: Option<f64>,
    pub notes: Option<String>,
}

/// Edits an item, recomputes its due dates and syncs its source type.
pub fn cmd_item_edit(
    store: &dyn RecordStore,
    source: SourceType,
    id: u64,
    edit: ItemEdit,
    window: SyncWindow,
    silent: bool,
) -> Result<MaintenanceItem> {
    let mut item = store
        .get_item(source, id)?
        .ok_or(UpkeepError::ItemNotFound { source_type: source, id })?;
    if let Some(l) = edit.label { item.label = l; }
    if let Some(d) = edit.every_days { item.frequency_days = Some(d); }
    if let Some(n) = edit.notes { item.notes = Some(n); }
    if let Some(d) = edit.last { item.last_completed = Some(parse_date(&d)?); }
    let manual = edit.due.is_some();
    if let Some(d) = edit.due { item.manual_due_date = Some(parse_date(&d)?); }
    if let Some(meter) = item.subject.meter_mut() {
        if let Some(u) = edit.every_usage { meter.frequency = Some(u); }
        if let Some(r) = edit.reading { meter.current_reading = Some(r); }
    }
    refresh(&mut item);
    store.update_item(&item)?;
    let stats = sync(store, source, window)?;
    if !silent {
        println!("Item {} {} updated, next due {}.", source, id, fmt_date(item.next_due_date));
        if manual && item.manual_due_date.is_none() {
            println!("Note: the item's last completion and interval take precedence over a manual due date.");
        }
        print_stats(&stats);
    }
    Ok(item)
}

/// Marks an item done without going through its reminder.
pub fn cmd_item_done(
    store: &dyn RecordStore,
    source: SourceType,
    id: u64,
    on: Option<String>,
    reading: Option<f64>,
    window: SyncWindow,
    silent: bool,
) -> Result<ItemCompletion> {
    let done = Completion { on: date_or(on.as_deref(), window.today)?, reading };
    let outcome = complete_item(store, source, id, done, window)?;
    if !silent {
        println!(
            "Item {} {} done on {}, next due {}.",
            source,
            id,
            done.on,
            fmt_date(outcome.item.next_due_date)
        );
        print_stats(&outcome.sync);
    }
    Ok(outcome)
}

/// Deactivates an item and retires its reminders.
pub fn cmd_item_remove(store: &dyn RecordStore, source: SourceType, id: u64, window: SyncWindow, silent: bool) -> Result<()> {
    let mut item = store
        .get_item(source, id)?
        .ok_or(UpkeepError::ItemNotFound { source_type: source, id })?;
    item.is_active = false;
    store.update_item(&item)?;
    let stats = sync(store, source, window)?;
    if !silent {
        println!("Item {} {} deactivated.", source, id);
        print_stats(&stats);
    }
    Ok(())
}

fn print_stats(stats: &SyncStats) {
    if !stats.is_noop() {
        println!(
            "Reminders: {} created, {} updated, {} retired.",
            stats.created, stats.updated, stats.retired
        );
    }
}

/// Syncs one source type, or all of them.
pub fn cmd_sync(store: &dyn RecordStore, source: Option<SourceType>, window: SyncWindow, silent: bool) -> Result<SyncStats> {
    let stats = match source {
        Some(s) => sync(store, s, window)?,
        None => sync_all(store, window),
    };
    if !silent {
        if stats.is_noop() {
            println!("Reminders already up to date.");
        } else {
            print_stats(&stats);
        }
    }
    Ok(stats)
}

/// Adds a user-authored reminder.
pub fn cmd_reminder_add(
    store: &dyn RecordStore,
    title: String,
    due: String,
    time: Option<String>,
    silent: bool,
) -> Result<ReminderTask> {
    let task = store.create_reminder(NewReminder {
        title,
        notes: None,
        due_date: parse_date(&due)?,
        due_time: time.as_deref().map(parse_time).transpose()?,
        provenance: None,
    })?;
    if !silent { println!("Reminder added (id = {})", task.id); }
    Ok(task)
}

/// Lists reminders by due date. Completed ones only with `all`.
pub fn cmd_reminder_list(store: &dyn RecordStore, all: bool, today: NaiveDate) -> Result<()> {
    let mut tasks = store.list_reminders()?;
    if !all {
        tasks.retain(|t| t.is_active);
    }
    if tasks.is_empty() {
        println!("No reminders found.");
        return Ok(());
    }
    tasks.sort_by_key(|t| (t.due_date, t.due_time, t.id));

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header(&["ID", "Title", "Due", "Left", "For", "Source", "Status"]));

    for t in tasks {
        let days_left = (t.due_date - today).num_days();
        let status = if t.is_completed { "Done" } else if t.is_active { "Pending" } else { "Retired" };
        let done_color = if t.is_completed { Color::Green } else { Color::Yellow };
        let source = t.provenance.clone().unwrap_or_else(|| "user".into());
        table.add_row(vec![
            Cell::new(t.id),
            Cell::new(&t.title),
            Cell::new(match t.due_time {
                Some(time) => format!("{} {}", t.due_date, time.format("%H:%M")),
                None => t.due_date.to_string(),
            }),
            Cell::new(time_left(days_left)).fg(if days_left < 0 && t.is_active { Color::Red } else { Color::Reset }),
            Cell::new(t.notes.clone().unwrap_or_default()),
            Cell::new(source),
            Cell::new(status).fg(done_color),
        ]);
    }

    println!("{table}");
    Ok(())
}

/// Completes a reminder, propagating to its items.
pub fn cmd_reminder_done(
    store: &dyn RecordStore,
    id: u64,
    on: Option<String>,
    reading: Option<f64>,
    window: SyncWindow,
    silent: bool,
) -> Result<CompletionReport> {
    let done = Completion { on: date_or(on.as_deref(), window.today)?, reading };
    let report = on_reminder_completed(store, id, done, window)?;
    if !silent {
        if report.already_completed {
            println!("Reminder {} was already completed.", id);
        } else {
            println!("Reminder {} marked as complete.", id);
            if !report.updated_items.is_empty() {
                println!("Recorded completion on {} item(s).", report.updated_items.len());
            }
            print_stats(&report.sync);
        }
    }
    Ok(report)
}

/// Deletes a user-authored reminder. Generated reminders are left alone
/// since the next sync would bring them back.
pub fn cmd_reminder_remove(store: &dyn RecordStore, id: u64, silent: bool) -> Result<bool> {
    let task = store.get_reminder(id)?.ok_or(UpkeepError::ReminderNotFound(id))?;
    if task.is_generated() {
        if !silent {
            eprintln!("Reminder {} is generated from maintenance items; complete it or edit the items instead.", id);
        }
        return Ok(false);
    }
    let removed = store.delete_reminder(id)?;
    if !silent && removed { println!("Reminder {} removed.", id); }
    Ok(removed)
}

/// Adds a recurring task template.
pub fn cmd_template_add(
    store: &dyn RecordStore,
    title: String,
    start: String,
    repeat: String,
    time: Option<String>,
    silent: bool,
) -> Result<TaskTemplate> {
    let kind: RecurrenceKind = repeat.parse()?;
    let template = store.insert_template(TaskTemplate {
        id: 0,
        title,
        pattern: RecurrencePattern::new(parse_date(&start)?, kind),
        due_time: time.as_deref().map(parse_time).transpose()?,
    })?;
    if !silent { println!("Template '{}' added (id = {}).", template.title, template.id); }
    Ok(template)
}

/// Lists recurring templates with their next occurrence.
pub fn cmd_template_list(store: &dyn RecordStore, today: NaiveDate) -> Result<()> {
    let templates = store.list_templates()?;
    if templates.is_empty() {
        println!("No templates found.");
        return Ok(());
    }
    let mut table = Table::new();
    table.load_preset(UTF8_FULL)
        .set_header(vec!["ID", "Title", "Repeats", "Since", "Next"]);
    for t in templates {
        table.add_row(vec![
            t.id.to_string(),
            t.title.clone(),
            t.pattern.kind.to_string(),
            t.pattern.origin.to_string(),
            fmt_date(next_occurrence(&t.pattern, today)),
        ]);
    }
    println!("{table}");
    Ok(())
}

/// Removes a recurring template.
pub fn cmd_template_remove(store: &dyn RecordStore, id: u64, silent: bool) -> Result<()> {
    if !store.delete_template(id)? {
        return Err(UpkeepError::TemplateNotFound(id));
    }
    if !silent { println!("Template {} removed.", id); }
    Ok(())
}

/// One line of a calendar view.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEntry {
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub title: String,
    /// Reminder id for stored reminders, `None` for projected template occurrences.
    pub reminder_id: Option<u64>,
}

/// Active reminders and projected template occurrences in `from..=to`.
pub fn calendar_entries(store: &dyn RecordStore, from: NaiveDate, to: NaiveDate) -> Result<Vec<CalendarEntry>> {
    let mut entries: Vec<CalendarEntry> = store
        .list_active_reminders()?
        .into_iter()
        .filter(|t| t.due_date >= from && t.due_date <= to)
        .map(|t| CalendarEntry { date: t.due_date, time: t.due_time, title: t.title, reminder_id: Some(t.id) })
        .collect();
    for template in store.list_templates()? {
        entries.extend(occurrences_between(&template.pattern, from, to).map(|date| CalendarEntry {
            date,
            time: template.due_time,
            title: template.title.clone(),
            reminder_id: None,
        }));
    }
    entries.sort_by(|a, b| (a.date, a.time, &a.title).cmp(&(b.date, b.time, &b.title)));
    Ok(entries)
}

/// Prints `days` days of calendar starting at `from`.
pub fn cmd_calendar(store: &dyn RecordStore, from: NaiveDate, days: u32) -> Result<()> {
    let to = from
        .checked_add_days(Days::new(u64::from(days.max(1)) - 1))
        .ok_or_else(|| UpkeepError::InvalidDate(format!("{} plus {} days", from, days)))?;
    let entries = calendar_entries(store, from, to)?;
    if entries.is_empty() {
        println!("Nothing scheduled between {} and {}.", from, to);
        return Ok(());
    }
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header(&["Date", "Time", "Title", "Kind"]));
    for e in entries {
        table.add_row(vec![
            Cell::new(e.date.format("%a %Y-%m-%d")),
            Cell::new(e.time.map(|t| t.format("%H:%M").to_string()).unwrap_or_default()),
            Cell::new(&e.title),
            match e.reminder_id {
                Some(id) => Cell::new(format!("reminder #{}", id)),
                None => Cell::new("recurring").fg(Color::Cyan),
            },
        ]);
    }
    println!("{table}");
    Ok(())
}

/// Resets the database by deleting all items, reminders and templates.
pub fn cmd_reset(store: &JsonStore, force: bool) -> Result<()> {
    if !force {
        print!("Are you sure you want to delete all items, reminders and templates? This cannot be undone. [y/N] ");
        io::stdout().flush().map_err(|source| UpkeepError::Io { path: "<stdout>".into(), source })?;
        let mut input = String::new();
        io::stdin()
            .read_line(&mut input)
            .map_err(|source| UpkeepError::Io { path: "<stdin>".into(), source })?;
        if input.trim().to_lowercase() != "y" {
            println!("Aborted.");
            return Ok(());
        }
    }
    store.delete_database()?;
    println!("Database reset successfully.");
    Ok(())
}

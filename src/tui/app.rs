use chrono::{Local, NaiveDate};
use ratatui::widgets::TableState;

use crate::commands::{cmd_item_done, cmd_item_edit, cmd_reminder_done, parse_date, ItemEdit};
use crate::due::days_until;
use crate::error::Result;
use crate::models::{MaintenanceItem, ReminderTask, SourceType};
use crate::store::RecordStore;
use crate::sync::{sync_all, SyncWindow};

#[derive(PartialEq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Clone, Copy, PartialEq)]
pub enum ViewMode {
    Reminders,
    Items,
}

pub struct App<'a> {
    store: &'a dyn RecordStore,
    horizon_days: i64,
    pub reminders: Vec<ReminderTask>,
    pub items: Vec<MaintenanceItem>,
    pub reminder_state: TableState,
    pub item_state: TableState,
    pub view_mode: ViewMode,
    pub input_mode: InputMode,
    pub input_buffer: String,
    /// Item whose manual due date is being edited.
    pub target: Option<(SourceType, u64)>,
    pub show_completed: bool,
    /// Last action's outcome, shown in the help bar.
    pub message: Option<String>,
}

fn select_within(state: &mut TableState, len: usize) {
    if len == 0 {
        state.select(None);
    } else if let Some(i) = state.selected() {
        if i >= len {
            state.select(Some(len - 1));
        }
    } else {
        state.select(Some(0));
    }
}

fn step(state: &mut TableState, len: usize, forward: bool) {
    if len == 0 {
        return;
    }
    let i = match state.selected() {
        Some(i) if forward => if i >= len - 1 { 0 } else { i + 1 },
        Some(i) => if i == 0 { len - 1 } else { i - 1 },
        None => 0,
    };
    state.select(Some(i));
}

impl<'a> App<'a> {
    pub fn new(store: &'a dyn RecordStore, horizon_days: i64) -> App<'a> {
        let mut app = App {
            store,
            horizon_days,
            reminders: Vec::new(),
            items: Vec::new(),
            reminder_state: TableState::default(),
            item_state: TableState::default(),
            view_mode: ViewMode::Reminders,
            input_mode: InputMode::Normal,
            input_buffer: String::new(),
            target: None,
            show_completed: false,
            message: None,
        };
        app.reload();
        app
    }

    pub fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn window(&self) -> SyncWindow {
        SyncWindow::new(self.today(), self.horizon_days)
    }

    pub fn next(&mut self) {
        match self.view_mode {
            ViewMode::Reminders => step(&mut self.reminder_state, self.reminders.len(), true),
            ViewMode::Items => step(&mut self.item_state, self.items.len(), true),
        }
    }

    pub fn previous(&mut self) {
        match self.view_mode {
            ViewMode::Reminders => step(&mut self.reminder_state, self.reminders.len(), false),
            ViewMode::Items => step(&mut self.item_state, self.items.len(), false),
        }
    }

    fn selected_reminder(&self) -> Option<&ReminderTask> {
        self.reminder_state.selected().and_then(|i| self.reminders.get(i))
    }

    fn selected_item(&self) -> Option<&MaintenanceItem> {
        self.item_state.selected().and_then(|i| self.items.get(i))
    }

    /// Completes the selected reminder, or marks the selected item done today.
    pub fn complete_selected(&mut self) {
        let outcome = match self.view_mode {
            ViewMode::Reminders => match self.selected_reminder() {
                Some(t) => {
                    let id = t.id;
                    cmd_reminder_done(self.store, id, None, None, self.window(), true).map(|report| {
                        if report.already_completed {
                            format!("Reminder {} was already completed", id)
                        } else {
                            format!("Reminder {} done, {} item(s) updated", id, report.updated_items.len())
                        }
                    })
                }
                None => return,
            },
            ViewMode::Items => match self.selected_item() {
                Some(item) => {
                    let (source, id) = (item.source_type(), item.id);
                    cmd_item_done(self.store, source, id, None, None, self.window(), true)
                        .map(|done| format!("{} marked done", done.item.label))
                }
                None => return,
            },
        };
        self.finish(outcome);
    }

    pub fn sync(&mut self) {
        let stats = sync_all(self.store, self.window());
        self.message = Some(format!(
            "Synced: {} created, {} updated, {} retired",
            stats.created, stats.updated, stats.retired
        ));
        self.reload();
    }

    fn finish(&mut self, outcome: Result<String>) {
        self.message = Some(match outcome {
            Ok(m) => m,
            Err(e) => format!("Error: {}", e),
        });
        self.reload();
    }

    /// Refreshes both lists from the store.
    pub fn reload(&mut self) {
        match self.load() {
            Ok(()) => {}
            Err(e) => self.message = Some(format!("Error: {}", e)),
        }
        select_within(&mut self.reminder_state, self.reminders.len());
        select_within(&mut self.item_state, self.items.len());
    }

    fn load(&mut self) -> Result<()> {
        let mut reminders = self.store.list_reminders()?;
        if !self.show_completed {
            reminders.retain(|t| t.is_active);
        }
        reminders.sort_by_key(|t| (t.due_date, t.due_time, t.id));
        self.reminders = reminders;

        let today = self.today();
        let mut items = Vec::new();
        for source in SourceType::ALL {
            items.extend(self.store.list_active_items(source)?);
        }
        items.sort_by_key(|i| (days_until(i, today).unwrap_or(i64::MAX), i.source_type(), i.id));
        self.items = items;
        Ok(())
    }

    pub fn toggle_completed(&mut self) {
        self.show_completed = !self.show_completed;
        self.reload();
    }

    pub fn toggle_view(&mut self) {
        self.view_mode = match self.view_mode {
            ViewMode::Reminders => ViewMode::Items,
            ViewMode::Items => ViewMode::Reminders,
        };
    }

    /// Opens the manual due date prompt for the selected item.
    pub fn start_due_edit(&mut self) {
        if self.view_mode != ViewMode::Items {
            return;
        }
        if let Some(item) = self.selected_item() {
            let target = (item.source_type(), item.id);
            let prefill = item.next_due_date.map(|d| d.to_string()).unwrap_or_default();
            self.target = Some(target);
            self.input_buffer = prefill;
            self.input_mode = InputMode::Editing;
        }
    }

    pub fn cancel_input(&mut self) {
        self.input_mode = InputMode::Normal;
        self.input_buffer.clear();
        self.target = None;
    }

    pub fn handle_input(&mut self) {
        let Some((source, id)) = self.target.take() else {
            self.cancel_input();
            return;
        };
        let input = std::mem::take(&mut self.input_buffer);
        self.input_mode = InputMode::Normal;
        let outcome = parse_date(&input).and_then(|due| {
            let edit = ItemEdit { due: Some(due.to_string()), ..ItemEdit::default() };
            cmd_item_edit(self.store, source, id, edit, self.window(), true)
        });
        let outcome = outcome.map(|item| match item.next_due_date {
            Some(d) => format!("{} now due {}", item.label, d),
            None => format!("{} updated", item.label),
        });
        self.finish(outcome);
    }
}

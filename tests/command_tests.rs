use chrono::NaiveDate;
use tempfile::TempDir;
use upkeep::commands::*;
use upkeep::config::Config;
use upkeep::error::UpkeepError;
use upkeep::models::SourceType;
use upkeep::storage::JsonStore;
use upkeep::store::RecordStore;
use upkeep::sync::SyncWindow;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn with_test_db<F>(f: F)
where
    F: FnOnce(&JsonStore, SyncWindow),
{
    let dir = TempDir::new().unwrap();
    let store = JsonStore::open(dir.path()).unwrap();
    f(&store, SyncWindow::new(date(2025, 3, 1), 90));
}

fn goat(name: &str) -> NewItemArgs {
    NewItemArgs {
        label: "Worming".into(),
        name: name.into(),
        location: Some("Barn".into()),
        every_days: Some(60),
        last: Some("2025-01-01".into()),
        ..NewItemArgs::default()
    }
}

#[test]
fn test_item_add_creates_reminder() {
    with_test_db(|store, window| {
        let item = cmd_item_add(store, SourceType::AnimalCare, goat("Bella"), window, true).unwrap();
        assert_eq!(item.id, 1);
        assert_eq!(item.next_due_date, Some(date(2025, 3, 2)));

        cmd_item_add(store, SourceType::AnimalCare, goat("Daisy"), window, true).unwrap();
        let active = store.list_active_reminders().unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].title, "Worming (Barn)");
        assert_eq!(active[0].provenance.as_deref(), Some("auto:care_group:2025-03-02_worming@barn"));
    });
}

#[test]
fn test_item_add_rejects_bad_date() {
    with_test_db(|store, window| {
        let args = NewItemArgs { last: Some("01/01/2025".into()), ..goat("Bella") };
        let err = cmd_item_add(store, SourceType::AnimalCare, args, window, true).unwrap_err();
        assert!(matches!(err, UpkeepError::InvalidDate(_)));
        assert!(store.list_items(SourceType::AnimalCare).unwrap().is_empty());
    });
}

#[test]
fn test_reminder_done_rolls_group_forward() {
    with_test_db(|store, window| {
        cmd_item_add(store, SourceType::AnimalCare, goat("Bella"), window, true).unwrap();
        cmd_item_add(store, SourceType::AnimalCare, goat("Daisy"), window, true).unwrap();
        let id = store.list_active_reminders().unwrap()[0].id;

        let report = cmd_reminder_done(store, id, Some("2025-03-02".into()), None, window, true).unwrap();
        assert_eq!(report.updated_items, vec![1, 2]);

        let active = store.list_active_reminders().unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].due_date, date(2025, 5, 1));
    });
}

#[test]
fn test_item_edit_reschedules() {
    with_test_db(|store, window| {
        let args = NewItemArgs {
            label: "Rotate tires".into(),
            name: "Truck".into(),
            due: Some("2025-03-20".into()),
            ..NewItemArgs::default()
        };
        let item = cmd_item_add(store, SourceType::VehicleMaintenance, args, window, true).unwrap();

        let edit = ItemEdit { due: Some("2025-04-02".into()), ..ItemEdit::default() };
        cmd_item_edit(store, SourceType::VehicleMaintenance, item.id, edit, window, true).unwrap();

        let active = store.list_active_reminders().unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].due_date, date(2025, 4, 2));
        assert_eq!(active[0].title, "Rotate tires: Truck");
    });
}

#[test]
fn test_item_done_and_remove() {
    with_test_db(|store, window| {
        let args = NewItemArgs {
            label: "Grease bearings".into(),
            name: "Tractor".into(),
            every_days: Some(30),
            every_usage: Some(50.0),
            last: Some("2025-02-10".into()),
            last_reading: Some(900.0),
            ..NewItemArgs::default()
        };
        let item = cmd_item_add(store, SourceType::EquipmentMaintenance, args, window, true).unwrap();

        let done = cmd_item_done(
            store,
            SourceType::EquipmentMaintenance,
            item.id,
            Some("2025-03-05".into()),
            Some(940.0),
            window,
            true,
        )
        .unwrap();
        assert_eq!(done.reminders_closed, 1);
        assert_eq!(done.item.next_due_date, Some(date(2025, 4, 4)));
        assert_eq!(done.item.subject.meter().unwrap().1.next_due, Some(990.0));

        cmd_item_remove(store, SourceType::EquipmentMaintenance, item.id, window, true).unwrap();
        assert!(store.list_active_reminders().unwrap().is_empty());
        assert!(!store.get_item(SourceType::EquipmentMaintenance, item.id).unwrap().unwrap().is_active);
    });
}

#[test]
fn test_generated_reminder_cannot_be_removed() {
    with_test_db(|store, window| {
        cmd_item_add(store, SourceType::AnimalCare, goat("Bella"), window, true).unwrap();
        let generated = store.list_active_reminders().unwrap()[0].id;
        assert!(!cmd_reminder_remove(store, generated, true).unwrap());

        let mine = cmd_reminder_add(store, "Order hay".into(), "2025-03-04".into(), Some("08:30".into()), true).unwrap();
        assert!(cmd_reminder_remove(store, mine.id, true).unwrap());
        assert_eq!(store.list_reminders().unwrap().len(), 1);
    });
}

#[test]
fn test_template_calendar() {
    with_test_db(|store, _| {
        let template = cmd_template_add(
            store,
            "Collect eggs".into(),
            "2025-02-27".into(),
            "every:2".into(),
            None,
            true,
        )
        .unwrap();
        cmd_reminder_add(store, "Farrier".into(), "2025-03-03".into(), Some("09:00".into()), true).unwrap();

        let entries = calendar_entries(store, date(2025, 3, 1), date(2025, 3, 4)).unwrap();
        let summary: Vec<(NaiveDate, &str, bool)> = entries
            .iter()
            .map(|e| (e.date, e.title.as_str(), e.reminder_id.is_some()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (date(2025, 3, 1), "Collect eggs", false),
                (date(2025, 3, 3), "Collect eggs", false),
                (date(2025, 3, 3), "Farrier", true),
            ]
        );

        cmd_template_remove(store, template.id, true).unwrap();
        assert!(matches!(
            cmd_template_remove(store, template.id, true),
            Err(UpkeepError::TemplateNotFound(_))
        ));
    });
}

#[test]
fn test_template_rejects_bad_pattern() {
    with_test_db(|store, _| {
        let err = cmd_template_add(store, "Nope".into(), "2025-01-01".into(), "sometimes".into(), None, true).unwrap_err();
        assert!(matches!(err, UpkeepError::InvalidPattern(_)));
    });
}

#[test]
fn test_json_store_persists_across_reopen() {
    let dir = TempDir::new().unwrap();
    let window = SyncWindow::new(date(2025, 3, 1), 90);
    {
        let store = JsonStore::open(dir.path()).unwrap();
        cmd_item_add(&store, SourceType::AnimalCare, goat("Bella"), window, true).unwrap();
    }
    let store = JsonStore::open(dir.path()).unwrap();
    assert_eq!(store.list_items(SourceType::AnimalCare).unwrap().len(), 1);
    assert_eq!(store.list_active_reminders().unwrap().len(), 1);

    cmd_reset(&store, true).unwrap();
    assert!(store.list_items(SourceType::AnimalCare).unwrap().is_empty());
    assert!(store.list_reminders().unwrap().is_empty());
}

#[test]
fn test_sync_command_reports_noop() {
    with_test_db(|store, window| {
        cmd_item_add(store, SourceType::AnimalCare, goat("Bella"), window, true).unwrap();
        assert!(cmd_sync(store, None, window, true).unwrap().is_noop());
        assert!(cmd_sync(store, Some(SourceType::AnimalCare), window, true).unwrap().is_noop());
    });
}

#[test]
fn test_config_round_trip_and_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");

    let defaults = Config::load(&path).unwrap();
    assert_eq!(defaults.horizon_days, 90);
    assert_eq!(defaults.watch_interval_minutes, 60);

    let config = Config {
        data_dir: dir.path().join("data"),
        horizon_days: 21,
        watch_interval_minutes: 15,
    };
    config.save(&path).unwrap();
    assert_eq!(Config::load(&path).unwrap(), config);

    std::fs::write(&path, "horizon_days = \"soon\"").unwrap();
    assert!(matches!(Config::load(&path), Err(UpkeepError::ConfigParse { .. })));
}

#[test]
fn test_config_partial_file_keeps_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "horizon_days = 30\n").unwrap();
    let config = Config::load(&path).unwrap();
    assert_eq!(config.horizon_days, 30);
    assert_eq!(config.watch_interval_minutes, 60);
}

#[test]
fn test_calendar_rejects_range_past_the_calendar() {
    with_test_db(|store, _| {
        let err = cmd_calendar(store, NaiveDate::MAX, 2).unwrap_err();
        assert!(matches!(err, UpkeepError::InvalidDate(_)));
        assert!(cmd_calendar(store, NaiveDate::MAX, 1).is_ok());
    });
}

#[test]
fn test_removed_reminder_id_is_not_handed_out_again() {
    let dir = TempDir::new().unwrap();
    {
        let store = JsonStore::open(dir.path()).unwrap();
        cmd_reminder_add(&store, "Order hay".into(), "2025-03-04".into(), None, true).unwrap();
        let farrier = cmd_reminder_add(&store, "Farrier".into(), "2025-03-05".into(), None, true).unwrap();
        assert!(cmd_reminder_remove(&store, farrier.id, true).unwrap());
    }
    let store = JsonStore::open(dir.path()).unwrap();
    let next = cmd_reminder_add(&store, "Fix gate".into(), "2025-03-06".into(), None, true).unwrap();
    assert_eq!(next.id, 3);

    cmd_reset(&store, true).unwrap();
    let fresh = cmd_reminder_add(&store, "Order hay".into(), "2025-03-04".into(), None, true).unwrap();
    assert_eq!(fresh.id, 1);
}

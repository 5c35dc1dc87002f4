use chrono::NaiveDate;
use upkeep::due::{compute_next_due, frequency_out_of_range, refresh, status, status_by_basis, DueBasis, DueStatus};
use upkeep::models::{MaintenanceItem, Meter, Subject, UsageBasis};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn goat(label: &str) -> MaintenanceItem {
    MaintenanceItem::new(1, label, Subject::Animal { animal: "Bella".into(), location: None })
}

fn truck() -> MaintenanceItem {
    MaintenanceItem::new(
        1,
        "Oil change",
        Subject::Vehicle {
            vehicle: "Truck".into(),
            odometer: Meter {
                frequency: Some(5000.0),
                last_reading: Some(40000.0),
                current_reading: Some(44000.0),
                next_due: None,
            },
        },
    )
}

#[test]
fn test_frequency_due_date() {
    let mut item = goat("Worming");
    item.last_completed = Some(date(2025, 1, 1));
    item.frequency_days = Some(60);

    let due = compute_next_due(&item).unwrap();
    assert_eq!(due.date, date(2025, 3, 2));
    assert_eq!(due.basis, DueBasis::Frequency);
}

#[test]
fn test_manual_override_without_frequency_basis() {
    let mut item = goat("Hoof trim");
    item.manual_due_date = Some(date(2025, 6, 1));
    assert_eq!(compute_next_due(&item).unwrap().date, date(2025, 6, 1));

    // frequency alone is not enough to supersede the override
    item.frequency_days = Some(30);
    let due = compute_next_due(&item).unwrap();
    assert_eq!(due.date, date(2025, 6, 1));
    assert_eq!(due.basis, DueBasis::Manual);
}

#[test]
fn test_frequency_consumes_manual_override() {
    let mut item = goat("Worming");
    item.manual_due_date = Some(date(2025, 6, 1));
    item.frequency_days = Some(60);
    item.last_completed = Some(date(2025, 1, 1));

    assert!(refresh(&mut item));
    assert_eq!(item.next_due_date, Some(date(2025, 3, 2)));
    assert_eq!(item.manual_due_date, None);

    // nothing left to change
    assert!(!refresh(&mut item));
}

#[test]
fn test_dormant_item_has_no_due_date() {
    let mut item = goat("Shearing");
    item.frequency_days = Some(365);

    assert!(compute_next_due(&item).is_none());
    refresh(&mut item);
    assert_eq!(item.next_due_date, None);
    assert_eq!(status(&item, date(2025, 1, 1)), DueStatus::Unknown);
}

#[test]
fn test_status_thresholds() {
    let mut item = goat("Worming");
    item.manual_due_date = Some(date(2025, 3, 10));

    assert_eq!(status(&item, date(2025, 3, 11)), DueStatus::Overdue);
    assert_eq!(status(&item, date(2025, 3, 10)), DueStatus::DueSoon);
    assert_eq!(status(&item, date(2025, 3, 3)), DueStatus::DueSoon);
    assert_eq!(status(&item, date(2025, 3, 2)), DueStatus::Ok);
}

#[test]
fn test_status_threshold_depends_on_source_type() {
    let mut item = MaintenanceItem::new(1, "Gutters", Subject::Home { area: Some("House".into()) });
    item.manual_due_date = Some(date(2025, 3, 15));

    // 14 days out: due soon for home maintenance, would be ok for animal care
    assert_eq!(status(&item, date(2025, 3, 1)), DueStatus::DueSoon);

    let mut animal = goat("Worming");
    animal.manual_due_date = Some(date(2025, 3, 15));
    assert_eq!(status(&animal, date(2025, 3, 1)), DueStatus::Ok);
}

#[test]
fn test_usage_due_reading() {
    let mut item = truck();
    refresh(&mut item);
    match item.subject.meter() {
        Some((UsageBasis::Distance, meter)) => assert_eq!(meter.next_due, Some(45000.0)),
        other => panic!("unexpected meter {:?}", other),
    }
}

#[test]
fn test_status_by_basis_reports_usage_separately() {
    let mut item = truck();
    item.last_completed = Some(date(2025, 1, 1));
    item.frequency_days = Some(180);
    let today = date(2025, 2, 1);

    let basis = status_by_basis(&item, today);
    assert_eq!(basis.date, DueStatus::Ok);
    assert_eq!(basis.usage, Some((UsageBasis::Distance, DueStatus::Ok)));

    if let Some(meter) = item.subject.meter_mut() {
        meter.current_reading = Some(45200.0);
    }
    let basis = status_by_basis(&item, today);
    assert_eq!(basis.date, DueStatus::Ok);
    assert_eq!(basis.usage, Some((UsageBasis::Distance, DueStatus::Overdue)));
    assert_eq!(basis.worst(), DueStatus::Overdue);

    // the date-only status is unaffected by the meter
    assert_eq!(status(&item, today), DueStatus::Ok);
}

#[test]
fn test_status_by_basis_without_meter() {
    let mut item = goat("Worming");
    item.manual_due_date = Some(date(2025, 3, 1));
    let basis = status_by_basis(&item, date(2025, 3, 5));
    assert_eq!(basis.usage, None);
    assert_eq!(basis.worst(), DueStatus::Overdue);
}

#[test]
fn test_interval_past_the_calendar_is_dormant() {
    let mut item = goat("Worming");
    item.last_completed = Some(date(2025, 1, 1));
    item.frequency_days = Some(u32::MAX);
    item.manual_due_date = Some(date(2025, 3, 1));

    assert!(compute_next_due(&item).is_none());
    assert!(frequency_out_of_range(&item));
    assert_eq!(status(&item, date(2025, 2, 1)), DueStatus::Unknown);

    refresh(&mut item);
    assert_eq!(item.next_due_date, None);
    assert_eq!(item.manual_due_date, Some(date(2025, 3, 1)));
}

use chrono::{NaiveDate, Weekday};
use upkeep::recurrence::{next_occurrence, occurrences_between, occurs_on, RecurrenceKind, RecurrencePattern};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn pattern(origin: NaiveDate, kind: RecurrenceKind) -> RecurrencePattern {
    RecurrencePattern::new(origin, kind)
}

#[test]
fn test_monthly_clamps_to_short_months() {
    let p = pattern(date(2025, 1, 31), RecurrenceKind::Monthly);

    assert!(occurs_on(&p, date(2025, 2, 28)));
    for day in 1..28 {
        assert!(!occurs_on(&p, date(2025, 2, day)), "fired on Feb {day}");
    }
    assert!(occurs_on(&p, date(2025, 3, 31)));
    assert!(!occurs_on(&p, date(2025, 3, 30)));
    assert!(occurs_on(&p, date(2025, 4, 30)));

    // leap year
    assert!(occurs_on(&p, date(2028, 2, 29)));
    assert!(!occurs_on(&p, date(2028, 2, 28)));
}

#[test]
fn test_monthly_on_ordinary_day() {
    let p = pattern(date(2025, 1, 15), RecurrenceKind::Monthly);
    let hits: Vec<_> = occurrences_between(&p, date(2025, 1, 1), date(2025, 4, 30)).collect();
    assert_eq!(hits, vec![date(2025, 1, 15), date(2025, 2, 15), date(2025, 3, 15), date(2025, 4, 15)]);
}

#[test]
fn test_nothing_before_origin() {
    let origin = date(2025, 6, 10);
    let kinds = [
        RecurrenceKind::Daily,
        RecurrenceKind::Weekly,
        RecurrenceKind::Biweekly,
        RecurrenceKind::Monthly,
        RecurrenceKind::Annual,
        RecurrenceKind::EveryDays(3),
        RecurrenceKind::Weekdays(vec![Weekday::Mon, Weekday::Tue]),
    ];
    for kind in kinds {
        let p = pattern(origin, kind);
        assert_eq!(occurrences_between(&p, date(2025, 1, 1), date(2025, 6, 9)).count(), 0);
        assert!(!occurs_on(&p, date(2024, 6, 10)));
    }
}

#[test]
fn test_weekly_and_biweekly() {
    // a Monday
    let origin = date(2025, 3, 3);
    let weekly = pattern(origin, RecurrenceKind::Weekly);
    let biweekly = pattern(origin, RecurrenceKind::Biweekly);

    assert!(occurs_on(&weekly, date(2025, 3, 10)));
    assert!(!occurs_on(&weekly, date(2025, 3, 11)));

    assert!(occurs_on(&biweekly, date(2025, 3, 3)));
    assert!(!occurs_on(&biweekly, date(2025, 3, 10)));
    assert!(occurs_on(&biweekly, date(2025, 3, 17)));
}

#[test]
fn test_annual_handles_leap_day() {
    let p = pattern(date(2024, 2, 29), RecurrenceKind::Annual);
    assert!(occurs_on(&p, date(2025, 2, 28)));
    assert!(occurs_on(&p, date(2028, 2, 29)));
    assert!(!occurs_on(&p, date(2028, 2, 28)));
    assert!(!occurs_on(&p, date(2025, 3, 1)));
}

#[test]
fn test_every_n_days() {
    let p = pattern(date(2025, 1, 1), RecurrenceKind::EveryDays(10));
    let hits: Vec<_> = occurrences_between(&p, date(2024, 12, 1), date(2025, 1, 31)).collect();
    assert_eq!(hits, vec![date(2025, 1, 1), date(2025, 1, 11), date(2025, 1, 21), date(2025, 1, 31)]);
}

#[test]
fn test_custom_weekdays() {
    let p = pattern(date(2025, 3, 3), RecurrenceKind::Weekdays(vec![Weekday::Tue, Weekday::Fri]));
    let hits: Vec<_> = occurrences_between(&p, date(2025, 3, 3), date(2025, 3, 9)).collect();
    assert_eq!(hits, vec![date(2025, 3, 4), date(2025, 3, 7)]);
}

#[test]
fn test_next_occurrence() {
    let p = pattern(date(2025, 1, 31), RecurrenceKind::Monthly);
    assert_eq!(next_occurrence(&p, date(2025, 2, 1)), Some(date(2025, 2, 28)));
    assert_eq!(next_occurrence(&p, date(2024, 1, 1)), Some(date(2025, 1, 31)));
}

#[test]
fn test_pattern_parsing() {
    assert_eq!("Daily".parse::<RecurrenceKind>().unwrap(), RecurrenceKind::Daily);
    assert_eq!("fortnightly".parse::<RecurrenceKind>().unwrap(), RecurrenceKind::Biweekly);
    assert_eq!("yearly".parse::<RecurrenceKind>().unwrap(), RecurrenceKind::Annual);
    assert_eq!("every:21".parse::<RecurrenceKind>().unwrap(), RecurrenceKind::EveryDays(21));

    let days = "weekdays:fri, mon,fri".parse::<RecurrenceKind>().unwrap();
    assert_eq!(days, RecurrenceKind::Weekdays(vec![Weekday::Mon, Weekday::Fri]));
    assert_eq!(days.to_string(), "weekdays:mon,fri");

    for bad in ["hourly", "every:0", "every:x", "weekdays:", "weekdays:funday"] {
        assert!(bad.parse::<RecurrenceKind>().is_err(), "accepted {bad}");
    }
}

#[test]
fn test_pattern_serializes_as_string() {
    let p = pattern(date(2025, 1, 1), RecurrenceKind::EveryDays(3));
    let json = serde_json::to_string(&p).unwrap();
    assert_eq!(json, r#"{"origin":"2025-01-01","kind":"every:3"}"#);
    let back: RecurrencePattern = serde_json::from_str(&json).unwrap();
    assert_eq!(back, p);
}

use chrono::NaiveDate;
use upkeep::error::ProvenanceError;
use upkeep::grouping::{bucket_key, group_key, GroupKey, UNLOCATED};
use upkeep::models::{MaintenanceItem, SourceType, Subject};
use upkeep::provenance::{tag_of, Provenance, Target};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn animal(id: u64, name: &str, label: &str, location: Option<&str>) -> MaintenanceItem {
    MaintenanceItem::new(
        id,
        label,
        Subject::Animal { animal: name.into(), location: location.map(String::from) },
    )
}

#[test]
fn test_group_key_ignores_cosmetic_differences() {
    let due = date(2025, 3, 2);
    let a = animal(1, "Bella", "Worming", Some("Front Yard"));
    let b = animal(2, "Daisy", "  worming ", Some("front_yard "));
    assert_eq!(group_key(&a, due), group_key(&b, due));
    assert_eq!(group_key(&a, due).to_string(), "2025-03-02_worming@front_yard");
}

#[test]
fn test_group_key_differs_by_one_day() {
    let a = animal(1, "Bella", "Worming", None);
    assert_ne!(group_key(&a, date(2025, 3, 2)), group_key(&a, date(2025, 3, 3)));
}

#[test]
fn test_group_key_differs_by_location() {
    let due = date(2025, 3, 2);
    let barn = animal(1, "Bella", "Worming", Some("Barn"));
    let field = animal(2, "Daisy", "Worming", Some("Field"));
    assert_ne!(group_key(&barn, due), group_key(&field, due));
}

#[test]
fn test_unlocated_key_omits_location() {
    let key = group_key(&animal(1, "Bella", "Worming", Some("   ")), date(2025, 3, 2));
    assert_eq!(key.location, UNLOCATED);
    assert!(!key.is_located());
    assert_eq!(key.to_string(), "2025-03-02_worming");
}

#[test]
fn test_bucket_key_follows_scope() {
    let due = date(2025, 3, 2);
    let care = bucket_key(&animal(7, "Bella", "Worming", None), due);
    assert_eq!(care.key(), "auto:care_group:2025-03-02_worming");

    let brakes = MaintenanceItem::new(
        12,
        "Brakes",
        Subject::Vehicle { vehicle: "Truck".into(), odometer: Default::default() },
    );
    assert_eq!(bucket_key(&brakes, due).key(), "auto:vehicle_maintenance:12");
}

#[test]
fn test_provenance_round_trip() {
    let keys = [
        "auto:care_group:2025-03-02_worming",
        "auto:watering_group:2025-07-14_deep_water@greenhouse",
        "auto:farm_area_group:2025-04-01_mow@north_paddock",
        "auto:home_maintenance:3",
        "auto:member_medical:41",
    ];
    for key in keys {
        let prov: Provenance = key.parse().unwrap();
        assert_eq!(prov.key(), key);
    }
}

#[test]
fn test_provenance_parses_to_typed_target() {
    let prov: Provenance = "auto:care_group:2025-03-02_worming@barn".parse().unwrap();
    assert_eq!(prov.source, SourceType::AnimalCare);
    assert_eq!(
        prov.target,
        Target::Group(GroupKey::new(date(2025, 3, 2), "Worming", Some("Barn")))
    );

    let prov: Provenance = "auto:gear_maintenance:5".parse().unwrap();
    assert_eq!(prov, Provenance::item(SourceType::GearMaintenance, 5));
}

#[test]
fn test_malformed_provenance_is_rejected() {
    assert!(matches!(
        "care_group:2025-03-02_worming".parse::<Provenance>(),
        Err(ProvenanceError::MissingPrefix(_))
    ));
    assert!(matches!("auto:care_group".parse::<Provenance>(), Err(ProvenanceError::Malformed(_))));
    assert!(matches!(
        "auto:rocket_group:2025-03-02_launch".parse::<Provenance>(),
        Err(ProvenanceError::UnknownTag(_))
    ));
    assert!(matches!("auto:home_maintenance:abc".parse::<Provenance>(), Err(ProvenanceError::BadId(_))));
    assert!(matches!("auto:home_maintenance:007".parse::<Provenance>(), Err(ProvenanceError::BadId(_))));

    let bad_groups = [
        "auto:care_group:2025-13-02_worming",
        "auto:care_group:2025-03-02",
        "auto:care_group:2025-03-02_",
        "auto:care_group:2025-03-02_Worming",
        "auto:care_group:2025-03-02_worming@",
        "auto:care_group:2025-03-02_worming@unlocated",
        "auto:care_group:2025-03-02worming",
    ];
    for key in bad_groups {
        assert!(
            matches!(key.parse::<Provenance>(), Err(ProvenanceError::BadGroupKey(_))),
            "accepted {key}"
        );
    }
}

#[test]
fn test_tag_of_reads_only_the_tag() {
    assert_eq!(tag_of("auto:care_group:not-a-key"), Some("care_group"));
    assert_eq!(tag_of("auto:home_maintenance:7"), Some("home_maintenance"));
    assert_eq!(tag_of("auto:mystery:1"), Some("mystery"));
    assert_eq!(tag_of("auto:care_group"), None);
    assert_eq!(tag_of("manual:home_maintenance:7"), None);
}

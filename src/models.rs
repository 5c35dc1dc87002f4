use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::UpkeepError;
use crate::recurrence::RecurrencePattern;

/// The domain a maintenance item belongs to.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    HomeMaintenance,
    VehicleMaintenance,
    EquipmentMaintenance,
    FarmArea,
    AnimalCare,
    PlantWatering,
    PlantFertilizing,
    GearMaintenance,
    MemberTraining,
    MemberMedical,
}

/// How reminders are produced for a source type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderScope {
    /// Items due the same day for the same reason at the same place share one reminder.
    Grouped,
    /// Every item gets its own reminder.
    PerRecord,
}

impl SourceType {
    pub const ALL: [SourceType; 10] = [
        SourceType::HomeMaintenance,
        SourceType::VehicleMaintenance,
        SourceType::EquipmentMaintenance,
        SourceType::FarmArea,
        SourceType::AnimalCare,
        SourceType::PlantWatering,
        SourceType::PlantFertilizing,
        SourceType::GearMaintenance,
        SourceType::MemberTraining,
        SourceType::MemberMedical,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SourceType::HomeMaintenance => "home_maintenance",
            SourceType::VehicleMaintenance => "vehicle_maintenance",
            SourceType::EquipmentMaintenance => "equipment_maintenance",
            SourceType::FarmArea => "farm_area",
            SourceType::AnimalCare => "animal_care",
            SourceType::PlantWatering => "plant_watering",
            SourceType::PlantFertilizing => "plant_fertilizing",
            SourceType::GearMaintenance => "gear_maintenance",
            SourceType::MemberTraining => "member_training",
            SourceType::MemberMedical => "member_medical",
        }
    }

    pub fn scope(self) -> ReminderScope {
        match self {
            SourceType::AnimalCare
            | SourceType::PlantWatering
            | SourceType::PlantFertilizing
            | SourceType::FarmArea => ReminderScope::Grouped,
            SourceType::HomeMaintenance
            | SourceType::VehicleMaintenance
            | SourceType::EquipmentMaintenance
            | SourceType::GearMaintenance
            | SourceType::MemberTraining
            | SourceType::MemberMedical => ReminderScope::PerRecord,
        }
    }

    /// Tag used in the `auto:<tag>:...` provenance key.
    pub fn provenance_tag(self) -> &'static str {
        match self {
            SourceType::AnimalCare => "care_group",
            SourceType::PlantWatering => "watering_group",
            SourceType::PlantFertilizing => "fertilizing_group",
            SourceType::FarmArea => "farm_area_group",
            other => other.as_str(),
        }
    }

    pub fn from_provenance_tag(tag: &str) -> Option<SourceType> {
        SourceType::ALL
            .into_iter()
            .find(|s| s.provenance_tag() == tag)
    }

    /// Days ahead of the due date at which an item counts as due soon.
    pub fn due_soon_days(self) -> i64 {
        match self {
            SourceType::AnimalCare
            | SourceType::PlantWatering
            | SourceType::PlantFertilizing
            | SourceType::FarmArea
            | SourceType::MemberMedical => 7,
            SourceType::HomeMaintenance
            | SourceType::VehicleMaintenance
            | SourceType::EquipmentMaintenance
            | SourceType::GearMaintenance
            | SourceType::MemberTraining => 14,
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceType {
    type Err = UpkeepError;

    /// Accepts the canonical name, a few short aliases, and hyphenated forms.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_lowercase().replace('-', "_");
        let found = match norm.as_str() {
            "home" => Some(SourceType::HomeMaintenance),
            "vehicle" => Some(SourceType::VehicleMaintenance),
            "equipment" => Some(SourceType::EquipmentMaintenance),
            "farm" => Some(SourceType::FarmArea),
            "animal" | "care" => Some(SourceType::AnimalCare),
            "watering" => Some(SourceType::PlantWatering),
            "fertilizing" => Some(SourceType::PlantFertilizing),
            "gear" => Some(SourceType::GearMaintenance),
            "training" => Some(SourceType::MemberTraining),
            "medical" => Some(SourceType::MemberMedical),
            other => SourceType::ALL.into_iter().find(|t| t.as_str() == other),
        };
        found.ok_or_else(|| UpkeepError::UnknownSourceType(s.to_string()))
    }
}

/// A usage counter (odometer, hour meter) with its own service interval.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Meter {
    /// Service interval in meter units.
    #[serde(default)]
    pub frequency: Option<f64>,
    /// Reading when the service was last performed.
    #[serde(default)]
    pub last_reading: Option<f64>,
    /// Latest known reading, used only for the usage-basis status.
    #[serde(default)]
    pub current_reading: Option<f64>,
    /// Derived: reading at which the next service falls due.
    #[serde(default)]
    pub next_due: Option<f64>,
}

/// Domain-specific part of a maintenance item. Each case only carries what
/// its domain needs.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Subject {
    Home {
        #[serde(default)]
        area: Option<String>,
    },
    Vehicle {
        vehicle: String,
        #[serde(default)]
        odometer: Meter,
    },
    Equipment {
        equipment: String,
        #[serde(default)]
        hour_meter: Meter,
    },
    FarmArea {
        area: String,
    },
    Animal {
        animal: String,
        #[serde(default)]
        location: Option<String>,
    },
    PlantWatering {
        plant: String,
        #[serde(default)]
        location: Option<String>,
    },
    PlantFertilizing {
        plant: String,
        #[serde(default)]
        location: Option<String>,
    },
    Gear {
        member: String,
        gear: String,
    },
    Training {
        member: String,
    },
    Medical {
        member: String,
    },
}

impl Subject {
    pub fn source_type(&self) -> SourceType {
        match self {
            Subject::Home { .. } => SourceType::HomeMaintenance,
            Subject::Vehicle { .. } => SourceType::VehicleMaintenance,
            Subject::Equipment { .. } => SourceType::EquipmentMaintenance,
            Subject::FarmArea { .. } => SourceType::FarmArea,
            Subject::Animal { .. } => SourceType::AnimalCare,
            Subject::PlantWatering { .. } => SourceType::PlantWatering,
            Subject::PlantFertilizing { .. } => SourceType::PlantFertilizing,
            Subject::Gear { .. } => SourceType::GearMaintenance,
            Subject::Training { .. } => SourceType::MemberTraining,
            Subject::Medical { .. } => SourceType::MemberMedical,
        }
    }

    /// Builds a subject from the loose fields the CLI collects.
    pub fn build(source: SourceType, name: &str, location: Option<String>) -> Subject {
        let name = name.to_string();
        match source {
            SourceType::HomeMaintenance => Subject::Home { area: location.or(Some(name)) },
            SourceType::VehicleMaintenance => Subject::Vehicle { vehicle: name, odometer: Meter::default() },
            SourceType::EquipmentMaintenance => Subject::Equipment { equipment: name, hour_meter: Meter::default() },
            SourceType::FarmArea => Subject::FarmArea { area: location.unwrap_or(name) },
            SourceType::AnimalCare => Subject::Animal { animal: name, location },
            SourceType::PlantWatering => Subject::PlantWatering { plant: name, location },
            SourceType::PlantFertilizing => Subject::PlantFertilizing { plant: name, location },
            SourceType::GearMaintenance => Subject::Gear { member: location.unwrap_or_default(), gear: name },
            SourceType::MemberTraining => Subject::Training { member: name },
            SourceType::MemberMedical => Subject::Medical { member: name },
        }
    }

    /// Human name of the thing being looked after.
    pub fn name(&self) -> &str {
        match self {
            Subject::Home { area } => area.as_deref().unwrap_or("home"),
            Subject::Vehicle { vehicle, .. } => vehicle,
            Subject::Equipment { equipment, .. } => equipment,
            Subject::FarmArea { area } => area,
            Subject::Animal { animal, .. } => animal,
            Subject::PlantWatering { plant, .. } | Subject::PlantFertilizing { plant, .. } => plant,
            Subject::Gear { gear, .. } => gear,
            Subject::Training { member } | Subject::Medical { member } => member,
        }
    }

    /// Place or owner used to keep grouped reminders apart.
    pub fn location(&self) -> Option<&str> {
        match self {
            Subject::Home { area } => area.as_deref(),
            Subject::Vehicle { vehicle, .. } => Some(vehicle),
            Subject::Equipment { equipment, .. } => Some(equipment),
            Subject::FarmArea { area } => Some(area),
            Subject::Animal { location, .. }
            | Subject::PlantWatering { location, .. }
            | Subject::PlantFertilizing { location, .. } => location.as_deref(),
            Subject::Gear { member, .. } => Some(member),
            Subject::Training { member } | Subject::Medical { member } => Some(member),
        }
    }

    pub fn meter(&self) -> Option<(UsageBasis, &Meter)> {
        match self {
            Subject::Vehicle { odometer, .. } => Some((UsageBasis::Distance, odometer)),
            Subject::Equipment { hour_meter, .. } => Some((UsageBasis::Hours, hour_meter)),
            _ => None,
        }
    }

    pub fn meter_mut(&mut self) -> Option<&mut Meter> {
        match self {
            Subject::Vehicle { odometer, .. } => Some(odometer),
            Subject::Equipment { hour_meter, .. } => Some(hour_meter),
            _ => None,
        }
    }
}

/// Which counter a usage-based interval is measured on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageBasis {
    Hours,
    Distance,
}

/// A recurring care or upkeep obligation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MaintenanceItem {
    /// Record key, unique within the item's source type.
    pub id: u64,
    /// Care/maintenance type, e.g. "Worming" or "Oil change".
    pub label: String,
    pub subject: Subject,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub frequency_days: Option<u32>,
    #[serde(default)]
    pub last_completed: Option<NaiveDate>,
    /// One-shot due date set by a user; consumed by the next frequency-based recompute.
    #[serde(default)]
    pub manual_due_date: Option<NaiveDate>,
    /// Derived, recomputed from the fields above.
    #[serde(default)]
    pub next_due_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_true() -> bool {
    true
}

impl MaintenanceItem {
    pub fn new(id: u64, label: impl Into<String>, subject: Subject) -> Self {
        Self {
            id,
            label: label.into(),
            subject,
            is_active: true,
            frequency_days: None,
            last_completed: None,
            manual_due_date: None,
            next_due_date: None,
            notes: None,
        }
    }

    pub fn source_type(&self) -> SourceType {
        self.subject.source_type()
    }
}

/// A calendar-visible unit. Generated reminders carry a provenance key,
/// user-authored ones do not.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ReminderTask {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub due_time: Option<NaiveTime>,
    #[serde(default)]
    pub provenance: Option<String>,
    pub is_active: bool,
    #[serde(default)]
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_on: Option<NaiveDate>,
}

impl ReminderTask {
    pub fn is_generated(&self) -> bool {
        self.provenance.is_some()
    }
}

/// Fields needed to create a reminder; the store assigns id and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReminder {
    pub title: String,
    pub notes: Option<String>,
    pub due_date: NaiveDate,
    pub due_time: Option<NaiveTime>,
    pub provenance: Option<String>,
}

/// A user-authored recurring task, projected onto calendars but never
/// stored per occurrence.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TaskTemplate {
    pub id: u64,
    pub title: String,
    pub pattern: RecurrencePattern,
    #[serde(default)]
    pub due_time: Option<NaiveTime>,
}

//! A per-building view over the readings in a [`MeterDataset`].
use crate::dataset::MeterDataset;
use crate::id::{BuildingID, define_id_getter};
use crate::units::Energy;
use chrono::NaiveDateTime;
use indexmap::IndexMap;

/// One reading belonging to a [`Building`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildingReading {
    /// When the reading was taken, if known
    pub timestamp: Option<NaiveDateTime>,
    /// The energy consumed, if known
    pub kwh: Option<Energy>,
}

/// A building and all of its readings
#[derive(Debug, Clone, PartialEq)]
pub struct Building {
    /// The building's label
    pub id: BuildingID,
    /// Readings in dataset order
    pub readings: Vec<BuildingReading>,
}
define_id_getter! {Building, BuildingID}

impl Building {
    /// Create a building with no readings
    pub fn new(id: BuildingID) -> Self {
        Self {
            id,
            readings: Vec::new(),
        }
    }

    /// Add a reading to the building
    pub fn add_reading(&mut self, reading: BuildingReading) {
        self.readings.push(reading);
    }

    /// Total consumption, ignoring missing values
    pub fn total_consumption(&self) -> Energy {
        self.readings.iter().filter_map(|r| r.kwh).sum()
    }

    /// A one-line description of the building's consumption
    pub fn report(&self) -> String {
        format!(
            "Building {}: total consumption = {:.2} kWh",
            self.id,
            self.total_consumption().value()
        )
    }
}

/// Buildings keyed by ID, in the order they were first seen
pub type BuildingMap = IndexMap<BuildingID, Building>;

/// Group the readings in `dataset` by building
pub fn buildings_from_dataset(dataset: &MeterDataset) -> BuildingMap {
    let mut buildings = BuildingMap::new();
    for reading in dataset {
        buildings
            .entry(reading.building.clone())
            .or_insert_with_key(|id| Building::new(id.clone()))
            .add_reading(BuildingReading {
                timestamp: reading.timestamp,
                kwh: reading.kwh,
            });
    }

    buildings
}

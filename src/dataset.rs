//! The normalised, time-ordered collection of meter readings produced by ingestion.
use crate::id::BuildingID;
use crate::units::Energy;
use chrono::NaiveDateTime;
use itertools::Itertools;
use std::cmp::Ordering;
use std::rc::Rc;

/// A single validated meter reading, tagged with where it came from
#[derive(Debug, Clone, PartialEq)]
pub struct MeterReading {
    /// When the reading was taken (`None` if the source text could not be parsed)
    pub timestamp: Option<NaiveDateTime>,
    /// The energy consumed (`None` if the source value was not numeric)
    pub kwh: Option<Energy>,
    /// The building the reading belongs to, taken from the file name
    pub building: BuildingID,
    /// The month label, taken from the file name
    pub month: Rc<str>,
}

/// Order readings by timestamp, with missing timestamps last
fn cmp_timestamps(a: Option<NaiveDateTime>, b: Option<NaiveDateTime>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Every reading that survived ingestion, sorted by timestamp.
///
/// The timestamp acts as a non-unique lookup key: several buildings can report at the same
/// instant. Readings which share a timestamp keep the order in which they were loaded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeterDataset {
    readings: Vec<MeterReading>,
    /// Number of readings (at the front of `readings`) which have a timestamp
    timed_len: usize,
}

impl MeterDataset {
    /// Build a dataset from readings in any order
    pub fn new(mut readings: Vec<MeterReading>) -> Self {
        // Stable, so ties keep load order
        readings.sort_by(|a, b| cmp_timestamps(a.timestamp, b.timestamp));
        let timed_len = readings.partition_point(|r| r.timestamp.is_some());

        Self {
            readings,
            timed_len,
        }
    }

    /// The total number of readings
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    /// Whether there are no readings at all
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Iterate over all readings in timestamp order (missing timestamps last)
    pub fn iter(&self) -> std::slice::Iter<'_, MeterReading> {
        self.readings.iter()
    }

    /// The readings which have a valid timestamp
    pub fn timed(&self) -> &[MeterReading] {
        &self.readings[..self.timed_len]
    }

    /// The number of readings whose timestamp could not be parsed
    pub fn untimed_len(&self) -> usize {
        self.readings.len() - self.timed_len
    }

    /// All readings taken at exactly `timestamp`
    pub fn at(&self, timestamp: NaiveDateTime) -> &[MeterReading] {
        self.between(timestamp, timestamp + chrono::TimeDelta::nanoseconds(1))
    }

    /// All readings with `start <= timestamp < end`
    pub fn between(&self, start: NaiveDateTime, end: NaiveDateTime) -> &[MeterReading] {
        let timed = self.timed();
        let lo = timed.partition_point(|r| r.timestamp.is_some_and(|ts| ts < start));
        let hi = timed.partition_point(|r| r.timestamp.is_some_and(|ts| ts < end));
        &timed[lo..hi.max(lo)]
    }

    /// The distinct building labels in the dataset, in lexical order
    pub fn buildings(&self) -> Vec<BuildingID> {
        self.readings
            .iter()
            .map(|r| r.building.clone())
            .sorted()
            .dedup()
            .collect()
    }
}

impl<'a> IntoIterator for &'a MeterDataset {
    type Item = &'a MeterReading;
    type IntoIter = std::slice::Iter<'a, MeterReading>;

    fn into_iter(self) -> Self::IntoIter {
        self.readings.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{reading, ts};
    use rstest::rstest;

    #[rstest]
    fn test_new_sorts_by_timestamp() {
        let dataset = MeterDataset::new(vec![
            reading("hostel", "2025-01-02T00:00:00", Some(2.0)),
            reading("admin", "bad timestamp", Some(9.0)),
            reading("admin", "2025-01-01T00:00:00", Some(1.0)),
        ]);

        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.untimed_len(), 1);
        let timestamps = dataset.iter().map(|r| r.timestamp).collect_vec();
        assert_eq!(
            timestamps,
            [
                Some(ts("2025-01-01T00:00:00")),
                Some(ts("2025-01-02T00:00:00")),
                None
            ]
        );
    }

    #[rstest]
    fn test_ties_keep_load_order() {
        let dataset = MeterDataset::new(vec![
            reading("library", "2025-01-01T00:00:00", Some(1.0)),
            reading("admin", "2025-01-01T00:00:00", Some(2.0)),
            reading("hostel", "2025-01-01T00:00:00", Some(3.0)),
        ]);

        let buildings = dataset.iter().map(|r| r.building.as_str()).collect_vec();
        assert_eq!(buildings, ["library", "admin", "hostel"]);
    }

    #[rstest]
    fn test_at_is_many_to_one() {
        let dataset = MeterDataset::new(vec![
            reading("admin", "2025-01-01T00:00:00", Some(1.0)),
            reading("hostel", "2025-01-01T01:00:00", Some(2.0)),
            reading("library", "2025-01-01T01:00:00", Some(3.0)),
        ]);

        assert_eq!(dataset.at(ts("2025-01-01T01:00:00")).len(), 2);
        assert_eq!(dataset.at(ts("2025-01-01T00:00:00")).len(), 1);
        assert!(dataset.at(ts("2025-01-01T02:00:00")).is_empty());
    }

    #[rstest]
    #[case("2025-01-01T00:00:00", "2025-01-02T00:00:00", 2)]
    #[case("2025-01-01T00:30:00", "2025-01-03T00:00:00", 2)]
    #[case("2025-01-03T00:00:00", "2025-01-01T00:00:00", 0)] // empty range
    fn test_between(#[case] start: &str, #[case] end: &str, #[case] expected: usize) {
        let dataset = MeterDataset::new(vec![
            reading("admin", "2025-01-01T00:00:00", Some(1.0)),
            reading("admin", "2025-01-01T12:00:00", Some(1.0)),
            reading("admin", "2025-01-02T00:00:00", Some(1.0)),
            reading("admin", "nope", Some(1.0)),
        ]);

        assert_eq!(dataset.between(ts(start), ts(end)).len(), expected);
    }

    #[rstest]
    fn test_buildings() {
        let dataset = MeterDataset::new(vec![
            reading("library", "2025-01-01T00:00:00", None),
            reading("admin", "2025-01-01T00:00:00", Some(1.0)),
            reading("library", "2025-01-02T00:00:00", Some(1.0)),
        ]);

        assert_eq!(
            dataset.buildings(),
            vec![BuildingID::new("admin"), BuildingID::new("library")]
        );
    }
}

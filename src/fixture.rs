//! Fixtures for tests

use crate::dataset::{MeterDataset, MeterReading};
use crate::input::value::parse_timestamp;
use crate::units::Energy;
use chrono::NaiveDateTime;
use rstest::fixture;
use std::fs;
use std::path::Path;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

/// Parse a timestamp which is known to be valid
pub fn ts(s: &str) -> NaiveDateTime {
    parse_timestamp(s).unwrap()
}

/// Create a reading, leaving the timestamp missing if `timestamp` can't be parsed
pub fn reading(building: &str, timestamp: &str, kwh: Option<f64>) -> MeterReading {
    MeterReading {
        timestamp: parse_timestamp(timestamp),
        kwh: kwh.map(Energy),
        building: building.into(),
        month: "2025-01".into(),
    }
}

/// Write a text file into `dir`
pub fn write_file(dir: &Path, file_name: &str, contents: &str) {
    fs::write(dir.join(file_name), contents).unwrap();
}

/// Two buildings over parts of two weeks, including a missing value.
///
/// 2025-01-05 is a Sunday and 2025-01-06 a Monday.
#[fixture]
pub fn dataset() -> MeterDataset {
    MeterDataset::new(vec![
        reading("admin", "2025-01-04T09:00:00", Some(4.0)),
        reading("admin", "2025-01-04T09:30:00", Some(6.0)),
        reading("admin", "2025-01-05T10:00:00", Some(8.0)),
        reading("admin", "2025-01-05T11:00:00", Some(12.0)),
        reading("admin", "2025-01-06T00:00:00", Some(5.0)),
        reading("hostel", "2025-01-04T20:00:00", Some(3.0)),
        reading("hostel", "2025-01-04T21:00:00", None),
        reading("hostel", "2025-01-06T08:00:00", Some(7.0)),
    ])
}

//! Repairs for known mis-exported file shapes.
//!
//! Each repair inspects a freshly parsed [`RawTable`] and, if it recognises the shape, rewrites
//! it into the expected `timestamp`/`kwh` layout. New detectors can be added to
//! [`default_repairs`] without touching the main ingestion path.
use super::table::RawTable;
use super::{KWH_COLUMN, TIMESTAMP_COLUMN};
use log::debug;

/// A step which can recognise and fix one kind of malformed table
pub trait ShapeRepair {
    /// A short name for the repair, used in log messages
    fn name(&self) -> &'static str;

    /// Whether this repair should be applied to `table`
    fn applies(&self, table: &RawTable) -> bool;

    /// Rewrite the table
    fn repair(&self, table: RawTable) -> RawTable;
}

/// The repairs which are tried on every input file, in order
pub fn default_repairs() -> Vec<Box<dyn ShapeRepair>> {
    vec![Box::new(CombinedColumnRepair)]
}

/// Apply each applicable repair to `table` in turn
pub fn apply_repairs(mut table: RawTable, repairs: &[Box<dyn ShapeRepair>]) -> RawTable {
    for repair in repairs {
        if repair.applies(&table) {
            debug!("Applying repair: {}", repair.name());
            table = repair.repair(table);
        }
    }

    table
}

/// Handles exports where each whole line was quoted, e.g. `"timestamp,kwh"`, so that every row
/// was read as a single field.
///
/// Only applies when the table has exactly one column, there are no `timestamp` or `kwh` columns
/// already, and the single column's name mentions both.
#[derive(Debug, Clone, Copy, Default)]
pub struct CombinedColumnRepair;

impl ShapeRepair for CombinedColumnRepair {
    fn name(&self) -> &'static str {
        "combined timestamp/kWh column"
    }

    fn applies(&self, table: &RawTable) -> bool {
        let [header] = table.headers.as_slice() else {
            return false;
        };

        header.contains(TIMESTAMP_COLUMN)
            && header.contains(KWH_COLUMN)
            && !table.has_column(TIMESTAMP_COLUMN)
            && !table.has_column(KWH_COLUMN)
    }

    fn repair(&self, table: RawTable) -> RawTable {
        let rows = table
            .rows
            .into_iter()
            .map(|row| {
                let value = row.into_iter().next().unwrap_or_default();
                let (timestamp, kwh) = split_combined(&value);
                vec![timestamp.to_string(), kwh.unwrap_or_default().to_string()]
            })
            .collect();

        RawTable {
            headers: vec![TIMESTAMP_COLUMN.to_string(), KWH_COLUMN.to_string()],
            rows,
        }
    }
}

/// Strip surrounding quotes from `value` and split it on the first comma
fn split_combined(value: &str) -> (&str, Option<&str>) {
    let value = value.trim_matches('"');
    match value.split_once(',') {
        Some((timestamp, kwh)) => (timestamp, Some(kwh)),
        None => (value, None),
    }
}

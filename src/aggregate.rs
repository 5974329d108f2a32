//! Calendar-aligned consumption aggregates computed from a [`MeterDataset`].
//!
//! Every function here is a pure function of the dataset. Missing kWh values are excluded from
//! sums and statistics; a bucket whose readings are all missing still appears, with a total of
//! zero, whereas a bucket with no readings at all does not appear. Readings without a valid
//! timestamp cannot be placed in a bucket and are left out of every aggregate.
use crate::dataset::{MeterDataset, MeterReading};
use crate::id::BuildingID;
use crate::units::Energy;
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use log::debug;
use serde::Serialize;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

/// A calendar interval used to bucket readings
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Period {
    /// Clock hours
    Hourly,
    /// Calendar days, from midnight
    Daily,
    /// Weeks running from midnight on Monday to the following Monday
    Weekly,
}

impl Period {
    /// The start of the bucket containing `timestamp`.
    ///
    /// Buckets are closed on the left, so a timestamp exactly on a boundary starts a new bucket.
    pub fn bucket_start(self, timestamp: NaiveDateTime) -> NaiveDateTime {
        match self {
            Self::Hourly => timestamp.date().and_time(
                NaiveTime::from_hms_opt(timestamp.hour(), 0, 0).unwrap_or(NaiveTime::MIN),
            ),
            Self::Daily => timestamp.date().and_time(NaiveTime::MIN),
            Self::Weekly => week_start(timestamp.date()).and_time(NaiveTime::MIN),
        }
    }
}

/// The Monday on or before `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - TimeDelta::days(date.weekday().num_days_from_monday().into())
}

/// Total consumption for one building on one calendar day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyTotal {
    /// The building
    pub building: BuildingID,
    /// The calendar day
    pub day: NaiveDate,
    /// Sum of non-missing readings
    pub kwh: Energy,
}

/// Total consumption for one building in one Monday-based week
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyTotal {
    /// The building
    pub building: BuildingID,
    /// The Monday on which the week starts
    pub week_start: NaiveDate,
    /// Sum of non-missing readings
    pub kwh: Energy,
}

/// Whole-period statistics for one building.
///
/// A building with no non-missing readings has `mean`, `min` and `max` of NaN and a `total` of
/// zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildingSummary {
    /// The building
    pub building: BuildingID,
    /// Mean of non-missing readings
    pub mean: Energy,
    /// Smallest non-missing reading
    pub min: Energy,
    /// Largest non-missing reading
    pub max: Energy,
    /// Sum of non-missing readings
    pub total: Energy,
}

/// The busiest hour for one building on one calendar day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeakHour {
    /// The building
    pub building: BuildingID,
    /// The start of the hour
    pub hour: NaiveDateTime,
    /// Total consumption in that hour
    pub kwh: Energy,
}

/// Headline figures for the whole site
#[derive(Debug, Clone, PartialEq)]
pub struct CampusSummary {
    /// Sum of every building's total
    pub total: Energy,
    /// The building with the largest total
    pub highest_building: BuildingID,
    /// That building's total
    pub highest_total: Energy,
    /// The largest single reading and when it occurred, if any reading had a value
    pub peak_reading: Option<(NaiveDateTime, Energy)>,
}

/// Sum consumption per building per bucket, ordered by building then bucket start
pub fn totals_by(
    dataset: &MeterDataset,
    period: Period,
) -> BTreeMap<(BuildingID, NaiveDateTime), Energy> {
    let mut totals = BTreeMap::new();
    for reading in dataset.timed() {
        let Some(timestamp) = reading.timestamp else {
            continue;
        };

        let total = totals
            .entry((reading.building.clone(), period.bucket_start(timestamp)))
            .or_insert(Energy(0.0));
        if let Some(kwh) = reading.kwh {
            *total += kwh;
        }
    }

    debug!("Computed {} {period} total(s)", totals.len());
    totals
}

/// Total consumption per building per calendar day
pub fn daily_totals(dataset: &MeterDataset) -> Vec<DailyTotal> {
    totals_by(dataset, Period::Daily)
        .into_iter()
        .map(|((building, start), kwh)| DailyTotal {
            building,
            day: start.date(),
            kwh,
        })
        .collect()
}

/// Total consumption per building per week, with weeks starting on Monday
pub fn weekly_totals(dataset: &MeterDataset) -> Vec<WeeklyTotal> {
    totals_by(dataset, Period::Weekly)
        .into_iter()
        .map(|((building, start), kwh)| WeeklyTotal {
            building,
            week_start: start.date(),
            kwh,
        })
        .collect()
}

/// Running statistics for one building
#[derive(Default)]
struct Stats {
    count: usize,
    total: Energy,
    min: Option<Energy>,
    max: Option<Energy>,
}

impl Stats {
    fn add(&mut self, kwh: Energy) {
        self.count += 1;
        self.total += kwh;
        self.min = Some(self.min.map_or(kwh, |min| if kwh < min { kwh } else { min }));
        self.max = Some(self.max.map_or(kwh, |max| if kwh > max { kwh } else { max }));
    }
}

/// Mean, min, max and total consumption for each building over the whole dataset
pub fn building_summary(dataset: &MeterDataset) -> Vec<BuildingSummary> {
    let mut stats: BTreeMap<BuildingID, Stats> = BTreeMap::new();
    for reading in dataset {
        // Every building gets a row, but only timed readings count towards it
        let entry = stats.entry(reading.building.clone()).or_default();
        if let (Some(_), Some(kwh)) = (reading.timestamp, reading.kwh) {
            entry.add(kwh);
        }
    }

    stats
        .into_iter()
        .map(|(building, stats)| {
            let nan = Energy(f64::NAN);
            let mean = if stats.count == 0 {
                nan
            } else {
                stats.total / stats.count as f64
            };

            BuildingSummary {
                building,
                mean,
                min: stats.min.unwrap_or(nan),
                max: stats.max.unwrap_or(nan),
                total: stats.total,
            }
        })
        .collect()
}

/// The hour with the highest consumption for each building on each day.
///
/// If several hours share the highest total, the earliest is chosen.
pub fn hourly_peaks(dataset: &MeterDataset) -> Vec<PeakHour> {
    let mut peaks: BTreeMap<(BuildingID, NaiveDate), PeakHour> = BTreeMap::new();
    for ((building, hour), kwh) in totals_by(dataset, Period::Hourly) {
        match peaks.entry((building.clone(), hour.date())) {
            Entry::Vacant(entry) => {
                entry.insert(PeakHour {
                    building,
                    hour,
                    kwh,
                });
            }
            Entry::Occupied(mut entry) => {
                // Hours are visited in ascending order, so only a strictly larger total wins
                if kwh > entry.get().kwh {
                    *entry.get_mut() = PeakHour {
                        building,
                        hour,
                        kwh,
                    };
                }
            }
        }
    }

    peaks.into_values().collect()
}

/// The largest non-missing reading with a timestamp, choosing the earliest on a tie
fn peak_reading(dataset: &MeterDataset) -> Option<(NaiveDateTime, Energy)> {
    dataset
        .timed()
        .iter()
        .filter_map(|MeterReading { timestamp, kwh, .. }| Some(((*timestamp)?, (*kwh)?)))
        .fold(None, |peak, (timestamp, kwh)| match peak {
            Some((_, best)) if kwh <= best => peak,
            _ => Some((timestamp, kwh)),
        })
}

/// Site-wide figures derived from the building summary.
///
/// Returns `None` if there are no buildings. If several buildings share the highest total, the
/// first in building order is chosen.
pub fn campus_summary(
    summary: &[BuildingSummary],
    dataset: &MeterDataset,
) -> Option<CampusSummary> {
    let mut highest = summary.first()?;
    for row in &summary[1..] {
        if row.total > highest.total {
            highest = row;
        }
    }

    Some(CampusSummary {
        total: summary.iter().map(|row| row.total).sum(),
        highest_building: highest.building.clone(),
        highest_total: highest.total,
        peak_reading: peak_reading(dataset),
    })
}

/// Every aggregate view of a dataset
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregates {
    /// Totals per building per day
    pub daily: Vec<DailyTotal>,
    /// Totals per building per Monday-based week
    pub weekly: Vec<WeeklyTotal>,
    /// Whole-period statistics per building
    pub summary: Vec<BuildingSummary>,
    /// Busiest hour per building per day
    pub peaks: Vec<PeakHour>,
    /// Site-wide figures
    pub campus: Option<CampusSummary>,
}

impl Aggregates {
    /// Compute all aggregates for `dataset`
    pub fn compute(dataset: &MeterDataset) -> Self {
        let summary = building_summary(dataset);
        let campus = campus_summary(&summary, dataset);

        Self {
            daily: daily_totals(dataset),
            weekly: weekly_totals(dataset),
            summary,
            peaks: hourly_peaks(dataset),
            campus,
        }
    }
}

//! The module responsible for writing output data to disk.
use crate::aggregate::{Aggregates, CampusSummary};
use crate::dataset::MeterDataset;
use crate::id::BuildingID;
use crate::input::IssueLog;
use crate::units::Energy;
use anyhow::{Context, Result, ensure};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

pub mod metadata;

/// The root folder in which dataset-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "campus_energy_results";

/// The output file name for the normalised readings
const CLEANED_DATA_FILE_NAME: &str = "cleaned_energy_data.csv";

/// The output file name for daily totals
const DAILY_TOTALS_FILE_NAME: &str = "daily_totals.csv";

/// The output file name for weekly totals
const WEEKLY_TOTALS_FILE_NAME: &str = "weekly_totals.csv";

/// The output file name for per-building statistics
const BUILDING_SUMMARY_FILE_NAME: &str = "building_summary.csv";

/// The output file name for daily peak hours
const PEAK_HOURS_FILE_NAME: &str = "peak_hours.csv";

/// The output file name for the ingestion issue log
const INGESTION_LOG_FILE_NAME: &str = "ingestion_log.txt";

/// The output file name for the executive summary
const SUMMARY_FILE_NAME: &str = "summary.txt";

/// Get the default output directory for the data in `data_dir`
pub fn get_output_dir(data_dir: &Path) -> Result<PathBuf> {
    // Canonicalise in case the user has specified "."
    let data_dir = data_dir
        .canonicalize()
        .context("Could not resolve path to data directory")?;

    let data_name = data_dir
        .file_name()
        .context("Data directory cannot be the root folder")?
        .to_str()
        .context("Invalid chars in data directory name")?;

    Ok([OUTPUT_DIRECTORY_ROOT, data_name].iter().collect())
}

/// Create a new output directory, clearing out an existing one if `allow_overwrite` is set.
///
/// # Returns
///
/// True if an existing, non-empty directory was cleared.
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    let overwrite = if let Ok(mut entries) = fs::read_dir(output_dir) {
        if entries.next().is_none() {
            // Folder exists and is empty
            return Ok(false);
        }

        ensure!(
            allow_overwrite,
            "Output folder already exists and is not empty. \
            Please delete the folder or pass the --overwrite command-line option."
        );

        fs::remove_dir_all(output_dir)?;
        true
    } else {
        false
    };

    fs::create_dir_all(output_dir)?;

    Ok(overwrite)
}

/// Represents a row in the cleaned data CSV file.
///
/// Missing values are written as empty fields.
#[derive(Serialize)]
struct CleanedReadingRow {
    timestamp: Option<NaiveDateTime>,
    kwh: Option<Energy>,
    building: BuildingID,
    month: Rc<str>,
}

/// Write a series of rows to a new CSV file
fn write_csv<T, I>(file_path: &Path, rows: I) -> Result<()>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let write = || -> Result<()> {
        let mut writer = csv::Writer::from_path(file_path)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    };

    write().with_context(|| format!("Failed to write {}", file_path.display()))
}

/// Write the normalised readings to a CSV file
pub fn write_cleaned_data(output_path: &Path, dataset: &MeterDataset) -> Result<()> {
    let rows = dataset.iter().map(|reading| CleanedReadingRow {
        timestamp: reading.timestamp,
        kwh: reading.kwh,
        building: reading.building.clone(),
        month: Rc::clone(&reading.month),
    });

    write_csv(&output_path.join(CLEANED_DATA_FILE_NAME), rows)
}

/// Write every aggregate table to CSV files
pub fn write_aggregates(output_path: &Path, aggregates: &Aggregates) -> Result<()> {
    write_csv(&output_path.join(DAILY_TOTALS_FILE_NAME), &aggregates.daily)?;
    write_csv(&output_path.join(WEEKLY_TOTALS_FILE_NAME), &aggregates.weekly)?;
    write_csv(
        &output_path.join(BUILDING_SUMMARY_FILE_NAME),
        &aggregates.summary,
    )?;
    write_csv(&output_path.join(PEAK_HOURS_FILE_NAME), &aggregates.peaks)?;

    Ok(())
}

/// Write the ingestion issue log, if there were any issues.
///
/// # Returns
///
/// The path to the log file, if one was written.
pub fn write_ingestion_log(output_path: &Path, issues: &IssueLog) -> Result<Option<PathBuf>> {
    if issues.is_empty() {
        return Ok(None);
    }

    let mut contents = String::from("Ingestion / Validation Log\n\n");
    for message in issues.messages() {
        writeln!(&mut contents, "{message}").unwrap();
    }

    let file_path = output_path.join(INGESTION_LOG_FILE_NAME);
    fs::write(&file_path, contents)
        .with_context(|| format!("Failed to write {}", file_path.display()))?;

    Ok(Some(file_path))
}

/// The text of the executive summary
fn summary_text(campus: Option<&CampusSummary>) -> String {
    let mut out = String::from("Campus Energy Executive Summary\n\n");
    let Some(campus) = campus else {
        out.push_str("No building data available.\n");
        return out;
    };

    writeln!(
        &mut out,
        "Total campus consumption: {:.2} kWh",
        campus.total.value()
    )
    .unwrap();
    writeln!(
        &mut out,
        "Highest-consuming building: {} ({:.2} kWh)",
        campus.highest_building,
        campus.highest_total.value()
    )
    .unwrap();
    match campus.peak_reading {
        Some((time, kwh)) => {
            writeln!(&mut out, "Peak load time: {time} ({:.2} kWh)", kwh.value()).unwrap();
        }
        None => out.push_str("Peak load time: unknown\n"),
    }
    out.push_str("\nDaily and weekly trends:\n");
    writeln!(
        &mut out,
        "- See {DAILY_TOTALS_FILE_NAME}, {WEEKLY_TOTALS_FILE_NAME} and \
        {BUILDING_SUMMARY_FILE_NAME} for detailed patterns."
    )
    .unwrap();

    out
}

/// Write the executive summary text file
pub fn write_summary(output_path: &Path, campus: Option<&CampusSummary>) -> Result<PathBuf> {
    let file_path = output_path.join(SUMMARY_FILE_NAME);
    fs::write(&file_path, summary_text(campus))
        .with_context(|| format!("Failed to write {}", file_path.display()))?;

    Ok(file_path)
}

//! Integration tests for the `run` command.
use campus_energy::cli::{RunOpts, handle_run_command};
use campus_energy::settings::Settings;
use itertools::Itertools;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

/// Get the path to the bundled demo dataset.
fn get_data_dir() -> PathBuf {
    PathBuf::from("demos/campus")
}

fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(ToString::to_string)
        .collect()
}

/// An integration test for the `run` command.
#[test]
fn test_handle_run_command() {
    unsafe { std::env::set_var("CAMPUS_ENERGY_LOG_LEVEL", "off") };

    // Save results to non-existent directory to check that directory creation works
    let tempdir = tempdir().unwrap();
    let output_dir = tempdir.path().join("results");
    let opts = RunOpts {
        output_dir: Some(output_dir.clone()),
        overwrite: false,
    };
    handle_run_command(&get_data_dir(), &opts, Some(Settings::default())).unwrap();

    for file_name in [
        "cleaned_energy_data.csv",
        "daily_totals.csv",
        "weekly_totals.csv",
        "building_summary.csv",
        "peak_hours.csv",
        "ingestion_log.txt",
        "summary.txt",
        "metadata.toml",
        "campus_energy_info.log",
        "campus_energy_error.log",
    ] {
        assert!(output_dir.join(file_name).is_file(), "Missing {file_name}");
    }

    // The file with bad columns is skipped and logged
    let log = read_lines(&output_dir.join("ingestion_log.txt"));
    assert_eq!(log.last().unwrap(), "Invalid columns in gym_2025-01.csv");

    // Every row of the three valid files is kept except the one with an extra field
    let cleaned = read_lines(&output_dir.join("cleaned_energy_data.csv"));
    assert_eq!(cleaned[0], "timestamp,kwh,building,month");
    assert_eq!(cleaned.len(), 1 + 3 * 56 - 1);
    assert_eq!(
        cleaned
            .iter()
            .filter(|line| line.ends_with(",hostel,2025-01") && line.contains(",,"))
            .count(),
        2
    );

    let summary = read_lines(&output_dir.join("building_summary.csv"));
    let buildings = summary[1..]
        .iter()
        .map(|line| line.split(',').next().unwrap())
        .collect_vec();
    assert_eq!(buildings, ["admin", "hostel", "library"]);

    // One total per building per day for the seven days covered
    assert_eq!(read_lines(&output_dir.join("daily_totals.csv")).len(), 1 + 3 * 7);

    // 2025-01-06 is a Monday, so the data fall in a single week
    let weekly = read_lines(&output_dir.join("weekly_totals.csv"));
    assert_eq!(weekly.len(), 1 + 3);
    assert!(weekly[1..].iter().all(|line| line.contains(",2025-01-06,")));

    let summary_text = fs::read_to_string(output_dir.join("summary.txt")).unwrap();
    assert!(summary_text.starts_with("Campus Energy Executive Summary"));

    // Running again into the same folder fails without --overwrite, before logging is touched
    assert!(
        handle_run_command(&get_data_dir(), &opts, Some(Settings::default()))
            .unwrap_err()
            .to_string()
            .starts_with("Failed to create output directory")
    );

    // With --overwrite the output folder is accepted, but the logger is already initialised
    let opts = RunOpts {
        output_dir: Some(output_dir),
        overwrite: true,
    };
    assert_eq!(
        handle_run_command(&get_data_dir(), &opts, Some(Settings::default()))
            .unwrap_err()
            .chain()
            .next()
            .unwrap()
            .to_string(),
        "Failed to initialise logging."
    );
}

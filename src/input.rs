//! Common routines for handling input data.
//!
//! Meter exports are loaded one file at a time. A problem with any single file is recorded in the
//! [`IssueLog`] and the file is skipped; only a missing data directory or a complete absence of
//! usable data is treated as an error.
use crate::dataset::{MeterDataset, MeterReading};
use crate::id::{BuildingID, intern};
use crate::units::Energy;
use anyhow::{Context, Result, ensure};
use itertools::Itertools;
use log::{info, warn};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::fmt::{self, Display};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

pub mod file_name;
use file_name::{FileNameConvention, UnderscoreConvention};
pub mod repair;
use repair::{ShapeRepair, apply_repairs, default_repairs};
pub mod table;
use table::RawTable;
pub mod value;
use value::{parse_kwh, parse_timestamp};

/// The name of the column holding reading times
pub const TIMESTAMP_COLUMN: &str = "timestamp";

/// The name of the column holding energy values
pub const KWH_COLUMN: &str = "kwh";

/// The file extension of meter exports
const INPUT_FILE_EXTENSION: &str = "csv";

/// Parse a TOML file at the specified path.
///
/// # Arguments
///
/// * `file_path` - Path to the TOML file
///
/// # Returns
///
/// * The deserialised TOML data or an error if the file could not be read or parsed.
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let toml_str = fs::read_to_string(file_path).with_context(|| input_err_msg(file_path))?;
    let toml_data = toml::from_str(&toml_str).with_context(|| input_err_msg(file_path))?;
    Ok(toml_data)
}

/// Format an error message to include the file path. To be used with `anyhow::Context`.
pub fn input_err_msg<P: AsRef<Path>>(file_path: P) -> String {
    format!("Error reading {}", file_path.as_ref().display())
}

/// A problem with a single input file, which caused it to be skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestionIssue {
    /// The file lacked a `timestamp` or `kwh` column, even after repairs
    InvalidColumns {
        /// The name of the file
        file_name: String,
    },
    /// The file disappeared between being found and being read
    MissingFile {
        /// The full path of the file
        path: PathBuf,
    },
    /// The file could not be read or parsed
    ReadError {
        /// The name of the file
        file_name: String,
        /// What went wrong
        message: String,
    },
}

impl Display for IngestionIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidColumns { file_name } => write!(f, "Invalid columns in {file_name}"),
            Self::MissingFile { path } => write!(f, "Missing file: {}", path.display()),
            Self::ReadError { file_name, message } => {
                write!(f, "Error reading {file_name}: {message}")
            }
        }
    }
}

/// The problems found while loading a data directory, in the order they were found
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueLog(Vec<IngestionIssue>);

impl IssueLog {
    /// Record a new issue
    pub fn push(&mut self, issue: IngestionIssue) {
        warn!("{issue}");
        self.0.push(issue);
    }

    /// Whether no issues were found
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The number of issues found
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The issues as human-readable lines
    pub fn messages(&self) -> Vec<String> {
        self.0.iter().map(ToString::to_string).collect()
    }
}

/// A reading whose timestamp has not yet been interpreted
#[derive(Debug, Clone, PartialEq)]
pub struct RawReading {
    /// The timestamp, as it appeared in the file
    pub timestamp: String,
    /// The energy consumed, if the value was numeric
    pub kwh: Option<Energy>,
    /// The building, from the file name
    pub building: BuildingID,
    /// The month, from the file name
    pub month: Rc<str>,
}

/// The result of loading a data directory
#[derive(Debug, Clone, PartialEq)]
pub struct Ingestion {
    /// All usable readings, sorted by timestamp
    pub dataset: MeterDataset,
    /// Per-file problems which were skipped over
    pub issues: IssueLog,
}

/// What happened when one file was loaded
#[derive(Debug, PartialEq)]
enum FileOutcome {
    /// The file was valid and these are its rows
    Loaded(Vec<RawReading>),
    /// The file was missing a required column
    InvalidColumns,
}

/// Loads meter export files from a directory
pub struct MeterFileLoader {
    convention: Box<dyn FileNameConvention>,
    repairs: Vec<Box<dyn ShapeRepair>>,
}

impl Default for MeterFileLoader {
    fn default() -> Self {
        Self {
            convention: Box::new(UnderscoreConvention),
            repairs: default_repairs(),
        }
    }
}

impl MeterFileLoader {
    /// Create a loader with a custom naming convention and set of repairs
    pub fn new(
        convention: Box<dyn FileNameConvention>,
        repairs: Vec<Box<dyn ShapeRepair>>,
    ) -> Self {
        Self {
            convention,
            repairs,
        }
    }

    /// Load every meter export in `data_dir` into a single dataset.
    ///
    /// # Arguments
    ///
    /// * `data_dir` - Folder containing the CSV files
    ///
    /// # Returns
    ///
    /// The combined dataset with a log of skipped files, or an error if the directory doesn't
    /// exist or no file contained usable data.
    pub fn load_dataset(&self, data_dir: &Path) -> Result<Ingestion> {
        let (raw, issues) = self.load_raw_readings(data_dir)?;
        let dataset = normalise(raw);

        let untimed = dataset.untimed_len();
        if untimed > 0 {
            warn!("{untimed} reading(s) have unrecognised timestamps and will not be aggregated");
        }

        Ok(Ingestion { dataset, issues })
    }

    /// Load every meter export in `data_dir`, without interpreting timestamps
    pub fn load_raw_readings(&self, data_dir: &Path) -> Result<(Vec<RawReading>, IssueLog)> {
        ensure!(
            data_dir.is_dir(),
            "Data directory {} does not exist",
            data_dir.display()
        );

        let mut readings = Vec::new();
        let mut issues = IssueLog::default();
        let mut labels = HashSet::new();
        for path in find_input_files(data_dir)? {
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            info!("Loading {file_name}");

            match self.load_file(&path, &mut labels) {
                Ok(FileOutcome::Loaded(rows)) => {
                    info!("Loaded {} reading(s) from {file_name}", rows.len());
                    readings.extend(rows);
                }
                Ok(FileOutcome::InvalidColumns) => {
                    issues.push(IngestionIssue::InvalidColumns { file_name });
                }
                Err(err) if is_not_found(&err) => {
                    issues.push(IngestionIssue::MissingFile { path });
                }
                Err(err) => issues.push(IngestionIssue::ReadError {
                    file_name,
                    message: format!("{err:#}"),
                }),
            }
        }

        ensure!(
            !readings.is_empty(),
            "No valid CSV files found in data directory {}",
            data_dir.display()
        );

        Ok((readings, issues))
    }

    /// Parse, repair, validate and tag a single file
    fn load_file(&self, path: &Path, labels: &mut HashSet<Rc<str>>) -> Result<FileOutcome> {
        let tags = self.convention.tags_for_path(path);
        let file = File::open(path)?;
        let table = apply_repairs(RawTable::read_lenient(file)?, &self.repairs);

        let (Some(ts_idx), Some(kwh_idx)) =
            (table.column(TIMESTAMP_COLUMN), table.column(KWH_COLUMN))
        else {
            return Ok(FileOutcome::InvalidColumns);
        };

        let building = BuildingID(intern(&tags.building, labels));
        let month = intern(&tags.month, labels);
        let rows = table
            .values(ts_idx)
            .zip(table.values(kwh_idx))
            .map(|(timestamp, kwh)| RawReading {
                timestamp: timestamp.to_string(),
                kwh: parse_kwh(kwh),
                building: building.clone(),
                month: Rc::clone(&month),
            })
            .collect();

        Ok(FileOutcome::Loaded(rows))
    }
}

/// Load every meter export in `data_dir` using the default naming convention and repairs
pub fn load_dataset(data_dir: &Path) -> Result<Ingestion> {
    MeterFileLoader::default().load_dataset(data_dir)
}

/// Interpret timestamps and sort readings into a [`MeterDataset`]
pub fn normalise(raw: Vec<RawReading>) -> MeterDataset {
    MeterDataset::new(
        raw.into_iter()
            .map(|reading| MeterReading {
                timestamp: parse_timestamp(&reading.timestamp),
                kwh: reading.kwh,
                building: reading.building,
                month: reading.month,
            })
            .collect(),
    )
}

/// Find the meter export files in `data_dir`, in lexical order
fn find_input_files(data_dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(data_dir).with_context(|| input_err_msg(data_dir))?;
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.with_context(|| input_err_msg(data_dir))?.path();
        let is_csv = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(INPUT_FILE_EXTENSION));
        if is_csv && !path.is_dir() {
            paths.push(path);
        }
    }

    Ok(paths.into_iter().sorted().collect())
}

/// Whether the error was caused by a file not existing
fn is_not_found(err: &anyhow::Error) -> bool {
    err.downcast_ref::<io::Error>()
        .is_some_and(|err| err.kind() == io::ErrorKind::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, write_file};
    use float_cmp::assert_approx_eq;
    use rstest::rstest;
    use tempfile::tempdir;

    #[test]
    fn test_load_dataset() {
        let dir = tempdir().unwrap();
        write_file(
            dir.path(),
            "admin_block_2025-01.csv",
            "timestamp,kwh\n2025-01-01T01:00:00,1.5\n2025-01-01T00:00:00,2.5\n",
        );
        write_file(
            dir.path(),
            "hostel_a_2025-01.csv",
            "timestamp,kwh\n2025-01-01T00:30:00,N/A\n",
        );

        let ingestion = load_dataset(dir.path()).unwrap();
        assert!(ingestion.issues.is_empty());

        let dataset = &ingestion.dataset;
        assert_eq!(dataset.len(), 3);
        let rows = dataset
            .iter()
            .map(|r| (r.building.as_str(), r.month.as_ref(), r.kwh))
            .collect_vec();
        assert_eq!(
            rows,
            [
                ("admin", "2025-01", Some(Energy(2.5))),
                ("hostel", "2025-01", None),
                ("admin", "2025-01", Some(Energy(1.5))),
            ]
        );
    }

    #[test]
    fn test_load_dataset_combined_column() {
        let dir = tempdir().unwrap();
        write_file(
            dir.path(),
            "library_2025-02.csv",
            "\"timestamp,kwh\"\n\"2025-01-01T00:00:00,3.5\"\n\"2025-01-01T01:00:00,4\"\n",
        );

        let ingestion = load_dataset(dir.path()).unwrap();
        assert!(ingestion.issues.is_empty());
        let total: Energy = ingestion.dataset.iter().filter_map(|r| r.kwh).sum();
        assert_approx_eq!(Energy, total, Energy(7.5));
    }

    #[rstest]
    #[case("timestamp\n2025-01-01\n")]
    #[case("reading\n\"2025-01-01,1\"\n")] // one column, but not named for both fields
    #[case("time,energy\n2025-01-01,1\n")]
    fn test_load_dataset_invalid_columns(#[case] contents: &str) {
        let dir = tempdir().unwrap();
        write_file(dir.path(), "gym_2025-01.csv", contents);
        write_file(
            dir.path(),
            "admin_2025-01.csv",
            "timestamp,kwh\n2025-01-01,1\n",
        );

        let ingestion = load_dataset(dir.path()).unwrap();
        assert_eq!(ingestion.issues.messages(), ["Invalid columns in gym_2025-01.csv"]);
        assert!(ingestion.dataset.iter().all(|r| r.building.as_str() == "admin"));
    }

    #[test]
    fn test_load_dataset_read_error() {
        let dir = tempdir().unwrap();
        write_file(dir.path(), "empty_2025-01.csv", "");
        write_file(
            dir.path(),
            "admin_2025-01.csv",
            "timestamp,kwh\n2025-01-01,1\n",
        );

        let ingestion = load_dataset(dir.path()).unwrap();
        assert_eq!(
            ingestion.issues.messages(),
            ["Error reading empty_2025-01.csv: No columns to parse from file"]
        );
        assert_eq!(ingestion.dataset.len(), 1);
    }

    #[test]
    fn test_load_dataset_ignores_other_files() {
        let dir = tempdir().unwrap();
        write_file(dir.path(), "notes.txt", "not a meter export");
        write_file(
            dir.path(),
            "admin_2025-01.CSV",
            "timestamp,kwh\n2025-01-01,1\n",
        );

        let ingestion = load_dataset(dir.path()).unwrap();
        assert!(ingestion.issues.is_empty());
        assert_eq!(ingestion.dataset.len(), 1);
    }

    #[test]
    fn test_load_dataset_no_valid_files() {
        let dir = tempdir().unwrap();
        write_file(dir.path(), "gym_2025-01.csv", "time,energy\n2025-01-01,1\n");

        assert_error!(
            load_dataset(dir.path()),
            format!(
                "No valid CSV files found in data directory {}",
                dir.path().display()
            )
        );
    }

    #[test]
    fn test_load_dataset_empty_dir() {
        let dir = tempdir().unwrap();
        assert!(load_dataset(dir.path()).is_err());
    }

    #[test]
    fn test_load_dataset_missing_dir() {
        let dir = tempdir().unwrap();
        let data_dir = dir.path().join("data");
        assert_error!(
            load_dataset(&data_dir),
            format!("Data directory {} does not exist", data_dir.display())
        );
    }

    #[test]
    fn test_load_file_missing() {
        let dir = tempdir().unwrap();
        let loader = MeterFileLoader::default();
        let err = loader
            .load_file(&dir.path().join("gone_2025-01.csv"), &mut HashSet::new())
            .unwrap_err();
        assert!(is_not_found(&err));
        assert_eq!(
            IngestionIssue::MissingFile {
                path: PathBuf::from("data/gone_2025-01.csv")
            }
            .to_string(),
            "Missing file: data/gone_2025-01.csv"
        );
    }

    #[test]
    fn test_custom_convention() {
        struct WholeStem;
        impl FileNameConvention for WholeStem {
            fn tags(&self, stem: &str) -> file_name::FileTags {
                file_name::FileTags {
                    building: stem.to_string(),
                    month: "all".to_string(),
                }
            }
        }

        let dir = tempdir().unwrap();
        write_file(
            dir.path(),
            "admin_block.csv",
            "timestamp,kwh\n2025-01-01,1\n",
        );

        let loader = MeterFileLoader::new(Box::new(WholeStem), Vec::new());
        let ingestion = loader.load_dataset(dir.path()).unwrap();
        let reading = ingestion.dataset.iter().next().unwrap();
        assert_eq!(reading.building.as_str(), "admin_block");
        assert_eq!(reading.month.as_ref(), "all");
    }
}

//! Lenient parsing of delimited text into a table of strings.
use anyhow::{Result, ensure};
use log::debug;
use std::io::Read;

/// The contents of one input file before any interpretation of its values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    /// Column names, in file order
    pub headers: Vec<String>,
    /// Data rows, each with exactly `headers.len()` fields
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Parse delimited text, skipping any row whose field count doesn't match the header.
    ///
    /// Blank lines are ignored. Rows which are unreadable for reasons other than I/O (e.g. invalid
    /// UTF-8) are also skipped. Returns an error if the input has no header line at all.
    pub fn read_lenient<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let name = if idx == 0 {
                    name.trim_start_matches('\u{feff}')
                } else {
                    name
                };
                name.trim().to_string()
            })
            .collect();
        ensure!(
            !headers.iter().all(String::is_empty),
            "No columns to parse from file"
        );

        let mut rows = Vec::new();
        let mut skipped = 0usize;
        for result in reader.records() {
            let record = match result {
                Ok(record) => record,
                Err(err) if err.is_io_error() => return Err(err.into()),
                Err(_) => {
                    skipped += 1;
                    continue;
                }
            };

            if record.iter().all(str::is_empty) {
                continue;
            }

            if record.len() != headers.len() {
                skipped += 1;
                continue;
            }

            rows.push(record.iter().map(str::to_string).collect());
        }

        if skipped > 0 {
            debug!("Skipped {skipped} malformed row(s)");
        }

        Ok(Self { headers, rows })
    }

    /// The index of the first column called `name`
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Whether there is a column called `name`
    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Iterate over the values in the column at `idx`
    pub fn values(&self, idx: usize) -> impl Iterator<Item = &str> {
        self.rows.iter().map(move |row| row[idx].as_str())
    }
}

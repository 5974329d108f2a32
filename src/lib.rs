//! Ingestion and aggregation of campus building electricity-meter exports.
#![warn(missing_docs)]
use std::path::PathBuf;

pub mod aggregate;
pub mod building;
pub mod cli;
pub mod dataset;
pub mod id;
pub mod input;
pub mod log;
pub mod output;
pub mod settings;
pub mod units;

#[cfg(test)]
mod fixture;

/// Get the directory in which the program's config files are stored
pub fn get_config_dir() -> PathBuf {
    let mut dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    dir.push("campus_energy");

    dir
}

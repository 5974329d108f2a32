//! Integration tests for the `validate` command.
use campus_energy::cli::handle_validate_command;
use campus_energy::log::is_logger_initialised;
use campus_energy::settings::Settings;
use std::path::PathBuf;

/// Get the path to the bundled demo dataset.
fn get_data_dir() -> PathBuf {
    PathBuf::from("demos/campus")
}

/// An integration test for the `validate` command.
///
/// We also check that the logger is initialised after it is run.
#[test]
fn test_handle_validate_command() {
    unsafe { std::env::set_var("CAMPUS_ENERGY_LOG_LEVEL", "off") };

    assert!(!is_logger_initialised());

    handle_validate_command(&get_data_dir(), Some(Settings::default())).unwrap();

    assert!(is_logger_initialised());
}

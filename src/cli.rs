//! The command line interface for the program.
use crate::aggregate::Aggregates;
use crate::building::buildings_from_dataset;
use crate::input::load_dataset;
use crate::log;
use crate::output::metadata::write_metadata;
use crate::output::{
    create_output_directory, get_output_dir, write_aggregates, write_cleaned_data,
    write_ingestion_log, write_summary,
};
use crate::settings::Settings;
use ::log::{info, warn};
use anyhow::{Context, Result, ensure};
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};

pub mod demo;
use demo::DemoSubcommands;
pub mod settings;
use settings::SettingsSubcommands;

/// The command line interface for the program.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// The available commands.
    #[command(subcommand)]
    command: Option<Commands>,
    /// Flag to provide the CLI docs as markdown
    #[arg(long, hide = true)]
    markdown_help: bool,
}

/// Options for the run command
#[derive(Args, Default)]
pub struct RunOpts {
    /// Directory for output files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// Whether to overwrite the output directory if it already exists
    #[arg(long)]
    pub overwrite: bool,
}

/// The available commands.
#[derive(Subcommand)]
enum Commands {
    /// Load a directory of meter exports and write aggregated results.
    Run {
        /// Path to the directory of CSV files.
        data_dir: PathBuf,
        /// Other run options
        #[command(flatten)]
        opts: RunOpts,
    },
    /// Load a directory of meter exports and report any problems, without writing results.
    Validate {
        /// Path to the directory of CSV files.
        data_dir: PathBuf,
    },
    /// Manage the bundled demo datasets.
    Demo {
        /// The available subcommands for managing demo datasets.
        #[command(subcommand)]
        subcommand: DemoSubcommands,
    },
    /// Manage settings file.
    Settings {
        /// The available subcommands for managing the settings file.
        #[command(subcommand)]
        subcommand: SettingsSubcommands,
    },
}

impl Commands {
    /// Execute the supplied CLI command
    fn execute(self) -> Result<()> {
        match self {
            Self::Run { data_dir, opts } => handle_run_command(&data_dir, &opts, None),
            Self::Validate { data_dir } => handle_validate_command(&data_dir, None),
            Self::Demo { subcommand } => subcommand.execute(),
            Self::Settings { subcommand } => subcommand.execute(),
        }
    }
}

/// Parse CLI arguments and start the program
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    // Invoked as: `$ campus_energy --markdown-help`
    if cli.markdown_help {
        clap_markdown::print_help_markdown::<Cli>();
        return Ok(());
    }

    let Some(command) = cli.command else {
        // No command given, so print help
        let help_str = Cli::command().render_long_help().to_string();
        println!("{help_str}");
        return Ok(());
    };

    command.execute()
}

/// Handle the `run` command.
pub fn handle_run_command(
    data_path: &Path,
    opts: &RunOpts,
    settings: Option<Settings>,
) -> Result<()> {
    // Checked up front, as the default output folder is named after the data directory
    ensure!(
        data_path.is_dir(),
        "Data directory {} does not exist",
        data_path.display()
    );

    // Load program settings, if not provided
    let mut settings = if let Some(settings) = settings {
        settings
    } else {
        Settings::load().context("Failed to load settings.")?
    };

    // This setting can be overridden by command-line argument
    if opts.overwrite {
        settings.overwrite = true;
    }

    // Get path to output folder
    let pathbuf: PathBuf;
    let output_path = if let Some(p) = opts.output_dir.as_deref() {
        p
    } else {
        pathbuf = get_output_dir(data_path)?;
        &pathbuf
    };

    let overwrite =
        create_output_directory(output_path, settings.overwrite).with_context(|| {
            format!(
                "Failed to create output directory: {}",
                output_path.display()
            )
        })?;

    // Initialise program logger
    log::init(&settings.log_level, Some(output_path))
        .context("Failed to initialise logging.")?;

    // NB: We have to wait until the logger is initialised to display this warning
    if overwrite {
        warn!("Output folder will be overwritten");
    }

    // Load and normalise the input data
    let ingestion = load_dataset(data_path).context("Failed to load meter data.")?;
    info!(
        "Loaded {} reading(s) from {}",
        ingestion.dataset.len(),
        data_path.display()
    );
    info!("Output folder: {}", output_path.display());

    if let Some(log_path) = write_ingestion_log(output_path, &ingestion.issues)? {
        info!("Ingestion issues logged to {}", log_path.display());
    }

    // Aggregate
    let aggregates = Aggregates::compute(&ingestion.dataset);
    for building in buildings_from_dataset(&ingestion.dataset).values() {
        info!("{}", building.report());
    }

    // Write results
    write_metadata(
        output_path,
        data_path,
        ingestion.dataset.len(),
        &ingestion.issues,
    )?;
    write_cleaned_data(output_path, &ingestion.dataset)?;
    write_aggregates(output_path, &aggregates)?;
    let summary_path = write_summary(output_path, aggregates.campus.as_ref())?;
    info!("Summary written to {}", summary_path.display());

    Ok(())
}

/// Handle the `validate` command.
pub fn handle_validate_command(data_path: &Path, settings: Option<Settings>) -> Result<()> {
    // Load program settings, if not provided
    let settings = if let Some(settings) = settings {
        settings
    } else {
        Settings::load().context("Failed to load settings.")?
    };

    // Initialise program logger (we won't save log files when running the validate command)
    log::init(&settings.log_level, None).context("Failed to initialise logging.")?;

    let ingestion = load_dataset(data_path).context("Failed to validate meter data.")?;
    info!(
        "Validation complete: {} reading(s) loaded, {} file(s) skipped",
        ingestion.dataset.len(),
        ingestion.issues.len()
    );

    Ok(())
}

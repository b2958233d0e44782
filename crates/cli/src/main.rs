//! cloudmodel CLI
//!
//! A command-line tool for converting quantities, listing units and
//! inspecting or normalizing cloud planning problem files.

mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{convert, inspect, normalize};
use output::{print_error, OutputFormat};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// cloudmodel CLI
#[derive(Parser)]
#[command(name = "cloudmodel")]
#[command(author, version, about = "Cloud capacity planning model tools", long_about = None)]
pub struct Cli {
    /// Output format (defaults to CLOUDMODEL_DEFAULT_FORMAT or table)
    #[arg(long, short, global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a quantity to another unit
    Convert {
        /// Quantity to convert (e.g. "15 min", "0.096 usd/hour")
        quantity: String,

        /// Target unit (e.g. "hour", "usd/min")
        unit: String,

        /// Require the quantity to be of this kind
        #[arg(long, short)]
        kind: Option<convert::QuantityKind>,
    },

    /// List registered units
    Units {
        /// Only list units of this kind
        #[arg(long, short)]
        dimension: Option<convert::QuantityKind>,
    },

    /// Check the consistency of a problem file
    Check {
        /// Problem file (.json, .yaml or .yml)
        file: PathBuf,
    },

    /// Show the contents of a problem file
    Show {
        /// Problem file (.json, .yaml or .yml)
        file: PathBuf,
    },

    /// Express every time of a problem in a single unit
    Normalize {
        /// Problem file (.json, .yaml or .yml)
        file: PathBuf,

        /// Target time unit (defaults to CLOUDMODEL_DEFAULT_TIME_UNIT or hour)
        #[arg(long, short)]
        unit: Option<String>,

        /// Write the normalized problem to this file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = config::Config::load()?;
    let format = cli
        .format
        .or_else(|| config.default_format.as_deref().and_then(OutputFormat::from_name))
        .unwrap_or_default();
    debug!(?format, time_unit = %config.default_time_unit, "CLI configured");

    match cli.command {
        Commands::Convert { quantity, unit, kind } => {
            convert::convert(&quantity, &unit, kind, format)?;
        }
        Commands::Units { dimension } => {
            convert::list_units(dimension, format)?;
        }
        Commands::Check { file } => {
            inspect::check(&file, format)?;
        }
        Commands::Show { file } => {
            inspect::show(&file, format)?;
        }
        Commands::Normalize { file, unit, output } => {
            let unit = unit.unwrap_or(config.default_time_unit);
            normalize::normalize(&file, &unit, output.as_deref(), format)?;
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            print_error(&format!("{:#}", err));
            ExitCode::FAILURE
        }
    }
}

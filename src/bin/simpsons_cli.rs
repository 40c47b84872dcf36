//! Simpson's Paradox explorer CLI
//!
//! Loads a JSON bundle `{"config": {...}, "records": [...]}`, runs one view
//! and prints its result as JSON. Logs go to stderr; set `RUST_LOG` to
//! control verbosity.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use simpsons::{
    explore_categorical, explore_continuous, CategoricalEvent, InMemoryRegistry,
    RawCategoryInput, SimpsonsError, SimulationSession, NONE_SELECTION,
};

const BUNDLE_ID: &str = "bundle";

#[derive(Parser, Debug)]
#[command(name = "simpsons-cli", about = "Explore and simulate Simpson's Paradox datasets", version)]
struct CliArgs {
    #[arg(long, value_name = "FILE", env = "SIMPSONS_BUNDLE", help = "JSON bundle with config and records", global = true)]
    bundle: Option<PathBuf>,

    #[arg(long, help = "Pretty-print the JSON output", global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Outcome rates and counts by a compare column, optionally faceted.
    ExploreCategorical {
        #[arg(long, help = "Compare column (defaults to the configured initial variable)")]
        compare: Option<String>,
        #[arg(long, requires = "compare", help = "Facet column, or 'none'")]
        facet: Option<String>,
    },
    /// Scatter plot with linear trends of the continuous column pair.
    ExploreContinuous {
        #[arg(long, default_value = NONE_SELECTION, help = "Group column, or 'none'")]
        group: String,
    },
    /// Suggested simulation inputs derived from the records.
    Suggest,
    /// Run a simulation and print the rate chart.
    Simulate {
        #[arg(long, value_name = "FILE", help = "JSON array of category inputs (defaults to the suggestions)")]
        params: Option<PathBuf>,
        #[arg(long, help = "Split rates by the first simulation column")]
        facet: bool,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error("--bundle is required (or set SIMPSONS_BUNDLE)")]
    MissingBundle,

    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("bundle has no '{field}' field")]
    MissingField { field: &'static str },

    #[error(transparent)]
    Simpsons(#[from] SimpsonsError),

    #[error("cannot serialize output: {0}")]
    Output(serde_json::Error),
}

impl From<simpsons::ConfigurationError> for CliError {
    fn from(err: simpsons::ConfigurationError) -> Self {
        Self::Simpsons(err.into())
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn read_json(path: &Path) -> Result<serde_json::Value, CliError> {
    let text = fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn load_registry(bundle: &Path) -> Result<InMemoryRegistry, CliError> {
    let json = read_json(bundle)?;
    let config = json.get("config").ok_or(CliError::MissingField { field: "config" })?;
    let records = json.get("records").ok_or(CliError::MissingField { field: "records" })?;
    let registry = InMemoryRegistry::new();
    registry.insert_json(BUNDLE_ID, config, records)?;
    Ok(registry)
}

fn print<T: Serialize>(value: &T, pretty: bool) -> Result<(), CliError> {
    let text = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(CliError::Output)?;
    println!("{text}");
    Ok(())
}

fn run(args: CliArgs) -> Result<(), CliError> {
    let bundle = args.bundle.ok_or(CliError::MissingBundle)?;
    let registry = load_registry(&bundle)?;

    match args.command {
        Command::ExploreCategorical { compare, facet } => {
            let event = match (compare.as_deref(), facet.as_deref()) {
                (None, _) => CategoricalEvent::Load,
                (Some(compare), None) => CategoricalEvent::CompareChanged(compare),
                (Some(compare), Some(facet)) => CategoricalEvent::FacetChanged { compare, facet },
            };
            print(&explore_categorical(&registry, BUNDLE_ID, event)?, args.pretty)
        }
        Command::ExploreContinuous { group } => {
            print(&explore_continuous(&registry, BUNDLE_ID, &group)?, args.pretty)
        }
        Command::Suggest => {
            let session = SimulationSession::open(&registry, BUNDLE_ID)?;
            print(session.form(), args.pretty)
        }
        Command::Simulate { params, facet } => {
            let mut session = SimulationSession::open(&registry, BUNDLE_ID)?;
            let inputs: Vec<RawCategoryInput> = match params {
                Some(path) => serde_json::from_value(read_json(&path)?)
                    .map_err(|source| CliError::Json { path, source })?,
                None => session.form().rows.clone(),
            };
            if let Err(err) = session.run_inputs(&inputs, facet).map(|_| ()) {
                if let Some(message) = session.error_message() {
                    eprintln!("{message}");
                }
                return Err(err.into());
            }
            print(session.chart(), args.pretty)
        }
    }
}

fn main() -> ExitCode {
    init_logging();
    match run(CliArgs::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

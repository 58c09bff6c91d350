use clap::{Args, Parser, Subcommand};
use metabolon::engine::locks::LockCategory;
use metabolon::workflows::pathway::PathwayTopology;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Metabolon CLI - generate biochemical pathways and simulate their kinetics, regulation and evolution headless.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a pathway and simulate it for a fixed duration.
    Run(RunArgs),
    /// Generate a pathway and print it without simulating.
    Pathway(PathwayArgs),
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the configuration file in TOML format. Defaults apply when omitted.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Simulated seconds to run, overriding `run.duration`.
    #[arg(short, long, value_name = "SECONDS")]
    pub duration: Option<f64>,

    /// Seed for pathway generation and the simulation, overriding `simulation.seed`.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Lock every category except this one.
    #[arg(long, value_name = "CATEGORY", conflicts_with = "lock")]
    pub isolate: Option<LockCategory>,

    /// Lock a category (molecules, enzymes, genes, reactions, mutations, evolution).
    /// Can be used multiple times.
    #[arg(long, value_name = "CATEGORY")]
    pub lock: Vec<LockCategory>,

    /// Write the concentration history as CSV to this path.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S pathway.molecule-count=8
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `pathway` subcommand.
#[derive(Args, Debug)]
pub struct PathwayArgs {
    /// Path to the configuration file in TOML format. Defaults apply when omitted.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Seed for pathway generation, overriding `simulation.seed`.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Override `pathway.topology`.
    #[arg(short, long, value_name = "TOPOLOGY")]
    pub topology: Option<PathwayTopology>,

    /// Write the generated network as TOML to this path.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

mod commands;
mod helpers;

use clap::Parser;
use fluidpost_core::domain::PostError;
use fluidpost_core::modules::histogram::HistogramPlot;
use std::path::PathBuf;

pub fn run_from_env() -> i32 {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(args) {
        Ok(code) => code,
        Err(error) => {
            let post_error = error.as_post_error();
            eprintln!("{}", post_error.diagnostic_line());
            if let Some(summary_line) = post_error.fatal_exit_line() {
                eprintln!("{}", summary_line);
            }
            post_error.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once("fluidpost".to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();
    parse_and_dispatch(full_args)
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => {
            helpers::setup_logging(cli.verbose, cli.quiet);
            let config = helpers::load_config(cli.config.as_deref())?;
            let context = helpers::resolve_context(config, cli.data_root, cli.output_root);
            dispatch_parsed(&context, cli.command)
        }
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(
    name = "fluidpost",
    version,
    about = "Post-processing and plotting for fluid simulation output"
)]
struct Cli {
    /// JSON configuration file (default: ./fluidpost.json when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding simulation output
    #[arg(long, global = true)]
    data_root: Option<PathBuf>,

    /// Directory receiving tables and figures
    #[arg(long, global = true)]
    output_root: Option<PathBuf>,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Silence all logging
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Contact values of hard spheres next to a sphere or wall
    #[command(subcommand)]
    Contact(commands::ContactCommand),
    /// Pair distribution at contact and its fitted model
    Ghs(commands::GhsArgs),
    /// Energy histograms of square-well runs
    Histogram(commands::SystemArgs),
    /// Density of states and inverse weights
    Dos(commands::DosArgs),
    /// Iterations per round trip against energy
    Samples(commands::SystemArgs),
    /// Cost of flat-histogram methods against system size
    Scaling(commands::ScalingArgs),
    /// Convergence of density-of-states movies against a reference
    Compare(commands::CompareArgs),
    /// Heat-capacity error of Lennard-Jones cluster runs
    #[command(name = "lj-heat-capacity")]
    LjHeatCapacity(commands::HeatCapacityArgs),
    /// Canonical internal energy, heat capacity and entropy
    Thermo(commands::ThermoArgs),
    /// Homogeneous free energy against filling fraction
    FreeEnergy(commands::FreeEnergyArgs),
    /// Liquid-vapour coexistence curves
    Coexistence,
    /// Soft-sphere pressure, energy, diffusion and radial plots
    Soft(commands::SoftArgs),
    /// Start simulation jobs in the background
    #[command(subcommand)]
    Launch(commands::LaunchCommand),
}

fn dispatch_parsed(context: &helpers::RunContext, command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Contact(command) => commands::run_contact_command(context, command),
        CliCommand::Ghs(args) => commands::run_ghs_command(context, args),
        CliCommand::Histogram(args) => {
            commands::run_histogram_command(context, HistogramPlot::EnergyHistogram, args)
        }
        CliCommand::Dos(args) => commands::run_dos_command(context, args),
        CliCommand::Samples(args) => {
            commands::run_histogram_command(context, HistogramPlot::SampleRate, args)
        }
        CliCommand::Scaling(args) => commands::run_scaling_command(context, args),
        CliCommand::Compare(args) => commands::run_compare_command(context, args),
        CliCommand::LjHeatCapacity(args) => commands::run_heat_capacity_command(context, args),
        CliCommand::Thermo(args) => commands::run_thermo_command(context, args),
        CliCommand::FreeEnergy(args) => commands::run_free_energy_command(context, args),
        CliCommand::Coexistence => commands::run_coexistence_command(context),
        CliCommand::Soft(args) => commands::run_soft_command(context, args),
        CliCommand::Launch(command) => commands::run_launch_command(context, command),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Compute(PostError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    pub fn as_post_error(&self) -> PostError {
        match self {
            Self::Usage(message) => PostError::input_validation("INPUT.CLI_USAGE", message.clone()),
            Self::Compute(error) => error.clone(),
            Self::Internal(error) => PostError::io_system("IO.CLI", format!("{error:#}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CliError, run};

    #[test]
    fn unknown_subcommand_is_a_usage_error() {
        let error = run(["plot-everything"]).expect_err("unknown command");
        assert!(matches!(error, CliError::Usage(_)));
        assert_eq!(error.as_post_error().exit_code(), 2);
    }

    #[test]
    fn help_exits_cleanly() {
        assert_eq!(run(["--help"]).expect("help"), 0);
    }

    #[test]
    fn analysis_failures_keep_their_placeholder() {
        let temp = tempfile::TempDir::new().expect("tempdir should be created");
        let data_root = temp.path().display().to_string();
        let error = run([
            "--data-root",
            data_root.as_str(),
            "--output-root",
            data_root.as_str(),
            "free-energy",
            "--temperatures",
            "1",
        ])
        .expect_err("missing table");
        let post_error = error.as_post_error();
        assert_eq!(post_error.placeholder(), "IO.TABLE_READ");
        assert_eq!(post_error.exit_code(), 3);
    }
}

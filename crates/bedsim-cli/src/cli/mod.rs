mod commands;
mod helpers;

use bedsim_core::domain::BedError;
use clap::Parser;
use std::path::PathBuf;

const LOG_ENV_VAR: &str = "BEDSIM_LOG";

pub fn run_from_env() -> i32 {
    let args: Vec<String> = std::env::args().collect();

    match parse_and_dispatch(args) {
        Ok(code) => code,
        Err(error) => {
            let error = error.as_bed_error();
            eprintln!("{}", error.diagnostic_line());
            error.exit_code()
        }
    }
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => {
            init_tracing(cli.quiet, cli.verbose)?;
            dispatch_parsed(cli)
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

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

#[derive(Parser)]
#[command(
    name = "bedsim",
    version,
    about = "BED/EQD2 conversions and dose budgets for re-irradiation planning"
)]
struct Cli {
    /// Engine configuration file (JSON)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log debug events to stderr
    #[arg(long, short, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(long, short, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Convert a fractionation scheme into BED and EQD2
    Bed(commands::BedArgs),
    /// Maximum dose per fraction that fits a BED budget
    Solve(commands::SolveArgs),
    /// Whole months elapsed between two treatment dates
    Months(commands::MonthsArgs),
    /// Percentage of a previous course assumed recovered
    Forget(commands::ForgetArgs),
    /// BED and EQD2 still available for a new course
    Remaining(commands::RemainingArgs),
    /// Re-express a VxGy < x% constraint under a new fractionation
    Vx(commands::VxArgs),
    /// Run the whole calculation from a JSON form
    Plan(commands::PlanArgs),
    /// Inspect, prune or print saved results
    History {
        #[command(subcommand)]
        command: commands::HistoryCommand,
    },
    /// List the organ α/β reference table
    Organs,
    /// List the recovery models
    Models,
}

fn dispatch_parsed(cli: Cli) -> Result<i32, CliError> {
    let config = helpers::load_config(cli.config.as_deref())?;

    match cli.command {
        CliCommand::Bed(args) => commands::run_bed_command(args, &config),
        CliCommand::Solve(args) => commands::run_solve_command(args, &config),
        CliCommand::Months(args) => commands::run_months_command(args),
        CliCommand::Forget(args) => commands::run_forget_command(args, &config),
        CliCommand::Remaining(args) => commands::run_remaining_command(args, &config),
        CliCommand::Vx(args) => commands::run_vx_command(args, &config),
        CliCommand::Plan(args) => commands::run_plan_command(args, &config),
        CliCommand::History { command } => commands::run_history_command(command, &config),
        CliCommand::Organs => commands::run_organs_command(&config),
        CliCommand::Models => commands::run_models_command(&config),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Compute(BedError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    fn as_bed_error(&self) -> BedError {
        match self {
            Self::Usage(message) => BedError::input_validation("INPUT.CLI_USAGE", message.clone()),
            Self::Compute(error) => error.clone(),
            Self::Internal(error) => BedError::io_system("IO.CLI", format!("{error:#}")),
        }
    }
}

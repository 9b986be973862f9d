use super::CliError;
use super::helpers::*;
use anyhow::Context;
use bedsim_core::common::config::{EngineConfig, ReportLayout};
use bedsim_core::domain::{
    AlphaBeta, BedError, DoseRegimen, RecoveryModel, Resolved, UnknownRecoveryModel, VxInput,
};
use bedsim_core::modules::budget::remaining_budget;
use bedsim_core::modules::conversion::convert;
use bedsim_core::modules::engine::recompute;
use bedsim_core::modules::form::FormFields;
use bedsim_core::modules::history::{
    HistoryError, JsonFileHistory, SavedEntry, most_recent_first, render_report,
    render_report_text,
};
use bedsim_core::modules::recovery::{months_between, parse_treatment_date, resolve_forget_percent};
use bedsim_core::modules::serialization::{to_json_artifact, write_text_artifact};
use bedsim_core::modules::solver::max_dose_plan;
use bedsim_core::modules::traits::{HistoryRecorder, HistoryStore};
use bedsim_core::modules::vx::convert_threshold;
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_HISTORY_PATH: &str = "bedsim-history.json";
/// Page header plus at least one body line.
const MIN_REPORT_LINES_PER_PAGE: usize = 3;

#[derive(clap::Args)]
pub(super) struct TissueArgs {
    /// α/β ratio of the tissue (Gy)
    #[arg(long, visible_alias = "ab")]
    alpha_beta: Option<String>,

    /// Organ name; fills α/β from the reference table
    #[arg(long)]
    organ: Option<String>,
}

impl TissueArgs {
    fn resolve(&self, config: &EngineConfig) -> Result<Option<f64>, CliError> {
        resolve_alpha_beta(self.alpha_beta.as_deref(), self.organ.as_deref(), config)
    }
}

#[derive(clap::Args)]
pub(super) struct BedArgs {
    /// Total dose (Gy)
    #[arg(long)]
    total: Option<String>,

    /// Number of fractions
    #[arg(long, short = 'n')]
    fractions: Option<String>,

    /// Dose per fraction (Gy)
    #[arg(long, short = 'd')]
    dose_per_fraction: Option<String>,

    #[command(flatten)]
    tissue: TissueArgs,

    /// BED to use instead of the computed value (Gy)
    #[arg(long)]
    manual_bed: Option<String>,

    /// Raise doses per fraction below the configured minimum before converting
    #[arg(long)]
    floor: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args)]
pub(super) struct SolveArgs {
    /// BED budget (Gy)
    #[arg(long)]
    bed: String,

    /// Number of fractions of the new course
    #[arg(long, short = 'n')]
    fractions: String,

    #[command(flatten)]
    tissue: TissueArgs,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args)]
pub(super) struct MonthsArgs {
    /// First day of the previous course (YYYY-MM-DD)
    #[arg(long)]
    start: String,

    /// Reference date, usually the start of the new course (YYYY-MM-DD)
    #[arg(long)]
    end: String,
}

#[derive(clap::Args)]
pub(super) struct ForgetArgs {
    /// Recovery model: paradis, nieder, abusaris, noel (or a-d)
    #[arg(long)]
    model: Option<String>,

    /// Elapsed whole months
    #[arg(long, conflicts_with_all = ["start", "end"])]
    months: Option<u32>,

    /// First day of the previous course (YYYY-MM-DD)
    #[arg(long, requires = "end")]
    start: Option<String>,

    /// Reference date (YYYY-MM-DD)
    #[arg(long, requires = "start")]
    end: Option<String>,

    /// Percentage to use instead of the model (0-100)
    #[arg(long)]
    manual: Option<String>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args)]
pub(super) struct RemainingArgs {
    /// Allowed BED (Gy)
    #[arg(long)]
    allowed_bed: String,

    /// BED already delivered (Gy)
    #[arg(long)]
    used_bed: String,

    /// Recovered percentage of the delivered BED (0-100)
    #[arg(long)]
    forget: Option<String>,

    #[command(flatten)]
    tissue: TissueArgs,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args)]
pub(super) struct VxArgs {
    /// Threshold dose of the original constraint (Gy)
    #[arg(long)]
    threshold: String,

    /// Dose per fraction the constraint was defined for (Gy)
    #[arg(long)]
    initial_dose_per_fraction: String,

    /// Dose per fraction of the new scheme (Gy)
    #[arg(long)]
    new_dose_per_fraction: Option<String>,

    /// Number of fractions of the new scheme
    #[arg(long)]
    new_fractions: Option<String>,

    #[command(flatten)]
    tissue: TissueArgs,

    /// Volume percentage of the constraint
    #[arg(long, default_value = "30")]
    percent: String,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args)]
pub(super) struct PlanArgs {
    /// JSON file with the form fields
    #[arg(long)]
    input: PathBuf,

    /// Save the result to the history; without a name the next "Organ N" is used
    #[arg(long, value_name = "NAME", num_args = 0..=1, default_missing_value = "")]
    save: Option<String>,

    /// History file used by --save
    #[arg(long, default_value = DEFAULT_HISTORY_PATH)]
    history: PathBuf,

    /// Write the derivable missing regimen fields back into the input file
    #[arg(long)]
    fill: bool,

    /// Raise doses per fraction below the configured minimum before converting
    #[arg(long)]
    floor: bool,

    /// Print the full result as JSON
    #[arg(long)]
    json: bool,
}

#[derive(clap::Subcommand)]
pub(super) enum HistoryCommand {
    /// List saved results, newest first
    List {
        #[arg(long, default_value = DEFAULT_HISTORY_PATH)]
        history: PathBuf,
    },
    /// Remove the saved result at INDEX (as shown by `history list`)
    Remove {
        index: usize,

        #[arg(long, default_value = DEFAULT_HISTORY_PATH)]
        history: PathBuf,
    },
    /// Print or write the paginated text report
    Report {
        #[arg(long, default_value = DEFAULT_HISTORY_PATH)]
        history: PathBuf,

        /// Write the report to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        /// Report title
        #[arg(long)]
        title: Option<String>,

        /// Lines per page, page header included
        #[arg(long)]
        lines_per_page: Option<usize>,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ForgetReport {
    model: RecoveryModel,
    elapsed_months: Option<u32>,
    forget_percent: Resolved<f64>,
}

pub(super) fn run_bed_command(args: BedArgs, config: &EngineConfig) -> Result<i32, CliError> {
    let alpha_beta = args.tissue.resolve(config)?;
    let regimen = DoseRegimen::new(
        parse_number_arg("total", args.total.as_deref())?,
        parse_count_arg("fractions", args.fractions.as_deref())?,
        parse_number_arg("dose-per-fraction", args.dose_per_fraction.as_deref())?,
    );
    let manual_bed = parse_number_arg("manual-bed", args.manual_bed.as_deref())?;

    let mut policy = config.dose_policy.clone();
    policy.enforce_minimum_dose_per_fraction |= args.floor;

    let conversion = convert(regimen, AlphaBeta::from_option(alpha_beta), manual_bed, &policy);
    let Some(bed) = conversion.bed else {
        return Err(unavailable(
            "COMPUTE.BED_UNAVAILABLE",
            "BED needs two of --total, --fractions and --dose-per-fraction plus a positive \
             alpha/beta, or --manual-bed",
        ));
    };

    if args.json {
        return print_json(&conversion);
    }

    let fractions = conversion
        .regimen
        .fraction_count
        .map_or_else(|| MISSING_VALUE.to_string(), |count| count.to_string());
    println!(
        "Regimen: {fractions} x {} Gy = {} Gy",
        display(conversion.regimen.dose_per_fraction),
        display(conversion.regimen.total_dose)
    );
    let source = if bed.is_overridden() { " (manual)" } else { "" };
    println!("BED: {} Gy{source}", display(Some(bed.value())));
    println!("EQD2: {} Gy", display(conversion.eqd2));
    println!("Physical dose: {} Gy", display(conversion.physical_dose));
    Ok(0)
}

pub(super) fn run_solve_command(args: SolveArgs, config: &EngineConfig) -> Result<i32, CliError> {
    let bed = require("bed", parse_number_arg("bed", Some(args.bed.as_str()))?)?;
    let fractions = require(
        "fractions",
        parse_count_arg("fractions", Some(args.fractions.as_str()))?,
    )?;
    let alpha_beta = require_alpha_beta(args.tissue.resolve(config)?)?;

    let plan = max_dose_plan(bed, fractions, alpha_beta).ok_or_else(|| {
        unavailable(
            "COMPUTE.SOLVER",
            format!("no positive dose per fraction fits a BED of {bed} Gy over {fractions} fractions"),
        )
    })?;

    if args.json {
        return print_json(&plan);
    }

    println!("Max dose per fraction: {} Gy", display(Some(plan.dose_per_fraction)));
    println!(
        "Max total dose: {} Gy over {} fractions",
        display(Some(plan.total_dose)),
        plan.fraction_count
    );
    Ok(0)
}

pub(super) fn run_months_command(args: MonthsArgs) -> Result<i32, CliError> {
    let start = parse_date_arg("start", &args.start)?;
    let end = parse_date_arg("end", &args.end)?;
    let months = elapsed_months(start, end)?;

    tracing::debug!(%start, %end, months, "elapsed months");
    println!("{months}");
    Ok(0)
}

pub(super) fn run_forget_command(args: ForgetArgs, config: &EngineConfig) -> Result<i32, CliError> {
    let model = parse_model_arg(args.model.as_deref(), config)?;
    let manual = parse_number_arg("manual", args.manual.as_deref())?;
    if let Some(percent) = manual.filter(|percent| !(0.0..=100.0).contains(percent)) {
        return Err(CliError::Usage(format!(
            "--manual must be between 0 and 100, got {percent}"
        )));
    }

    let elapsed = match (args.months, args.start.as_deref(), args.end.as_deref()) {
        (Some(months), _, _) => Some(months),
        (None, Some(start), Some(end)) => Some(elapsed_months(
            parse_date_arg("start", start)?,
            parse_date_arg("end", end)?,
        )?),
        _ => None,
    };

    let forget_percent = resolve_forget_percent(manual, elapsed, model, config.slow_recovery_rule)
        .ok_or_else(|| {
            unavailable(
                "COMPUTE.FORGET_UNAVAILABLE",
                "pass --months, --start and --end, or --manual",
            )
        })?;

    if args.json {
        return print_json(&ForgetReport {
            model,
            elapsed_months: elapsed,
            forget_percent,
        });
    }

    let detail = match (forget_percent, elapsed) {
        (Resolved::Overridden(_), _) => "manual".to_string(),
        (Resolved::Computed(_), Some(months)) => format!("{model} model, {months} months"),
        (Resolved::Computed(_), None) => format!("{model} model"),
    };
    println!("Forget: {} % ({detail})", display(Some(forget_percent.value())));
    Ok(0)
}

pub(super) fn run_remaining_command(
    args: RemainingArgs,
    config: &EngineConfig,
) -> Result<i32, CliError> {
    let allowed = require(
        "allowed-bed",
        parse_number_arg("allowed-bed", Some(args.allowed_bed.as_str()))?,
    )?;
    let used = require(
        "used-bed",
        parse_number_arg("used-bed", Some(args.used_bed.as_str()))?,
    )?;
    let forget = parse_number_arg("forget", args.forget.as_deref())?;
    if let Some(percent) = forget.filter(|percent| !(0.0..=100.0).contains(percent)) {
        return Err(CliError::Usage(format!(
            "--forget must be between 0 and 100, got {percent}"
        )));
    }
    let alpha_beta = AlphaBeta::from_option(args.tissue.resolve(config)?);

    let budget = remaining_budget(Some(allowed), Some(used), forget, alpha_beta).ok_or_else(|| {
        unavailable("COMPUTE.REMAINING_UNAVAILABLE", "remaining BED could not be computed")
    })?;

    if args.json {
        return print_json(&budget);
    }

    println!("Remaining BED: {} Gy", display(Some(budget.bed)));
    println!("Remaining EQD2: {} Gy", display(budget.eqd2));
    if forget.is_none() {
        println!("No recovery credit applied (forget 0 %)");
    }
    Ok(0)
}

pub(super) fn run_vx_command(args: VxArgs, config: &EngineConfig) -> Result<i32, CliError> {
    let alpha_beta = require_alpha_beta(args.tissue.resolve(config)?)?;
    let input = VxInput {
        threshold_dose: Some(require(
            "threshold",
            parse_number_arg("threshold", Some(args.threshold.as_str()))?,
        )?),
        initial_dose_per_fraction: Some(require(
            "initial-dose-per-fraction",
            parse_number_arg(
                "initial-dose-per-fraction",
                Some(args.initial_dose_per_fraction.as_str()),
            )?,
        )?),
        new_dose_per_fraction: parse_number_arg(
            "new-dose-per-fraction",
            args.new_dose_per_fraction.as_deref(),
        )?,
        new_fraction_count: parse_count_arg("new-fractions", args.new_fractions.as_deref())?,
        alpha_beta: Some(alpha_beta.value()),
        target_percent: parse_number_arg("percent", Some(args.percent.as_str()))?,
    };

    let result = convert_threshold(&input, None).ok_or_else(|| {
        unavailable("COMPUTE.VX_UNAVAILABLE", "the Vx constraint could not be converted")
    })?;

    if args.json {
        return print_json(&result);
    }

    let percent = display(result.target_percent);
    println!("Reference BED: {} Gy", display(Some(result.reference_bed)));
    if let Some(total) = result.equivalent_total_dose {
        println!("New constraint: V{} Gy < {percent} %", display(Some(total)));
    }
    if let Some(per_fraction) = result.equivalent_dose_per_fraction {
        println!(
            "Per fraction: V{} Gy/fraction < {percent} %",
            display(Some(per_fraction))
        );
    }
    if let (Some(exact), Some(count)) = (result.exact_dose_per_fraction, input.new_fraction_count) {
        println!(
            "Exact dose per fraction over {count} fractions: {} Gy",
            display(Some(exact))
        );
    }
    Ok(0)
}

pub(super) fn run_plan_command(args: PlanArgs, config: &EngineConfig) -> Result<i32, CliError> {
    let mut form = load_form(&args.input)?;
    if args.fill {
        form.fill_missing();
        let json = to_json_artifact(&form).context("failed to encode form fields")?;
        write_text_artifact(&args.input, &json)
            .with_context(|| format!("failed to write form '{}'", args.input.display()))?;
    }

    let mut config = config.clone();
    config.dose_policy.enforce_minimum_dose_per_fraction |= args.floor;

    let input = form.to_engine_input(&config);
    let output = recompute(&input, &config);

    let saved = match args.save.as_deref() {
        Some(name) => {
            let mut history = JsonFileHistory::open(&args.history).map_err(history_error)?;
            let entry = history
                .record(name, &output, Utc::now())
                .map_err(history_error)?;
            tracing::debug!(name = %entry.name, path = %history.path().display(), "saved entry");
            Some(entry)
        }
        None => None,
    };

    if args.json {
        return print_json(&output);
    }

    let label = output.organ.clone().unwrap_or_else(|| "Current plan".to_string());
    let entry = SavedEntry::from_output(label, &output, Utc::now());
    let layout = ReportLayout {
        lines_per_page: usize::MAX,
        ..config.report.clone()
    };
    for page in render_report(&[entry], &layout) {
        for line in page.lines {
            println!("{line}");
        }
    }

    let elapsed = output
        .elapsed_months
        .map_or_else(|| MISSING_VALUE.to_string(), |months| months.to_string());
    println!("  Elapsed: {elapsed} months ({} model)", output.recovery_model);

    if let Some(entry) = saved {
        println!("Saved as '{}' in {}", entry.name, args.history.display());
    }
    Ok(0)
}

pub(super) fn run_history_command(
    command: HistoryCommand,
    config: &EngineConfig,
) -> Result<i32, CliError> {
    match command {
        HistoryCommand::List { history } => {
            let history = JsonFileHistory::open(&history).map_err(history_error)?;
            if history.entries().is_empty() {
                println!("No saved results.");
                return Ok(0);
            }
            for (index, entry) in most_recent_first(history.entries()) {
                println!(
                    "[{index}] {}  remaining BED {} Gy  EQD2 {} Gy  max {} Gy/fraction  ({})",
                    entry.name,
                    display(entry.remaining_bed),
                    display(entry.remaining_eqd2),
                    display(entry.max_dose_per_fraction),
                    entry.created_at
                );
            }
            Ok(0)
        }
        HistoryCommand::Remove { index, history } => {
            let mut history = JsonFileHistory::open(&history).map_err(history_error)?;
            let removed = history.remove(index).map_err(history_error)?;
            println!("Removed [{index}] {}", removed.name);
            Ok(0)
        }
        HistoryCommand::Report {
            history,
            output,
            title,
            lines_per_page,
        } => {
            let history = JsonFileHistory::open(&history).map_err(history_error)?;
            let mut layout = config.report.clone();
            if let Some(title) = title {
                layout.title = title;
            }
            if let Some(lines_per_page) = lines_per_page {
                if lines_per_page < MIN_REPORT_LINES_PER_PAGE {
                    return Err(CliError::Usage(format!(
                        "--lines-per-page must be at least {MIN_REPORT_LINES_PER_PAGE}"
                    )));
                }
                layout.lines_per_page = lines_per_page;
            }

            let entries = most_recent_first(history.entries())
                .into_iter()
                .map(|(_, entry)| entry.clone())
                .collect::<Vec<_>>();
            if entries.is_empty() {
                println!("No saved results.");
                return Ok(0);
            }

            let text = render_report_text(&entries, &layout);
            match output {
                Some(path) => {
                    write_text_artifact(&path, &text)
                        .with_context(|| format!("failed to write report '{}'", path.display()))?;
                    println!("Report written to {}", path.display());
                }
                None => print!("{text}"),
            }
            Ok(0)
        }
    }
}

pub(super) fn run_organs_command(config: &EngineConfig) -> Result<i32, CliError> {
    let width = config
        .organs
        .iter()
        .map(|organ| organ.name.chars().count())
        .max()
        .unwrap_or(0);
    for organ in &config.organs {
        println!("{:<width$}  {}", organ.name, display(Some(organ.alpha_beta)));
    }
    Ok(0)
}

pub(super) fn run_models_command(config: &EngineConfig) -> Result<i32, CliError> {
    for model in RecoveryModel::ALL {
        let marker = if model == config.default_recovery_model {
            " (default)"
        } else {
            ""
        };
        println!(
            "{}  {:<8}  {}{marker}",
            model.letter(),
            model.as_str(),
            model.description()
        );
    }
    Ok(0)
}

fn parse_model_arg(value: Option<&str>, config: &EngineConfig) -> Result<RecoveryModel, CliError> {
    match value {
        Some(text) => text
            .parse()
            .map_err(|error: UnknownRecoveryModel| CliError::Usage(error.to_string())),
        None => Ok(config.default_recovery_model),
    }
}

fn parse_date_arg(flag: &str, text: &str) -> Result<NaiveDate, CliError> {
    parse_treatment_date(text).ok_or_else(|| {
        CliError::Usage(format!("invalid date '{text}' for --{flag}; expected YYYY-MM-DD"))
    })
}

fn elapsed_months(start: NaiveDate, end: NaiveDate) -> Result<u32, CliError> {
    months_between(start, end).ok_or_else(|| {
        unavailable(
            "COMPUTE.DATES_REVERSED",
            format!("end date {end} is before start date {start}"),
        )
    })
}

fn load_form(path: &Path) -> Result<FormFields, CliError> {
    let source = fs::read_to_string(path).map_err(|source| {
        CliError::Compute(BedError::io_system(
            "IO.FORM_READ",
            format!("failed to read form '{}': {source}", path.display()),
        ))
    })?;
    serde_json::from_str(&source).map_err(|source| {
        CliError::Compute(BedError::input_validation(
            "INPUT.FORM_PARSE",
            format!("failed to parse form '{}': {source}", path.display()),
        ))
    })
}

fn history_error(error: HistoryError) -> CliError {
    CliError::Compute(error.into())
}

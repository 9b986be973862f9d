use serde_json::Value;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const SPINAL_CORD_FORM: &str = r#"
{
  "organ": "Spinal cord",
  "totalDose": "50",
  "fractionCount": "25",
  "usedDosePerFraction": "2,0",
  "usedFractionCount": "15",
  "treatmentStart": "2023-01-10",
  "treatmentEnd": "2024-03-12",
  "recoveryModel": "paradis",
  "plannedFractions": "5"
}
"#;

#[test]
fn bed_command_converts_a_regimen() {
    let output = run_bedsim(&["bed", "-n", "30", "-d", "2", "--alpha-beta", "3"]);

    assert_success(&output);
    let stdout = stdout(&output);
    assert!(stdout.contains("Regimen: 30 x 2.00 Gy = 60.00 Gy"), "{stdout}");
    assert!(stdout.contains("BED: 100.00 Gy\n"), "{stdout}");
    assert!(stdout.contains("EQD2: 60.00 Gy"), "{stdout}");
    assert!(stdout.contains("Physical dose: 60.00 Gy"), "{stdout}");
}

#[test]
fn bed_command_uses_the_organ_table_and_emits_json() {
    let output = run_bedsim(&[
        "bed",
        "--total",
        "50",
        "--fractions",
        "25",
        "--organ",
        "spinal cord",
        "--json",
    ]);

    assert_success(&output);
    let parsed: Value = serde_json::from_str(&stdout(&output)).expect("stdout should be JSON");
    assert_eq!(parsed["bed"]["source"], "computed");
    assert_eq!(parsed["bed"]["value"], 100.0);
    assert_eq!(parsed["regimen"]["dosePerFraction"], 2.0);
}

#[test]
fn floor_flag_changes_bed_but_not_the_regimen() {
    let output = run_bedsim(&["bed", "-n", "20", "-d", "1", "--ab", "3", "--floor", "--json"]);

    assert_success(&output);
    let parsed: Value = serde_json::from_str(&stdout(&output)).expect("stdout should be JSON");
    assert_eq!(parsed["regimen"]["dosePerFraction"], 1.0);
    let bed = parsed["bed"]["value"].as_f64().expect("bed value");
    assert!((bed - 20.0 * 1.8 * (1.0 + 1.8 / 3.0)).abs() <= 1.0e-9);
}

#[test]
fn manual_bed_of_zero_is_used() {
    let output = run_bedsim(&["bed", "-n", "30", "-d", "2", "--ab", "3", "--manual-bed", "0"]);

    assert_success(&output);
    let stdout = stdout(&output);
    assert!(stdout.contains("BED: 0.00 Gy (manual)"), "{stdout}");
    assert!(stdout.contains("EQD2: 0.00 Gy"), "{stdout}");
}

#[test]
fn under_specified_regimen_is_a_computation_error() {
    let output = run_bedsim(&["bed", "--total", "60", "--ab", "3"]);

    assert_eq!(output.status.code(), Some(4));
    assert!(stdout(&output).is_empty());
    assert!(stderr(&output).contains("ERROR: [COMPUTE.BED_UNAVAILABLE]"));
}

#[test]
fn non_numeric_input_is_a_usage_error() {
    let output = run_bedsim(&["bed", "--total", "12 Gy", "-n", "6", "--ab", "3"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("invalid number '12 Gy' for --total"));
}

#[test]
fn solve_command_prints_the_maximum_dose() {
    let output = run_bedsim(&["solve", "--bed", "100", "--fractions", "10", "--alpha-beta", "2"]);

    assert_success(&output);
    let stdout = stdout(&output);
    assert!(stdout.contains("Max dose per fraction: 3.58 Gy"), "{stdout}");
    assert!(stdout.contains("Max total dose: 35.83 Gy over 10 fractions"), "{stdout}");
}

#[test]
fn solve_command_requires_a_ratio() {
    let output = run_bedsim(&["solve", "--bed", "100", "--fractions", "10"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("alpha/beta ratio is required"));
}

#[test]
fn months_command_counts_whole_months() {
    let output = run_bedsim(&["months", "--start", "2024-01-15", "--end", "2024-07-10"]);
    assert_success(&output);
    assert_eq!(stdout(&output), "5\n");

    let reversed = run_bedsim(&["months", "--start", "2024-07-10", "--end", "2024-01-15"]);
    assert_eq!(reversed.status.code(), Some(4));
    assert!(stderr(&reversed).contains("[COMPUTE.DATES_REVERSED]"));

    let invalid = run_bedsim(&["months", "--start", "2024-13-01", "--end", "2024-07-10"]);
    assert_eq!(invalid.status.code(), Some(2));
}

#[test]
fn forget_command_applies_models_and_overrides() {
    let noel = run_bedsim(&["forget", "--model", "noel", "--months", "24"]);
    assert_success(&noel);
    assert_eq!(stdout(&noel), "Forget: 5.00 % (noel model, 24 months)\n");

    let nieder = run_bedsim(&[
        "forget",
        "--model",
        "b",
        "--start",
        "2024-01-15",
        "--end",
        "2024-07-10",
    ]);
    assert_success(&nieder);
    assert!(stdout(&nieder).contains("Forget: 25.00 %"));

    let manual = run_bedsim(&["forget", "--manual", "0", "--months", "30"]);
    assert_success(&manual);
    assert_eq!(stdout(&manual), "Forget: 0.00 % (manual)\n");

    let unknown = run_bedsim(&["forget", "--model", "linear", "--months", "3"]);
    assert_eq!(unknown.status.code(), Some(2));
}

#[test]
fn config_file_selects_the_slow_recovery_rule() {
    let temp = TempDir::new().expect("tempdir should be created");
    let config_path = temp.path().join("bedsim.json");
    write_file(&config_path, r#"{ "slowRecoveryRule": "fromFirstYear" }"#);

    let output = run_bedsim(&[
        "--config",
        path_arg(&config_path),
        "forget",
        "--model",
        "d",
        "--months",
        "24",
    ]);
    assert_success(&output);
    assert!(stdout(&output).contains("Forget: 10.00 %"));
}

#[test]
fn broken_config_files_report_their_category() {
    let temp = TempDir::new().expect("tempdir should be created");
    let config_path = temp.path().join("bedsim.json");
    write_file(&config_path, "{ not json");

    let malformed = run_bedsim(&["--config", path_arg(&config_path), "organs"]);
    assert_eq!(malformed.status.code(), Some(2));
    assert!(stderr(&malformed).contains("[INPUT.CONFIG_PARSE]"));

    let missing_path = temp.path().join("missing.json");
    let missing = run_bedsim(&["--config", path_arg(&missing_path), "organs"]);
    assert_eq!(missing.status.code(), Some(3));
    assert!(stderr(&missing).contains("[IO.CONFIG_READ]"));
}

#[test]
fn remaining_command_credits_recovery() {
    let output = run_bedsim(&[
        "remaining",
        "--allowed-bed",
        "100",
        "--used-bed",
        "60",
        "--forget",
        "50",
        "--organ",
        "Spinal cord",
    ]);

    assert_success(&output);
    let stdout = stdout(&output);
    assert!(stdout.contains("Remaining BED: 70.00 Gy"), "{stdout}");
    assert!(stdout.contains("Remaining EQD2: 35.00 Gy"), "{stdout}");
}

#[test]
fn vx_command_rescales_the_constraint() {
    let output = run_bedsim(&[
        "vx",
        "--threshold",
        "20",
        "--initial-dose-per-fraction",
        "2",
        "--new-dose-per-fraction",
        "7,5",
        "--new-fractions",
        "8",
        "--ab",
        "3",
    ]);

    assert_success(&output);
    let stdout = stdout(&output);
    assert!(stdout.contains("Reference BED: 33.33 Gy"), "{stdout}");
    assert!(stdout.contains("New constraint: V9.52 Gy < 30.00 %"), "{stdout}");
    assert!(stdout.contains("Per fraction: V1.19 Gy/fraction < 30.00 %"), "{stdout}");
    assert!(stdout.contains("Exact dose per fraction over 8 fractions:"), "{stdout}");
}

#[test]
fn plan_saves_lists_reports_and_removes_entries() {
    let temp = TempDir::new().expect("tempdir should be created");
    let form_path = temp.path().join("form.json");
    let history_path = temp.path().join("history.json");
    let report_path = temp.path().join("out/report.txt");
    write_file(&form_path, SPINAL_CORD_FORM);

    let first = run_bedsim(&[
        "plan",
        "--input",
        path_arg(&form_path),
        "--save",
        "--history",
        path_arg(&history_path),
    ]);
    assert_success(&first);
    let first_stdout = stdout(&first);
    assert!(first_stdout.contains("Remaining BED: 70.00 Gy | EQD2: 35.00 Gy"), "{first_stdout}");
    assert!(first_stdout.contains("Max dose per fraction: 4.39 Gy over 5 fractions"), "{first_stdout}");
    assert!(first_stdout.contains("Saved as 'Organ 1'"), "{first_stdout}");

    let second = run_bedsim(&[
        "plan",
        "--input",
        path_arg(&form_path),
        "--save",
        "Brainstem",
        "--history",
        path_arg(&history_path),
    ]);
    assert_success(&second);

    let saved: Value =
        serde_json::from_str(&fs::read_to_string(&history_path).expect("history should exist"))
            .expect("history should be a JSON array");
    assert_eq!(saved.as_array().map(Vec::len), Some(2));
    assert_eq!(saved[0]["name"], "Organ 1");
    assert_eq!(saved[0]["remainingBed"], 70.0);
    assert_eq!(saved[0]["forgetSource"], "computed");

    let list = run_bedsim(&["history", "list", "--history", path_arg(&history_path)]);
    assert_success(&list);
    let lines = stdout(&list).lines().map(str::to_string).collect::<Vec<_>>();
    assert!(lines[0].starts_with("[1] Brainstem"), "{lines:?}");
    assert!(lines[1].starts_with("[0] Organ 1"), "{lines:?}");

    let report = run_bedsim(&[
        "history",
        "report",
        "--history",
        path_arg(&history_path),
        "--lines-per-page",
        "10",
        "--title",
        "Spine review",
    ]);
    assert_success(&report);
    let report_text = stdout(&report);
    assert!(report_text.starts_with("Spine review (page 1/2)\n\nBrainstem\n"), "{report_text}");
    assert!(report_text.contains("Spine review (page 2/2)\n\nOrgan 1\n"), "{report_text}");

    let written = run_bedsim(&[
        "history",
        "report",
        "--history",
        path_arg(&history_path),
        "--output",
        path_arg(&report_path),
    ]);
    assert_success(&written);
    let report_file = fs::read_to_string(&report_path).expect("report should be written");
    assert!(report_file.contains("Brainstem"));

    let removed = run_bedsim(&["history", "remove", "0", "--history", path_arg(&history_path)]);
    assert_success(&removed);
    assert_eq!(stdout(&removed), "Removed [0] Organ 1\n");

    let out_of_range = run_bedsim(&["history", "remove", "5", "--history", path_arg(&history_path)]);
    assert_eq!(out_of_range.status.code(), Some(2));
    assert!(stderr(&out_of_range).contains("[INPUT.HISTORY_INDEX]"));
}

#[test]
fn plan_fill_writes_derived_fields_back() {
    let temp = TempDir::new().expect("tempdir should be created");
    let form_path = temp.path().join("form.json");
    write_file(&form_path, SPINAL_CORD_FORM);

    let output = run_bedsim(&["plan", "--input", path_arg(&form_path), "--fill", "--json"]);
    assert_success(&output);

    let parsed: Value = serde_json::from_str(&stdout(&output)).expect("stdout should be JSON");
    assert_eq!(parsed["elapsedMonths"], 14);
    assert_eq!(parsed["remaining"]["bed"], 70.0);

    let form: Value =
        serde_json::from_str(&fs::read_to_string(&form_path).expect("form should be readable"))
            .expect("form should stay JSON");
    assert_eq!(form["dosePerFraction"], "2.00");
    assert_eq!(form["usedTotalDose"], "30.00");
}

#[test]
fn empty_history_is_reported_plainly() {
    let temp = TempDir::new().expect("tempdir should be created");
    let history_path = temp.path().join("history.json");

    let list = run_bedsim(&["history", "list", "--history", path_arg(&history_path)]);
    assert_success(&list);
    assert_eq!(stdout(&list), "No saved results.\n");
    assert!(!history_path.exists());
}

#[test]
fn reference_tables_are_listed() {
    let organs = run_bedsim(&["organs"]);
    assert_success(&organs);
    let organs_stdout = stdout(&organs);
    assert!(organs_stdout.lines().any(|line| line.starts_with("Lens") && line.ends_with("1.20")));

    let models = run_bedsim(&["models"]);
    assert_success(&models);
    let models_stdout = stdout(&models);
    assert!(models_stdout.lines().any(|line| line.starts_with("A  paradis") && line.ends_with("(default)")));
    assert!(models_stdout.contains("D  noel"));
}

#[test]
fn missing_subcommand_is_a_usage_error() {
    let output = run_bedsim(&[]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("[INPUT.CLI_USAGE]"));

    let help = run_bedsim(&["--help"]);
    assert_success(&help);
    assert!(stdout(&help).contains("Usage:"));
}

fn run_bedsim(args: &[&str]) -> Output {
    let binary_path = env!("CARGO_BIN_EXE_bedsim");
    let working_dir = TempDir::new().expect("tempdir should be created");

    Command::new(binary_path)
        .args(args)
        .current_dir(working_dir.path())
        .env_remove("BEDSIM_LOG")
        .output()
        .expect("bedsim should run")
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "command should succeed, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn path_arg(path: &Path) -> &str {
    path.to_str().expect("temp paths should be valid UTF-8")
}

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("parent dir should be created");
    }
    fs::write(path, content).expect("file should be written");
}

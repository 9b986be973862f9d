use super::CliError;
use anyhow::Context;
use bedsim_core::common::config::{EngineConfig, load_engine_config};
use bedsim_core::domain::{AlphaBeta, BedError};
use bedsim_core::numerics::{format_fixed, parse_fraction_count, parse_locale_number};
use serde::Serialize;
use std::path::Path;

pub(super) const DISPLAY_DECIMALS: usize = 2;
pub(super) const MISSING_VALUE: &str = "—";

pub(super) fn load_config(path: Option<&Path>) -> Result<EngineConfig, CliError> {
    match path {
        Some(path) => load_engine_config(path).map_err(|error| CliError::Compute(error.into())),
        None => Ok(EngineConfig::default()),
    }
}

/// Parse an optional numeric flag. Absent stays `None`; text that is present
/// but not a number is a usage error rather than a silent blank.
pub(super) fn parse_number_arg(flag: &str, value: Option<&str>) -> Result<Option<f64>, CliError> {
    match value {
        None => Ok(None),
        Some(text) if text.trim().is_empty() => Ok(None),
        Some(text) => parse_locale_number(text)
            .map(Some)
            .ok_or_else(|| CliError::Usage(format!("invalid number '{text}' for --{flag}"))),
    }
}

pub(super) fn parse_count_arg(flag: &str, value: Option<&str>) -> Result<Option<u32>, CliError> {
    match value {
        None => Ok(None),
        Some(text) if text.trim().is_empty() => Ok(None),
        Some(text) => parse_fraction_count(text).map(Some).ok_or_else(|| {
            CliError::Usage(format!(
                "invalid fraction count '{text}' for --{flag}; expected a whole number"
            ))
        }),
    }
}

pub(super) fn require<T>(flag: &str, value: Option<T>) -> Result<T, CliError> {
    value.ok_or_else(|| CliError::Usage(format!("missing value for --{flag}")))
}

/// α/β from `--alpha-beta`, or from the organ table when only `--organ` is
/// given.
pub(super) fn resolve_alpha_beta(
    alpha_beta: Option<&str>,
    organ: Option<&str>,
    config: &EngineConfig,
) -> Result<Option<f64>, CliError> {
    if let Some(value) = parse_number_arg("alpha-beta", alpha_beta)? {
        return Ok(Some(value));
    }

    let Some(organ) = organ else {
        return Ok(None);
    };
    config.alpha_beta_for_organ(organ).map(Some).ok_or_else(|| {
        CliError::Compute(BedError::input_validation(
            "INPUT.UNKNOWN_ORGAN",
            format!("no alpha/beta ratio known for organ '{organ}'; pass --alpha-beta"),
        ))
    })
}

pub(super) fn require_alpha_beta(value: Option<f64>) -> Result<AlphaBeta, CliError> {
    let value = value.ok_or_else(|| {
        CliError::Usage("an alpha/beta ratio is required: pass --alpha-beta or --organ".to_string())
    })?;
    AlphaBeta::new(value).ok_or_else(|| {
        CliError::Compute(BedError::input_validation(
            "INPUT.ALPHA_BETA",
            format!("alpha/beta must be a positive number, got {value}"),
        ))
    })
}

pub(super) fn unavailable(placeholder: &'static str, message: impl Into<String>) -> CliError {
    CliError::Compute(BedError::computation(placeholder, message))
}

pub(super) fn display(value: Option<f64>) -> String {
    let rendered = format_fixed(value, DISPLAY_DECIMALS);
    if rendered.is_empty() {
        MISSING_VALUE.to_string()
    } else {
        rendered
    }
}

pub(super) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<i32, CliError> {
    let json = serde_json::to_string_pretty(value).context("failed to encode JSON output")?;
    println!("{json}");
    Ok(0)
}

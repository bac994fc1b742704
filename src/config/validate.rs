// src/config/validate.rs

use std::time::Duration;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{CmdrunError, Result};
use crate::exec::env::parse_override;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = CmdrunError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        let timeout = parse_timeout(&raw)?;
        Ok(ConfigFile::new_unchecked(
            raw.command,
            timeout,
            raw.error_categories,
        ))
    }
}

/// Run all checks on a raw config without converting it.
pub fn validate_config(cfg: &RawConfigFile) -> Result<()> {
    validate_raw_config(cfg)
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_env(cfg)?;
    validate_shell(cfg)?;
    parse_timeout(cfg)?;
    validate_error_categories(cfg)?;
    Ok(())
}

fn validate_env(cfg: &RawConfigFile) -> Result<()> {
    for entry in cfg.command.env.iter() {
        if parse_override(entry).is_none() {
            return Err(CmdrunError::ConfigError(format!(
                "[command].env entry '{}' is not of the form KEY=VALUE",
                entry
            )));
        }
    }
    Ok(())
}

fn validate_shell(cfg: &RawConfigFile) -> Result<()> {
    if cfg.command.shell.trim().is_empty() {
        return Err(CmdrunError::ConfigError(
            "[command].shell must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn parse_timeout(cfg: &RawConfigFile) -> Result<Option<Duration>> {
    cfg.command
        .timeout
        .as_deref()
        .map(parse_duration)
        .transpose()
        .map_err(|e| CmdrunError::ConfigError(format!("[command].timeout: {}", e)))
}

fn validate_error_categories(cfg: &RawConfigFile) -> Result<()> {
    for (label, patterns) in cfg.error_categories.iter() {
        if label.trim().is_empty() {
            return Err(CmdrunError::ConfigError(
                "[error_categories] contains an empty category label".to_string(),
            ));
        }
        if patterns.iter().any(|p| p.is_empty()) {
            return Err(CmdrunError::ConfigError(format!(
                "[error_categories].{} contains an empty pattern",
                label
            )));
        }
    }
    Ok(())
}

/// Parse a simple duration string like `"3s"`, `"250ms"`, `"1m"`, `"2h"`.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| format!("duration '{}' is missing a unit suffix", s))?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    let secs_per_unit = match unit.as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        _ => {
            return Err(format!(
                "unsupported duration unit '{}'; expected ms, s, m, or h",
                unit
            ));
        }
    };
    value
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration '{}' is too large", s))
}

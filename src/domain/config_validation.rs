//! Configuration validation.
//!
//! Checks every section before a scan or backtest runs so that a bad value
//! fails fast with the offending section and key.

use crate::domain::error::ScanError;
use crate::domain::rule_parser;
use crate::domain::snapshot::MA_SLOW;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const PRESETS: &[&str] = &["standard", "legacy"];
pub const ENTRY_MODES: &[&str] = &["close", "breakout_level"];
pub const STOP_MODES: &[&str] = &["fixed", "swing_low"];
pub const TARGET_MODES: &[&str] = &["fixed", "risk_multiple"];

pub fn validate_scan_config(config: &dyn ConfigPort) -> Result<(), ScanError> {
    validate_data(config)?;
    validate_scan(config)?;
    validate_scoring(config)?;
    validate_signal(config)?;
    validate_backtest(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> ScanError {
    ScanError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

/// Read an enumerated key, lower-cased, falling back to `default` when absent.
pub fn read_choice(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: &str,
    allowed: &[&str],
) -> Result<String, ScanError> {
    let value = config
        .get_string(section, key)
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string());
    if allowed.contains(&value.as_str()) {
        Ok(value)
    } else {
        Err(invalid(
            section,
            key,
            format!("unknown value '{}', expected one of {}", value, allowed.join(", ")),
        ))
    }
}

pub fn read_date(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<NaiveDate>, ScanError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                invalid(
                    section,
                    key,
                    format!("invalid {} format, expected YYYY-MM-DD", key),
                )
            }),
        _ => Ok(None),
    }
}

fn validate_data(config: &dyn ConfigPort) -> Result<(), ScanError> {
    match config.get_string("data", "path") {
        Some(s) if !s.trim().is_empty() => {}
        _ => {
            return Err(ScanError::ConfigMissing {
                section: "data".to_string(),
                key: "path".to_string(),
            })
        }
    }

    let start = read_date(config, "data", "start_date")?;
    let end = read_date(config, "data", "end_date")?;
    if let (Some(start), Some(end)) = (start, end) {
        if start >= end {
            return Err(invalid(
                "data",
                "start_date",
                "start_date must be before end_date",
            ));
        }
    }
    Ok(())
}

fn validate_scan(config: &dyn ConfigPort) -> Result<(), ScanError> {
    let min_history = config.get_int("scan", "min_history", 60);
    if min_history <= MA_SLOW as i64 {
        return Err(invalid(
            "scan",
            "min_history",
            format!("min_history must be greater than {}", MA_SLOW),
        ));
    }

    let threshold = config.get_int("scan", "threshold", 60);
    if !(0..=100).contains(&threshold) {
        return Err(invalid(
            "scan",
            "threshold",
            "threshold must be between 0 and 100",
        ));
    }

    if config.get_int("scan", "workers", 1) < 1 {
        return Err(invalid("scan", "workers", "workers must be at least 1"));
    }

    read_date(config, "scan", "as_of")?;
    Ok(())
}

fn validate_scoring(config: &dyn ConfigPort) -> Result<(), ScanError> {
    read_choice(config, "scoring", "preset", "standard", PRESETS)?;
    if let Some(rules) = config
        .get_string("scoring", "rules")
        .filter(|s| !s.trim().is_empty())
    {
        rule_parser::parse(&rules)?;
    }
    Ok(())
}

fn validate_signal(config: &dyn ConfigPort) -> Result<(), ScanError> {
    read_choice(config, "signal", "entry", "close", ENTRY_MODES)?;
    read_choice(config, "signal", "stop", "fixed", STOP_MODES)?;
    read_choice(config, "signal", "target", "fixed", TARGET_MODES)?;

    let premium = config.get_double("signal", "entry_premium_pct", 1.0);
    if !(0.0..100.0).contains(&premium) {
        return Err(invalid(
            "signal",
            "entry_premium_pct",
            "entry_premium_pct must be between 0 and 100",
        ));
    }

    validate_pct(config, "signal", "stop_pct", 5.0)?;

    if config.get_int("signal", "swing_lookback", 5) < 1 {
        return Err(invalid(
            "signal",
            "swing_lookback",
            "swing_lookback must be at least 1",
        ));
    }

    if config.get_double("signal", "target_pct", 12.0) <= 0.0 {
        return Err(invalid("signal", "target_pct", "target_pct must be positive"));
    }
    if config.get_double("signal", "risk_multiple", 2.0) <= 0.0 {
        return Err(invalid(
            "signal",
            "risk_multiple",
            "risk_multiple must be positive",
        ));
    }
    if config.get_double("signal", "min_rr", 1.8) <= 0.0 {
        return Err(invalid("signal", "min_rr", "min_rr must be positive"));
    }
    Ok(())
}

fn validate_backtest(config: &dyn ConfigPort) -> Result<(), ScanError> {
    if config.get_int("backtest", "lookahead", 10) < 1 {
        return Err(invalid(
            "backtest",
            "lookahead",
            "lookahead must be at least 1",
        ));
    }
    validate_pct(config, "backtest", "stop_pct", 6.0)
}

fn validate_pct(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<(), ScanError> {
    let value = config.get_double(section, key, default);
    if value <= 0.0 || value >= 100.0 {
        return Err(invalid(
            section,
            key,
            format!("{} must be between 0 and 100", key),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    fn with_data(rest: &str) -> FileConfigAdapter {
        make_config(&format!("[data]\npath = ./data\n{}", rest))
    }

    #[test]
    fn minimal_config_passes() {
        assert!(validate_scan_config(&with_data("")).is_ok());
    }

    #[test]
    fn full_config_passes() {
        let config = make_config(
            r#"
[data]
path = ./data
start_date = 2023-01-01
end_date = 2024-12-31

[scan]
min_history = 60
threshold = 70
workers = 4
as_of = 2024-12-31

[scoring]
preset = legacy
rules = TREND:20, BREAKOUT:25, VOLUME_SURGE(2):15

[signal]
entry = breakout_level
stop = swing_low
target = risk_multiple
min_rr = 2.0

[backtest]
lookahead = 20
stop_pct = 6
"#,
        );
        assert!(validate_scan_config(&config).is_ok());
    }

    #[test]
    fn missing_data_path_fails() {
        let err = validate_scan_config(&make_config("[scan]\nthreshold = 60\n")).unwrap_err();
        assert!(matches!(err, ScanError::ConfigMissing { key, .. } if key == "path"));
    }

    #[test]
    fn start_after_end_fails() {
        let config = with_data("start_date = 2024-12-31\nend_date = 2024-01-01\n");
        let err = validate_scan_config(&config).unwrap_err();
        assert!(matches!(err, ScanError::ConfigInvalid { key, .. } if key == "start_date"));
    }

    #[test]
    fn bad_date_format_fails() {
        let config = with_data("[scan]\nas_of = 31/12/2024\n");
        let err = validate_scan_config(&config).unwrap_err();
        assert!(matches!(err, ScanError::ConfigInvalid { key, .. } if key == "as_of"));
    }

    #[test]
    fn min_history_must_cover_ma50() {
        let config = with_data("[scan]\nmin_history = 50\n");
        let err = validate_scan_config(&config).unwrap_err();
        assert!(matches!(err, ScanError::ConfigInvalid { key, .. } if key == "min_history"));
    }

    #[test]
    fn threshold_out_of_range_fails() {
        let config = with_data("[scan]\nthreshold = 101\n");
        let err = validate_scan_config(&config).unwrap_err();
        assert!(matches!(err, ScanError::ConfigInvalid { key, .. } if key == "threshold"));
    }

    #[test]
    fn zero_workers_fails() {
        let config = with_data("[scan]\nworkers = 0\n");
        let err = validate_scan_config(&config).unwrap_err();
        assert!(matches!(err, ScanError::ConfigInvalid { key, .. } if key == "workers"));
    }

    #[test]
    fn unknown_preset_fails() {
        let config = with_data("[scoring]\npreset = aggressive\n");
        let err = validate_scan_config(&config).unwrap_err();
        assert!(matches!(err, ScanError::ConfigInvalid { key, .. } if key == "preset"));
    }

    #[test]
    fn bad_rules_fail_with_parse_error() {
        let config = with_data("[scoring]\nrules = TREND:20, MOON:5\n");
        let err = validate_scan_config(&config).unwrap_err();
        assert!(matches!(err, ScanError::RuleParse(_)));
    }

    #[test]
    fn unknown_entry_mode_fails() {
        let config = with_data("[signal]\nentry = open\n");
        let err = validate_scan_config(&config).unwrap_err();
        assert!(matches!(err, ScanError::ConfigInvalid { key, .. } if key == "entry"));
    }

    #[test]
    fn stop_pct_out_of_range_fails() {
        for (ini, bad_section) in [
            ("[signal]\nstop_pct = 100\n", "signal"),
            ("[backtest]\nstop_pct = 0\n", "backtest"),
        ] {
            let err = validate_scan_config(&with_data(ini)).unwrap_err();
            assert!(matches!(
                err,
                ScanError::ConfigInvalid { section, key, .. }
                    if section == bad_section && key == "stop_pct"
            ));
        }
    }

    #[test]
    fn min_rr_must_be_positive() {
        let config = with_data("[signal]\nmin_rr = 0\n");
        let err = validate_scan_config(&config).unwrap_err();
        assert!(matches!(err, ScanError::ConfigInvalid { key, .. } if key == "min_rr"));
    }

    #[test]
    fn zero_lookahead_fails() {
        let config = with_data("[backtest]\nlookahead = 0\n");
        let err = validate_scan_config(&config).unwrap_err();
        assert!(matches!(err, ScanError::ConfigInvalid { key, .. } if key == "lookahead"));
    }

    #[test]
    fn read_choice_is_case_insensitive() {
        let config = make_config("[signal]\nstop = Swing_Low\n");
        assert_eq!(
            read_choice(&config, "signal", "stop", "fixed", STOP_MODES).unwrap(),
            "swing_low"
        );
        assert_eq!(
            read_choice(&config, "signal", "target", "fixed", TARGET_MODES).unwrap(),
            "fixed"
        );
    }
}

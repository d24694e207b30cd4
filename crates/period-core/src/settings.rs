use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use chrono::FixedOffset;

use crate::error::{PeriodError, Result};
use crate::models::{BoundaryEnergy, SegmenterOptions, TrailingSegment, DEFAULT_LABEL};
use crate::time_utils::parse_utc_offset;

/// Level names accepted by `--log-level` and the config file.
pub const LOG_LEVELS: [&str; 5] = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"];

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// File format of the period view handoff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Semicolon-separated, one period per row.
    #[default]
    Csv,
    /// Pretty-printed JSON array.
    Json,
}

/// Build operational periods from endpoint energy, operator and reason data
#[derive(Parser, Debug, Clone)]
#[command(
    name = "period-view",
    about = "Build operational periods from endpoint energy, operator and reason data",
    version
)]
pub struct Settings {
    /// Energy samples CSV (endpoint_id;event_time;kwh)
    #[arg(long, default_value = "energy.csv")]
    pub energy: PathBuf,

    /// Operator sessions CSV (endpoint_id;login_time;logout_time;operator_name)
    #[arg(long, default_value = "operators.csv")]
    pub operators: PathBuf,

    /// Declared mode periods CSV (endpoint_id;mode_start;mode_duration;label)
    #[arg(long, default_value = "periods.csv")]
    pub periods: PathBuf,

    /// Reason events CSV (endpoint_id;event_time;reason)
    #[arg(long, default_value = "reasons.csv")]
    pub reasons: PathBuf,

    /// Where to write the period view
    #[arg(long, default_value = "period_view.csv")]
    pub output: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    pub format: OutputFormat,

    /// UTC offset applied to timestamps that carry none
    #[arg(long, default_value = "+00:00", allow_hyphen_values = true)]
    pub utc_offset: String,

    /// Period that receives a boundary sample's kWh
    #[arg(long, value_enum, default_value_t = BoundaryEnergy::Deferred)]
    pub boundary_energy: BoundaryEnergy,

    /// Handling of samples after the last reason event
    #[arg(long, value_enum, default_value_t = TrailingSegment::Drop)]
    pub trailing: TrailingSegment,

    /// Label periods from the declared mode periods
    #[arg(long)]
    pub resolve_labels: bool,

    /// Label used when no mode period matches
    #[arg(long, default_value = DEFAULT_LABEL)]
    pub default_label: String,

    /// JSON file with default values for any of the options above
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = LOG_LEVELS)]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

// ── ConfigFile ────────────────────────────────────────────────────────────────

/// Optional JSON run configuration, e.g. `period-view.json`.
///
/// Every field is optional; a value applies only when the matching flag was
/// not given on the command line.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operators: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub periods: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasons: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<OutputFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utc_offset: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boundary_energy: Option<BoundaryEnergy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trailing: Option<TrailingSegment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolve_labels: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl ConfigFile {
    /// Read a config file. A missing or malformed file is an error: the
    /// caller asked for it explicitly.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| PeriodError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse the process arguments and merge the `--config` file, if any.
    pub fn load() -> Result<Self> {
        Self::load_from_args(std::env::args_os().collect())
    }

    /// Same as [`Settings::load`] with an explicit argument list.
    pub fn load_from_args(args: Vec<std::ffi::OsString>) -> Result<Self> {
        // Raw matches tell us which values came from the command line.
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if let Some(path) = settings.config.clone() {
            let file = ConfigFile::load_from(&path)?;
            settings.merge_config(file, &matches)?;
        }

        // --debug overrides log level.
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }

        // Fail before any input is read.
        settings.timestamp_offset()?;

        Ok(settings)
    }

    /// Apply config-file values for every option not set on the command line.
    fn merge_config(&mut self, file: ConfigFile, matches: &clap::ArgMatches) -> Result<()> {
        fn take<T>(slot: &mut T, value: Option<T>, matches: &clap::ArgMatches, name: &str) {
            if !is_arg_explicitly_set(matches, name) {
                if let Some(v) = value {
                    *slot = v;
                }
            }
        }

        take(&mut self.energy, file.energy, matches, "energy");
        take(&mut self.operators, file.operators, matches, "operators");
        take(&mut self.periods, file.periods, matches, "periods");
        take(&mut self.reasons, file.reasons, matches, "reasons");
        take(&mut self.output, file.output, matches, "output");
        take(&mut self.format, file.format, matches, "format");
        // NOTE: clap stores the arg id using the field name (underscores).
        take(&mut self.utc_offset, file.utc_offset, matches, "utc_offset");
        take(&mut self.boundary_energy, file.boundary_energy, matches, "boundary_energy");
        take(&mut self.trailing, file.trailing, matches, "trailing");
        take(&mut self.resolve_labels, file.resolve_labels, matches, "resolve_labels");
        take(&mut self.default_label, file.default_label, matches, "default_label");
        let log_level = file.log_level.map(|level| validate_log_level(&level)).transpose()?;
        take(&mut self.log_level, log_level, matches, "log_level");
        if !is_arg_explicitly_set(matches, "log_file") && self.log_file.is_none() {
            self.log_file = file.log_file;
        }
        Ok(())
    }

    /// The fixed offset for naive input timestamps.
    pub fn timestamp_offset(&self) -> Result<FixedOffset> {
        parse_utc_offset(&self.utc_offset)
    }

    /// Segmenter options selected by these settings.
    pub fn segmenter_options(&self) -> SegmenterOptions {
        SegmenterOptions {
            boundary_energy: self.boundary_energy,
            trailing: self.trailing,
            resolve_labels: self.resolve_labels,
            default_label: self.default_label.clone(),
        }
    }
}

/// Canonical upper-case level name, or a config error for unknown levels.
fn validate_log_level(level: &str) -> Result<String> {
    let upper = level.trim().to_uppercase();
    if LOG_LEVELS.contains(&upper.as_str()) {
        Ok(upper)
    } else {
        Err(PeriodError::Config(format!(
            "invalid log_level \"{}\" (expected one of {})",
            level,
            LOG_LEVELS.join(", ")
        )))
    }
}

// ── Helper: check if an arg was explicitly set on the command line ─────────────

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args(list: &[&str]) -> Vec<std::ffi::OsString> {
        std::iter::once("period-view")
            .chain(list.iter().copied())
            .map(Into::into)
            .collect()
    }

    fn write_config(tmp: &TempDir, config: &ConfigFile) -> PathBuf {
        let path = tmp.path().join("period-view.json");
        let json = serde_json::to_string_pretty(config).expect("serialise config");
        std::fs::write(&path, json).expect("write config");
        path
    }

    #[test]
    fn test_settings_default_values() {
        let settings = Settings::parse_from(["period-view"]);

        assert_eq!(settings.energy, PathBuf::from("energy.csv"));
        assert_eq!(settings.operators, PathBuf::from("operators.csv"));
        assert_eq!(settings.periods, PathBuf::from("periods.csv"));
        assert_eq!(settings.reasons, PathBuf::from("reasons.csv"));
        assert_eq!(settings.output, PathBuf::from("period_view.csv"));
        assert_eq!(settings.format, OutputFormat::Csv);
        assert_eq!(settings.utc_offset, "+00:00");
        assert_eq!(settings.boundary_energy, BoundaryEnergy::Deferred);
        assert_eq!(settings.trailing, TrailingSegment::Drop);
        assert!(!settings.resolve_labels);
        assert_eq!(settings.default_label, DEFAULT_LABEL);
        assert!(settings.config.is_none());
        assert_eq!(settings.log_level, "INFO");
        assert!(settings.log_file.is_none());
        assert!(!settings.debug);
    }

    #[test]
    fn test_default_settings_give_legacy_options() {
        let settings = Settings::parse_from(["period-view"]);
        assert_eq!(settings.segmenter_options(), SegmenterOptions::default());
    }

    #[test]
    fn test_cli_option_values() {
        let settings = Settings::parse_from([
            "period-view",
            "--boundary-energy",
            "closing",
            "--trailing",
            "close",
            "--format",
            "json",
            "--resolve-labels",
            "--utc-offset",
            "-05:00",
        ]);
        assert_eq!(settings.boundary_energy, BoundaryEnergy::Closing);
        assert_eq!(settings.trailing, TrailingSegment::CloseAtLastSample);
        assert_eq!(settings.format, OutputFormat::Json);
        assert!(settings.resolve_labels);
        assert_eq!(
            settings.timestamp_offset().unwrap(),
            FixedOffset::west_opt(5 * 3600).unwrap()
        );
    }

    #[test]
    fn test_debug_overrides_log_level() {
        let settings = Settings::load_from_args(args(&["--debug"])).unwrap();
        assert_eq!(settings.log_level, "DEBUG");
    }

    #[test]
    fn test_invalid_offset_is_config_error() {
        let err = Settings::load_from_args(args(&["--utc-offset", "Moscow"])).unwrap_err();
        assert!(matches!(err, PeriodError::Config(_)));
    }

    #[test]
    fn test_config_file_supplies_defaults() {
        let tmp = TempDir::new().expect("tempdir");
        let path = write_config(
            &tmp,
            &ConfigFile {
                energy: Some(PathBuf::from("/data/energy.csv")),
                trailing: Some(TrailingSegment::CloseAtLastSample),
                utc_offset: Some("+03:00".to_string()),
                resolve_labels: Some(true),
                ..Default::default()
            },
        );

        let settings =
            Settings::load_from_args(args(&["--config", path.to_str().unwrap()])).unwrap();
        assert_eq!(settings.energy, PathBuf::from("/data/energy.csv"));
        assert_eq!(settings.trailing, TrailingSegment::CloseAtLastSample);
        assert_eq!(settings.utc_offset, "+03:00");
        assert!(settings.resolve_labels);
        // Untouched fields keep their defaults.
        assert_eq!(settings.reasons, PathBuf::from("reasons.csv"));
    }

    #[test]
    fn test_cli_overrides_config_file() {
        let tmp = TempDir::new().expect("tempdir");
        let path = write_config(
            &tmp,
            &ConfigFile {
                boundary_energy: Some(BoundaryEnergy::Closing),
                output: Some(PathBuf::from("from-config.csv")),
                ..Default::default()
            },
        );

        let settings = Settings::load_from_args(args(&[
            "--config",
            path.to_str().unwrap(),
            "--boundary-energy",
            "deferred",
        ]))
        .unwrap();
        assert_eq!(settings.boundary_energy, BoundaryEnergy::Deferred);
        assert_eq!(settings.output, PathBuf::from("from-config.csv"));
    }

    #[test]
    fn test_missing_config_file_is_error() {
        let tmp = TempDir::new().expect("tempdir");
        let missing = tmp.path().join("absent.json");
        let err = Settings::load_from_args(args(&["--config", missing.to_str().unwrap()]))
            .unwrap_err();
        assert!(matches!(err, PeriodError::FileRead { .. }));
    }

    #[test]
    fn test_config_log_level_is_validated() {
        let tmp = TempDir::new().expect("tempdir");
        let path = write_config(
            &tmp,
            &ConfigFile {
                log_level: Some("verbose".to_string()),
                ..Default::default()
            },
        );
        let err = Settings::load_from_args(args(&["--config", path.to_str().unwrap()]))
            .unwrap_err();
        match err {
            PeriodError::Config(msg) => assert!(msg.contains("verbose")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_config_log_level_is_normalised() {
        let tmp = TempDir::new().expect("tempdir");
        let path = write_config(
            &tmp,
            &ConfigFile {
                log_level: Some("warning".to_string()),
                ..Default::default()
            },
        );
        let settings =
            Settings::load_from_args(args(&["--config", path.to_str().unwrap()])).unwrap();
        assert_eq!(settings.log_level, "WARNING");
    }

    #[test]
    fn test_unknown_config_key_is_error() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("bad.json");
        std::fs::write(&path, r#"{ "plan": "pro" }"#).unwrap();
        let err = ConfigFile::load_from(&path).unwrap_err();
        assert!(matches!(err, PeriodError::Json(_)));
    }

    #[test]
    fn test_config_file_serialises_lowercase_enums() {
        let config = ConfigFile {
            format: Some(OutputFormat::Json),
            trailing: Some(TrailingSegment::CloseAtLastSample),
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains(r#""format":"json""#));
        assert!(json.contains(r#""trailing":"close""#));
        assert!(!json.contains("energy"));
    }
}

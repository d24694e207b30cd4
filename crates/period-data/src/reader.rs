//! Semicolon-separated CSV loading for the four input datasets.
//!
//! Each dataset has a header row naming the record fields; extra columns
//! (such as a leading dataframe index) are ignored. Any malformed cell
//! aborts the load: there is no partial-success mode.

use std::io::Read;
use std::path::Path;

use period_core::error::{PeriodError, Result};
use period_core::models::{
    add_minutes, EnergySample, ModePeriod, OperatorSession, ReasonEvent, Timestamp,
};
use period_core::time_utils::TimestampParser;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

// ── Raw rows ──────────────────────────────────────────────────────────────────

/// Energy CSV row before type conversion.
#[derive(Debug, Clone, Deserialize)]
pub struct EnergyRow {
    pub endpoint_id: String,
    pub event_time: String,
    pub kwh: String,
}

/// Operator CSV row before type conversion.
#[derive(Debug, Clone, Deserialize)]
pub struct OperatorRow {
    pub endpoint_id: String,
    pub login_time: String,
    #[serde(default)]
    pub logout_time: String,
    pub operator_name: String,
}

/// Mode period CSV row before type conversion.
#[derive(Debug, Clone, Deserialize)]
pub struct PeriodRow {
    pub endpoint_id: String,
    pub mode_start: String,
    pub mode_duration: String,
    #[serde(default)]
    pub label: String,
}

/// Reason CSV row before type conversion.
#[derive(Debug, Clone, Deserialize)]
pub struct ReasonRow {
    pub endpoint_id: String,
    pub event_time: String,
    #[serde(default)]
    pub reason: String,
}

/// A single cell that failed conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct CellError {
    pub column: &'static str,
    pub value: String,
    pub reason: String,
}

impl CellError {
    fn new(column: &'static str, value: &str, reason: impl Into<String>) -> Self {
        Self {
            column,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

type CellResult<T> = std::result::Result<T, CellError>;

// ── Row conversion ────────────────────────────────────────────────────────────

/// Build an [`EnergySample`] from a CSV row.
pub fn energy_sample_from_row(
    row: &EnergyRow,
    parser: &TimestampParser,
) -> CellResult<EnergySample> {
    let kwh = parse_decimal("kwh", &row.kwh)?;
    if kwh < 0.0 {
        return Err(CellError::new("kwh", &row.kwh, "energy must not be negative"));
    }
    Ok(EnergySample {
        endpoint_id: parse_endpoint(&row.endpoint_id)?,
        event_time: parse_time(parser, "event_time", &row.event_time)?,
        kwh,
    })
}

/// Build an [`OperatorSession`] from a CSV row. A blank logout means the
/// operator is still logged in.
pub fn operator_session_from_row(
    row: &OperatorRow,
    parser: &TimestampParser,
) -> CellResult<OperatorSession> {
    let login_time = parse_time(parser, "login_time", &row.login_time)?;
    let logout_time = parser
        .parse_optional(&row.logout_time)
        .map_err(|e| CellError::new("logout_time", &row.logout_time, e.to_string()))?;
    if let Some(logout) = logout_time {
        if logout < login_time {
            return Err(CellError::new(
                "logout_time",
                &row.logout_time,
                "logout precedes login",
            ));
        }
    }
    Ok(OperatorSession {
        endpoint_id: parse_endpoint(&row.endpoint_id)?,
        login_time,
        logout_time,
        operator_name: row.operator_name.clone(),
    })
}

/// Build a [`ModePeriod`] from a CSV row.
pub fn mode_period_from_row(row: &PeriodRow, parser: &TimestampParser) -> CellResult<ModePeriod> {
    let minutes = parse_decimal("mode_duration", &row.mode_duration)?;
    if minutes < 0.0 || minutes.fract() != 0.0 {
        return Err(CellError::new(
            "mode_duration",
            &row.mode_duration,
            "expected a whole, non-negative number of minutes",
        ));
    }
    let mode_start = parse_time(parser, "mode_start", &row.mode_start)?;
    let mode_duration = minutes as i64;
    if add_minutes(mode_start, mode_duration).is_none() {
        return Err(CellError::new(
            "mode_duration",
            &row.mode_duration,
            "duration out of range",
        ));
    }
    Ok(ModePeriod {
        endpoint_id: parse_endpoint(&row.endpoint_id)?,
        mode_start,
        mode_duration,
        label: row.label.clone(),
    })
}

/// Build a [`ReasonEvent`] from a CSV row.
pub fn reason_event_from_row(
    row: &ReasonRow,
    parser: &TimestampParser,
) -> CellResult<ReasonEvent> {
    Ok(ReasonEvent {
        endpoint_id: parse_endpoint(&row.endpoint_id)?,
        event_time: parse_time(parser, "event_time", &row.event_time)?,
        reason: row.reason.clone(),
    })
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load energy samples from `path`, in file order.
pub fn load_energy_samples(path: &Path, parser: &TimestampParser) -> Result<Vec<EnergySample>> {
    energy_samples_from_reader(open(path)?, &path.display().to_string(), parser)
}

/// Load operator sessions from `path`, in file order.
pub fn load_operator_sessions(
    path: &Path,
    parser: &TimestampParser,
) -> Result<Vec<OperatorSession>> {
    operator_sessions_from_reader(open(path)?, &path.display().to_string(), parser)
}

/// Load declared mode periods from `path`, in file order.
pub fn load_mode_periods(path: &Path, parser: &TimestampParser) -> Result<Vec<ModePeriod>> {
    mode_periods_from_reader(open(path)?, &path.display().to_string(), parser)
}

/// Load reason events from `path`, in file order.
pub fn load_reason_events(path: &Path, parser: &TimestampParser) -> Result<Vec<ReasonEvent>> {
    reason_events_from_reader(open(path)?, &path.display().to_string(), parser)
}

/// Parse energy samples from any reader; `source` names it in errors.
pub fn energy_samples_from_reader<R: Read>(
    reader: R,
    source: &str,
    parser: &TimestampParser,
) -> Result<Vec<EnergySample>> {
    read_records(reader, source, |row: &EnergyRow| energy_sample_from_row(row, parser))
}

pub fn operator_sessions_from_reader<R: Read>(
    reader: R,
    source: &str,
    parser: &TimestampParser,
) -> Result<Vec<OperatorSession>> {
    read_records(reader, source, |row: &OperatorRow| {
        operator_session_from_row(row, parser)
    })
}

pub fn mode_periods_from_reader<R: Read>(
    reader: R,
    source: &str,
    parser: &TimestampParser,
) -> Result<Vec<ModePeriod>> {
    read_records(reader, source, |row: &PeriodRow| mode_period_from_row(row, parser))
}

pub fn reason_events_from_reader<R: Read>(
    reader: R,
    source: &str,
    parser: &TimestampParser,
) -> Result<Vec<ReasonEvent>> {
    read_records(reader, source, |row: &ReasonRow| reason_event_from_row(row, parser))
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn open(path: &Path) -> Result<std::fs::File> {
    std::fs::File::open(path).map_err(|source| PeriodError::FileRead {
        path: path.to_path_buf(),
        source,
    })
}

/// Deserialize every data row into `Row` and convert it, stopping at the
/// first failure.
fn read_records<R, Row, T, F>(reader: R, source: &str, convert: F) -> Result<Vec<T>>
where
    R: Read,
    Row: DeserializeOwned,
    F: Fn(&Row) -> CellResult<T>,
{
    let csv_error = |e: csv::Error| PeriodError::Csv {
        path: source.into(),
        source: e,
    };

    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = csv_reader.headers().map_err(csv_error)?.clone();

    let mut records = Vec::new();
    for result in csv_reader.records() {
        let record = result.map_err(csv_error)?;
        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }
        let line = record.position().map_or(0, |p| p.line());
        let row: Row = record.deserialize(Some(&headers)).map_err(csv_error)?;
        let value = convert(&row).map_err(|cell| PeriodError::InvalidValue {
            file: source.to_string(),
            line,
            column: cell.column.to_string(),
            value: cell.value,
            reason: cell.reason,
        })?;
        records.push(value);
    }

    debug!("Loaded {} records from {}", records.len(), source);
    Ok(records)
}

fn parse_endpoint(value: &str) -> CellResult<i64> {
    value
        .parse::<i64>()
        .map_err(|_| CellError::new("endpoint_id", value, "expected an integer id"))
}

fn parse_time(
    parser: &TimestampParser,
    column: &'static str,
    value: &str,
) -> CellResult<Timestamp> {
    parser
        .parse(value)
        .map_err(|e| CellError::new(column, value, e.to_string()))
}

/// Parse a finite decimal, accepting a comma as the decimal separator.
fn parse_decimal(column: &'static str, value: &str) -> CellResult<f64> {
    let parsed = value
        .parse::<f64>()
        .or_else(|_| value.replacen(',', ".", 1).parse::<f64>())
        .map_err(|_| CellError::new(column, value, "not a number"))?;
    if !parsed.is_finite() {
        return Err(CellError::new(column, value, "not a finite number"));
    }
    Ok(parsed)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

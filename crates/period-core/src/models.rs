use chrono::{DateTime, FixedOffset, TimeDelta};
use serde::{Deserialize, Serialize};

/// Every timestamp in the batch shares one fixed UTC offset.
pub type Timestamp = DateTime<FixedOffset>;

/// Label stored on a period when no mode period describes it ("no data").
pub const DEFAULT_LABEL: &str = "Нет данных";

/// Records that belong to a single monitored endpoint.
pub trait EndpointRecord {
    fn endpoint_id(&self) -> i64;
}

// ── Input records ─────────────────────────────────────────────────────────────

/// One meter reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergySample {
    /// Endpoint the meter belongs to.
    pub endpoint_id: i64,
    /// When the reading was taken.
    pub event_time: Timestamp,
    /// Energy consumed since the previous reading, never negative.
    pub kwh: f64,
}

/// A single operator's presence on an endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorSession {
    pub endpoint_id: i64,
    pub login_time: Timestamp,
    /// `None` while the operator is still logged in.
    pub logout_time: Option<Timestamp>,
    pub operator_name: String,
}

impl OperatorSession {
    /// Whether the operator was present for the whole `[start, end]` interval.
    ///
    /// An open session covers everything after its login.
    pub fn covers(&self, start: Timestamp, end: Timestamp) -> bool {
        self.login_time <= start && self.logout_time.map_or(true, |logout| logout >= end)
    }
}

/// A declared operating-mode interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModePeriod {
    pub endpoint_id: i64,
    pub mode_start: Timestamp,
    /// Length of the mode in whole minutes.
    pub mode_duration: i64,
    pub label: String,
}

impl ModePeriod {
    /// Inclusive end of the declared interval.
    ///
    /// `None` only when the end is not representable; the loader rejects
    /// such rows.
    pub fn mode_end(&self) -> Option<Timestamp> {
        add_minutes(self.mode_start, self.mode_duration)
    }

    /// Whether `ts` falls within `[mode_start, mode_end]`.
    pub fn contains(&self, ts: Timestamp) -> bool {
        self.mode_start <= ts && self.mode_end().map_or(true, |end| ts <= end)
    }
}

/// A marker that forces a period boundary at its timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasonEvent {
    pub endpoint_id: i64,
    pub event_time: Timestamp,
    /// Free-text explanation entered for the event.
    pub reason: String,
}

// ── Derived record ────────────────────────────────────────────────────────────

/// One operational period between two consecutive boundaries.
///
/// Built only by the segmenter and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodView {
    pub endpoint_id: i64,
    /// Inclusive start of the period.
    pub mode_start: Timestamp,
    /// Exclusive end of the period (the closing boundary).
    pub mode_end: Timestamp,
    /// Whole minutes between `mode_start` and `mode_end`, rounded down.
    pub mode_duration: i64,
    pub label: String,
    /// Reason text of the event that closed the period; empty when the
    /// period was closed at the last sample instead.
    pub reason: String,
    /// Operator on duty for the whole period; empty when nobody was.
    pub operator_name: String,
    /// Energy accumulated over the period's samples.
    pub energy_sum: f64,
}

impl PeriodView {
    /// Whether an operator session covered the period.
    pub fn has_operator(&self) -> bool {
        !self.operator_name.is_empty()
    }
}

/// `start` shifted by `minutes`, or `None` if the result overflows.
pub fn add_minutes(start: Timestamp, minutes: i64) -> Option<Timestamp> {
    TimeDelta::try_minutes(minutes).and_then(|delta| start.checked_add_signed(delta))
}

/// Whole minutes from `start` to `end`, rounded down.
pub fn duration_minutes(start: Timestamp, end: Timestamp) -> i64 {
    (end - start).num_seconds().div_euclid(60)
}

impl EndpointRecord for EnergySample {
    fn endpoint_id(&self) -> i64 {
        self.endpoint_id
    }
}

impl EndpointRecord for OperatorSession {
    fn endpoint_id(&self) -> i64 {
        self.endpoint_id
    }
}

impl EndpointRecord for ModePeriod {
    fn endpoint_id(&self) -> i64 {
        self.endpoint_id
    }
}

impl EndpointRecord for ReasonEvent {
    fn endpoint_id(&self) -> i64 {
        self.endpoint_id
    }
}

impl EndpointRecord for PeriodView {
    fn endpoint_id(&self) -> i64 {
        self.endpoint_id
    }
}

// ── Segmenter options ─────────────────────────────────────────────────────────

/// Which period receives the kWh of a sample that sits on a boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryEnergy {
    /// The boundary sample opens the next period and its kWh goes there.
    #[default]
    Deferred,
    /// The boundary sample's kWh is counted in the period it closes.
    Closing,
}

/// What happens to samples after the last boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TrailingSegment {
    /// Discard them; no period is emitted.
    #[default]
    Drop,
    /// Emit a final period ending at the last sample's timestamp.
    #[serde(rename = "close")]
    #[value(name = "close")]
    CloseAtLastSample,
}

/// Tunables for the period segmenter. `Default` reproduces the legacy output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmenterOptions {
    pub boundary_energy: BoundaryEnergy,
    pub trailing: TrailingSegment,
    /// Look labels up in the declared mode periods.
    pub resolve_labels: bool,
    /// Label used when lookup is disabled or finds nothing.
    pub default_label: String,
}

impl Default for SegmenterOptions {
    fn default() -> Self {
        Self {
            boundary_energy: BoundaryEnergy::Deferred,
            trailing: TrailingSegment::Drop,
            resolve_labels: false,
            default_label: DEFAULT_LABEL.to_string(),
        }
    }
}

//! Batch pipeline: load → segment → write.
//!
//! The whole run is atomic: any load failure aborts before the output file
//! is touched.

use std::path::PathBuf;
use std::time::Instant;

use chrono::Utc;
use period_core::error::Result;
use period_core::models::{
    EnergySample, ModePeriod, OperatorSession, PeriodView, ReasonEvent, SegmenterOptions,
};
use period_core::settings::{OutputFormat, Settings};
use period_core::time_utils::TimestampParser;
use tracing::info;

use crate::aggregator::PeriodTotals;
use crate::reader::{
    load_energy_samples, load_mode_periods, load_operator_sessions, load_reason_events,
};
use crate::segmenter::segment_by_endpoint;
use crate::writer::write_period_views;

// ── Public types ──────────────────────────────────────────────────────────────

/// Everything one batch run needs.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub energy_path: PathBuf,
    pub operators_path: PathBuf,
    pub periods_path: PathBuf,
    pub reasons_path: PathBuf,
    /// `None` skips writing; the caller only wants the views.
    pub output_path: Option<PathBuf>,
    pub format: OutputFormat,
    pub parser: TimestampParser,
    pub options: SegmenterOptions,
}

impl BatchConfig {
    /// Build a config from resolved CLI settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self {
            energy_path: settings.energy.clone(),
            operators_path: settings.operators.clone(),
            periods_path: settings.periods.clone(),
            reasons_path: settings.reasons.clone(),
            output_path: Some(settings.output.clone()),
            format: settings.format,
            parser: TimestampParser::new(settings.timestamp_offset()?),
            options: settings.segmenter_options(),
        })
    }
}

/// The four loaded input collections.
#[derive(Debug, Clone, Default)]
pub struct InputSet {
    pub energy: Vec<EnergySample>,
    pub operators: Vec<OperatorSession>,
    pub periods: Vec<ModePeriod>,
    pub reasons: Vec<ReasonEvent>,
}

impl InputSet {
    /// Load all four datasets, stopping at the first failure.
    pub fn load(config: &BatchConfig) -> Result<Self> {
        let reasons = load_reason_events(&config.reasons_path, &config.parser)?;
        info!("Loaded {} reason events", reasons.len());
        let operators = load_operator_sessions(&config.operators_path, &config.parser)?;
        info!("Loaded {} operator sessions", operators.len());
        let periods = load_mode_periods(&config.periods_path, &config.parser)?;
        info!("Loaded {} mode periods", periods.len());
        let energy = load_energy_samples(&config.energy_path, &config.parser)?;
        info!("Loaded {} energy samples", energy.len());

        Ok(Self {
            energy,
            operators,
            periods,
            reasons,
        })
    }
}

/// Metadata produced alongside the period view.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BatchMetadata {
    /// RFC 3339 timestamp when this result was generated.
    pub generated_at: String,
    pub energy_rows: usize,
    pub operator_rows: usize,
    pub period_rows: usize,
    pub reason_rows: usize,
    pub periods_created: usize,
    /// Wall-clock seconds spent reading the CSV files.
    pub load_time_seconds: f64,
    /// Wall-clock seconds spent segmenting.
    pub segment_time_seconds: f64,
}

/// The complete output of [`run_batch`].
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub views: Vec<PeriodView>,
    pub totals: PeriodTotals,
    pub metadata: BatchMetadata,
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Run the full batch.
///
/// 1. Load the four datasets (fail fast).
/// 2. Segment each endpoint's timeline.
/// 3. Write the period view, if an output path is set.
/// 4. Return the views with totals and run metadata.
pub fn run_batch(config: &BatchConfig) -> Result<BatchResult> {
    let load_start = Instant::now();
    let inputs = InputSet::load(config)?;
    let load_time = load_start.elapsed().as_secs_f64();

    let segment_start = Instant::now();
    let views = segment_inputs(&inputs, &config.options);
    let segment_time = segment_start.elapsed().as_secs_f64();
    info!("Built {} periods", views.len());

    if let Some(path) = &config.output_path {
        write_period_views(path, &views, config.format)?;
        info!("Wrote {} periods to {}", views.len(), path.display());
    }

    let metadata = BatchMetadata {
        generated_at: Utc::now().to_rfc3339(),
        energy_rows: inputs.energy.len(),
        operator_rows: inputs.operators.len(),
        period_rows: inputs.periods.len(),
        reason_rows: inputs.reasons.len(),
        periods_created: views.len(),
        load_time_seconds: load_time,
        segment_time_seconds: segment_time,
    };

    Ok(BatchResult {
        totals: PeriodTotals::from_views(&views),
        views,
        metadata,
    })
}

/// Segment already-loaded inputs.
pub fn segment_inputs(inputs: &InputSet, options: &SegmenterOptions) -> Vec<PeriodView> {
    segment_by_endpoint(
        &inputs.energy,
        &inputs.reasons,
        &inputs.operators,
        &inputs.periods,
        options,
    )
}

//! Period segmenter.
//!
//! Splits an endpoint's energy timeline at every sample whose timestamp
//! matches a reason event and turns each resulting segment into a
//! [`PeriodView`] carrying its duration, operator on duty and energy total.

use std::collections::{BTreeMap, HashMap};

use period_core::models::{
    duration_minutes, BoundaryEnergy, EndpointRecord, EnergySample, ModePeriod, OperatorSession,
    PeriodView, ReasonEvent, SegmenterOptions, Timestamp, TrailingSegment,
};
use tracing::debug;

use crate::labels::ModeLabeler;
use crate::operators::OperatorIndex;

// ── Entry points ──────────────────────────────────────────────────────────────

/// Segment one endpoint's samples with the legacy options: boundary kWh goes
/// to the next period, the trailing segment is dropped, labels are not looked up.
pub fn segment(
    energy_samples: &[EnergySample],
    reason_events: &[ReasonEvent],
    operator_sessions: &[OperatorSession],
) -> Vec<PeriodView> {
    PeriodSegmenter::default().segment(energy_samples, reason_events, operator_sessions, &[])
}

/// Segment every endpoint independently.
///
/// Reasons, sessions and mode periods only affect the endpoint they belong
/// to. Output is ordered by endpoint id, then by period start.
pub fn segment_by_endpoint(
    energy_samples: &[EnergySample],
    reason_events: &[ReasonEvent],
    operator_sessions: &[OperatorSession],
    mode_periods: &[ModePeriod],
    options: &SegmenterOptions,
) -> Vec<PeriodView> {
    let segmenter = PeriodSegmenter::new(options.clone());
    let samples_by_endpoint = group_by_endpoint(energy_samples);
    let mut reasons_by_endpoint = group_by_endpoint(reason_events);
    let mut sessions_by_endpoint = group_by_endpoint(operator_sessions);
    let mut periods_by_endpoint = group_by_endpoint(mode_periods);

    let mut views = Vec::new();
    for (endpoint_id, samples) in samples_by_endpoint {
        let reasons = reasons_by_endpoint.remove(&endpoint_id).unwrap_or_default();
        let sessions = sessions_by_endpoint.remove(&endpoint_id).unwrap_or_default();
        let periods = periods_by_endpoint.remove(&endpoint_id).unwrap_or_default();

        let endpoint_views = segmenter.segment(&samples, &reasons, &sessions, &periods);
        debug!(
            "Endpoint {}: {} periods from {} samples and {} reasons",
            endpoint_id,
            endpoint_views.len(),
            samples.len(),
            reasons.len()
        );
        views.extend(endpoint_views);
    }

    if !reasons_by_endpoint.is_empty() {
        debug!(
            "Ignoring reasons for {} endpoints without energy samples",
            reasons_by_endpoint.len()
        );
    }
    views
}

// ── PeriodSegmenter ───────────────────────────────────────────────────────────

/// Walks a single endpoint's samples once and emits a period at each boundary.
#[derive(Debug, Clone, Default)]
pub struct PeriodSegmenter {
    options: SegmenterOptions,
}

/// The segment currently accumulating samples.
struct OpenSegment {
    endpoint_id: i64,
    start: Timestamp,
    energy: f64,
    /// Samples whose kWh is in `energy`.
    samples: usize,
}

impl OpenSegment {
    fn new(endpoint_id: i64, start: Timestamp) -> Self {
        Self {
            endpoint_id,
            start,
            energy: 0.0,
            samples: 0,
        }
    }

    fn add(&mut self, sample: &EnergySample) {
        self.energy += sample.kwh;
        self.samples += 1;
    }
}

impl PeriodSegmenter {
    pub fn new(options: SegmenterOptions) -> Self {
        Self { options }
    }

    /// Build the period view for one endpoint.
    ///
    /// The algorithm:
    /// 1. Samples are stable-sorted by timestamp.
    /// 2. The first sample opens the first segment.
    /// 3. A sample whose timestamp equals a reason event's closes the open
    ///    segment at that timestamp and opens the next one there.
    /// 4. With [`BoundaryEnergy::Deferred`] the boundary sample's kWh is
    ///    counted in the segment it opens, with [`BoundaryEnergy::Closing`]
    ///    in the one it closes.
    /// 5. Samples after the last boundary are dropped unless
    ///    [`TrailingSegment::CloseAtLastSample`] is set.
    pub fn segment(
        &self,
        energy_samples: &[EnergySample],
        reason_events: &[ReasonEvent],
        operator_sessions: &[OperatorSession],
        mode_periods: &[ModePeriod],
    ) -> Vec<PeriodView> {
        let mut sorted: Vec<&EnergySample> = energy_samples.iter().collect();
        sorted.sort_by_key(|s| s.event_time);

        let boundaries = boundary_reasons(reason_events);
        let operators = OperatorIndex::new(operator_sessions);
        let labeler = ModeLabeler::new(mode_periods);

        let mut views = Vec::new();
        let mut open: Option<OpenSegment> = None;

        for sample in &sorted {
            let segment =
                open.get_or_insert_with(|| OpenSegment::new(sample.endpoint_id, sample.event_time));

            let Some(reason) = boundaries.get(&sample.event_time) else {
                segment.add(sample);
                continue;
            };

            if self.options.boundary_energy == BoundaryEnergy::Closing {
                segment.add(sample);
            }
            views.push(self.close(segment, sample.event_time, reason, &operators, &labeler));

            *segment = OpenSegment::new(sample.endpoint_id, sample.event_time);
            if self.options.boundary_energy == BoundaryEnergy::Deferred {
                segment.add(sample);
            }
        }

        if let (Some(segment), Some(last)) = (open, sorted.last()) {
            if segment.samples > 0 {
                match self.options.trailing {
                    TrailingSegment::CloseAtLastSample => {
                        views.push(self.close(&segment, last.event_time, "", &operators, &labeler));
                    }
                    TrailingSegment::Drop => {
                        debug!(
                            "PeriodSegmenter: dropping {} trailing samples ({:.3} kWh) after {}",
                            segment.samples,
                            segment.energy,
                            segment.start.to_rfc3339()
                        );
                    }
                }
            }
        }

        debug!(
            "PeriodSegmenter: created {} periods from {} samples",
            views.len(),
            sorted.len()
        );
        views
    }

    fn close(
        &self,
        segment: &OpenSegment,
        end: Timestamp,
        reason: &str,
        operators: &OperatorIndex<'_>,
        labeler: &ModeLabeler<'_>,
    ) -> PeriodView {
        let label = if self.options.resolve_labels {
            labeler.label_for(segment.start)
        } else {
            None
        };

        PeriodView {
            endpoint_id: segment.endpoint_id,
            mode_start: segment.start,
            mode_end: end,
            mode_duration: duration_minutes(segment.start, end),
            label: label.unwrap_or(self.options.default_label.as_str()).to_string(),
            reason: reason.to_string(),
            operator_name: operators.operator_name(segment.start, end),
            energy_sum: segment.energy,
        }
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Boundary timestamps with the reason text of the first event at each.
fn boundary_reasons(reason_events: &[ReasonEvent]) -> HashMap<Timestamp, &str> {
    let mut boundaries = HashMap::with_capacity(reason_events.len());
    for event in reason_events {
        boundaries
            .entry(event.event_time)
            .or_insert(event.reason.as_str());
    }
    boundaries
}

/// Split records by endpoint, keeping input order within each endpoint.
fn group_by_endpoint<T: EndpointRecord + Clone>(records: &[T]) -> BTreeMap<i64, Vec<T>> {
    let mut grouped: BTreeMap<i64, Vec<T>> = BTreeMap::new();
    for record in records {
        grouped
            .entry(record.endpoint_id())
            .or_default()
            .push(record.clone());
    }
    grouped
}

// ── Tests ─────────────────────────────────────────────────────────────────────

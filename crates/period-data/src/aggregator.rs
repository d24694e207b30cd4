//! Totals over a period view, overall and per endpoint.

use std::collections::BTreeMap;

use period_core::models::PeriodView;

// ── PeriodStats ───────────────────────────────────────────────────────────────

/// Counters accumulated across multiple periods.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeriodStats {
    pub periods: usize,
    pub minutes: i64,
    pub energy_kwh: f64,
    /// Periods no operator session covered.
    pub unattended: usize,
}

impl PeriodStats {
    /// Add a single period to the running totals.
    pub fn add_view(&mut self, view: &PeriodView) {
        self.periods += 1;
        self.minutes += view.mode_duration;
        self.energy_kwh += view.energy_sum;
        if !view.has_operator() {
            self.unattended += 1;
        }
    }

    /// Mean energy per period, `0.0` when there are none.
    pub fn average_energy(&self) -> f64 {
        if self.periods == 0 {
            0.0
        } else {
            self.energy_kwh / self.periods as f64
        }
    }
}

// ── PeriodTotals ──────────────────────────────────────────────────────────────

/// Whole-run totals with a per-endpoint breakdown.
#[derive(Debug, Clone, Default)]
pub struct PeriodTotals {
    pub overall: PeriodStats,
    /// Keyed by endpoint id, ascending.
    pub by_endpoint: BTreeMap<i64, PeriodStats>,
}

impl PeriodTotals {
    pub fn from_views(views: &[PeriodView]) -> Self {
        let mut totals = Self::default();
        for view in views {
            totals.overall.add_view(view);
            totals
                .by_endpoint
                .entry(view.endpoint_id)
                .or_default()
                .add_view(view);
        }
        totals
    }
}

//! Mode-label lookup against the declared mode periods.

use period_core::models::{ModePeriod, Timestamp};

/// Declared mode periods of one endpoint ordered by start.
pub struct ModeLabeler<'a> {
    periods: Vec<&'a ModePeriod>,
}

impl<'a> ModeLabeler<'a> {
    pub fn new(periods: &'a [ModePeriod]) -> Self {
        let mut sorted: Vec<&ModePeriod> = periods.iter().collect();
        sorted.sort_by_key(|p| p.mode_start);
        Self { periods: sorted }
    }

    /// Label of the mode period containing `ts`.
    ///
    /// Overlapping declarations resolve to the most recently started one.
    /// Periods with a blank label are skipped so the caller's default applies.
    pub fn label_for(&self, ts: Timestamp) -> Option<&'a str> {
        let upto = self.periods.partition_point(|p| p.mode_start <= ts);

        let mut best: Option<&'a ModePeriod> = None;
        for period in self.periods[..upto].iter().rev() {
            if let Some(found) = best {
                if period.mode_start < found.mode_start {
                    break;
                }
            }
            if period.contains(ts) && !period.label.is_empty() {
                best = Some(period);
            }
        }
        best.map(|p| p.label.as_str())
    }
}

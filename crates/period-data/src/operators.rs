//! Operator-on-duty lookup over already-loaded sessions.

use period_core::models::{OperatorSession, Timestamp};

/// Sessions of one endpoint ordered by login time.
///
/// When several sessions cover a period the one that started most recently
/// wins; sessions with identical login times keep their input order.
pub struct OperatorIndex<'a> {
    sessions: Vec<&'a OperatorSession>,
}

impl<'a> OperatorIndex<'a> {
    pub fn new(sessions: &'a [OperatorSession]) -> Self {
        let mut sorted: Vec<&OperatorSession> = sessions.iter().collect();
        sorted.sort_by_key(|s| s.login_time);
        Self { sessions: sorted }
    }

    /// The session present for the whole `[start, end]` interval, if any.
    pub fn operator_on_duty(
        &self,
        start: Timestamp,
        end: Timestamp,
    ) -> Option<&'a OperatorSession> {
        // Only sessions that logged in by `start` can cover it.
        let upto = self.sessions.partition_point(|s| s.login_time <= start);

        let mut best: Option<&'a OperatorSession> = None;
        for session in self.sessions[..upto].iter().rev() {
            if let Some(found) = best {
                if session.login_time < found.login_time {
                    break;
                }
            }
            if session.covers(start, end) {
                best = Some(session);
            }
        }
        best
    }

    /// Name of the operator on duty, or an empty string.
    pub fn operator_name(&self, start: Timestamp, end: Timestamp) -> String {
        self.operator_on_duty(start, end)
            .map(|s| s.operator_name.clone())
            .unwrap_or_default()
    }
}

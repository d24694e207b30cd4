use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, TimeZone, Utc};
use tracing::debug;

use crate::error::{PeriodError, Result};
use crate::models::Timestamp;

/// Patterns carrying their own offset, tried after RFC 3339.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%z",
];

/// Local wall-clock patterns, interpreted in the batch offset.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];

// ── Offset parsing ────────────────────────────────────────────────────────────

/// Parse a UTC offset such as `"+03:00"`, `"-0530"`, `"Z"` or `"UTC"`.
pub fn parse_utc_offset(s: &str) -> Result<FixedOffset> {
    let trimmed = s.trim();
    if trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc") {
        return Ok(utc_offset());
    }
    trimmed
        .parse::<FixedOffset>()
        .map_err(|_| PeriodError::Config(format!("invalid UTC offset \"{}\"", s)))
}

/// The zero offset.
pub fn utc_offset() -> FixedOffset {
    Utc.fix()
}

// ── TimestampParser ───────────────────────────────────────────────────────────

/// Parses the localized timestamp strings found in the input datasets.
///
/// Strings that carry an offset keep it. Strings without one are read as
/// wall-clock time in the batch's fixed offset; no daylight-saving rules are
/// ever applied.
#[derive(Debug, Clone, Copy)]
pub struct TimestampParser {
    offset: FixedOffset,
}

impl Default for TimestampParser {
    fn default() -> Self {
        Self::new(utc_offset())
    }
}

impl TimestampParser {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// The offset applied to naive timestamps.
    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Parse `s` into a [`Timestamp`].
    ///
    /// Accepts RFC 3339 (including the `Z` suffix), `YYYY-MM-DD HH:MM:SS`
    /// with or without fractional seconds and offset, and the same with a
    /// `T` separator.
    pub fn parse(&self, s: &str) -> Result<Timestamp> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PeriodError::TimestampParse("empty timestamp".to_string()));
        }

        let normalised = match s.strip_suffix('Z') {
            Some(stripped) => format!("{}+00:00", stripped),
            None => s.to_string(),
        };

        if let Ok(dt) = DateTime::parse_from_rfc3339(&normalised) {
            return Ok(dt);
        }

        for fmt in OFFSET_FORMATS {
            if let Ok(dt) = DateTime::parse_from_str(&normalised, fmt) {
                return Ok(dt);
            }
        }

        for fmt in NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
                if let Some(dt) = self.offset.from_local_datetime(&naive).single() {
                    return Ok(dt);
                }
            }
        }

        debug!("TimestampParser: could not parse \"{}\"", s);
        Err(PeriodError::TimestampParse(s.to_string()))
    }

    /// Parse a nullable timestamp.
    ///
    /// Blank cells and the null markers dataframe exports write (`NaN`,
    /// `NaT`, `None`, `null`) become `None`.
    pub fn parse_optional(&self, s: &str) -> Result<Option<Timestamp>> {
        let trimmed = s.trim();
        if trimmed.is_empty()
            || ["nan", "nat", "none", "null"]
                .iter()
                .any(|marker| trimmed.eq_ignore_ascii_case(marker))
        {
            return Ok(None);
        }
        self.parse(s).map(Some)
    }
}

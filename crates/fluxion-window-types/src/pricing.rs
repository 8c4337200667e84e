// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use chrono::{DateTime, TimeDelta};
use chrono_tz::Tz;
use serde::Serialize;

// ============= Pricing Types =============

/// Timestamp in the configured local zone
///
/// Every timestamp entering the engine is converted to this frame first,
/// naive timestamps included, so comparisons are always legal.
pub type LocalDateTime = DateTime<Tz>;

/// Half-open time span `[start, end)` without a price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: LocalDateTime,
    pub end: LocalDateTime,
}

impl Span {
    pub fn new(start: LocalDateTime, end: LocalDateTime) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }

    /// True when the span covers no time at all
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// A half-open time span with an associated price
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricedInterval {
    /// Start of the interval (inclusive)
    pub start: LocalDateTime,

    /// End of the interval (exclusive)
    pub end: LocalDateTime,

    /// Price for the whole interval (per kWh, in the source's currency)
    pub price: f64,
}

impl PricedInterval {
    /// Create a priced interval, rejecting empty or inverted spans
    pub fn new(start: LocalDateTime, end: LocalDateTime, price: f64) -> Option<Self> {
        (end > start).then_some(Self { start, end, price })
    }

    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }

    pub fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }

    /// Same price over a different span
    pub fn with_span(&self, span: Span) -> Self {
        Self {
            start: span.start,
            end: span.end,
            price: self.price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Europe::Prague;

    fn at(hour: u32) -> LocalDateTime {
        Prague.with_ymd_and_hms(2025, 10, 2, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_priced_interval_rejects_inverted_span() {
        assert!(PricedInterval::new(at(10), at(9), 1.0).is_none());
        assert!(PricedInterval::new(at(10), at(10), 1.0).is_none());

        let interval = PricedInterval::new(at(9), at(10), 1.0).unwrap();
        assert_eq!(interval.duration(), TimeDelta::hours(1));
    }

    #[test]
    fn test_with_span_keeps_price() {
        let interval = PricedInterval::new(at(9), at(12), 0.42).unwrap();
        let truncated = interval.with_span(Span::new(at(10), at(11)));

        assert_eq!(truncated.start, at(10));
        assert_eq!(truncated.end, at(11));
        assert!((truncated.price - 0.42).abs() < f64::EPSILON);
    }

    #[test]
    fn test_span_is_empty() {
        assert!(Span::new(at(10), at(10)).is_empty());
        assert!(!Span::new(at(9), at(10)).is_empty());
    }
}

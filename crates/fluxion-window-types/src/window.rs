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

use chrono::TimeDelta;
use serde::Serialize;

use crate::pricing::LocalDateTime;

// ============= Window Selection Types =============

/// The span within which a window placement may occur
///
/// Recomputed every evaluation cycle, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EvaluationRange {
    pub start: LocalDateTime,
    pub end: LocalDateTime,
}

impl EvaluationRange {
    pub fn new(start: LocalDateTime, end: LocalDateTime) -> Self {
        Self { start, end }
    }
}

/// What the caller asked for: how much time, and whether it must be one block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionRequest {
    /// Requested amount of time (always positive)
    pub duration: TimeDelta,

    /// `true` = one contiguous block, `false` = cheapest fragments
    pub continuous: bool,
}

impl SelectionRequest {
    /// Requested duration in decimal hours
    pub fn duration_hours(&self) -> f64 {
        seconds_f64(self.duration) / 3600.0
    }
}

/// One window emitted by the resolver
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectedInterval {
    pub start: LocalDateTime,
    pub end: LocalDateTime,

    /// Time-weighted average price over the window
    pub average_price: f64,
}

impl SelectedInterval {
    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }

    /// True when `now` falls inside `[start, end)`
    pub fn contains(&self, now: LocalDateTime) -> bool {
        self.start <= now && now < self.end
    }
}

/// Result of one recalculation pass, read-only to consumers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineOutput {
    /// Selected windows, ascending by start
    pub selected: Vec<SelectedInterval>,

    /// Whether `now` is inside any selected window
    pub is_active_now: bool,

    /// Earliest selected start strictly after `now`
    pub next_start: Option<LocalDateTime>,

    /// Duration-weighted average across all selected windows
    pub overall_average: Option<f64>,
}

impl EngineOutput {
    /// Cleared output: nothing selected, not active
    pub fn inactive() -> Self {
        Self {
            selected: Vec::new(),
            is_active_now: false,
            next_start: None,
            overall_average: None,
        }
    }

    /// Total time covered by the selected windows
    pub fn total_duration(&self) -> TimeDelta {
        self.selected
            .iter()
            .fold(TimeDelta::zero(), |acc, interval| acc + interval.duration())
    }
}

/// Convert a time delta to fractional seconds (microsecond resolution)
pub fn seconds_f64(delta: TimeDelta) -> f64 {
    delta.num_seconds() as f64 + f64::from(delta.subsec_nanos()) / 1_000_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Europe::Prague;

    #[test]
    fn test_duration_hours() {
        let request = SelectionRequest {
            duration: TimeDelta::minutes(150),
            continuous: true,
        };
        assert!((request.duration_hours() - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_seconds_f64_keeps_subsecond_part() {
        let delta = TimeDelta::milliseconds(1500);
        assert!((seconds_f64(delta) - 1.5).abs() < 1e-12);

        let negative = TimeDelta::milliseconds(-1500);
        assert!((seconds_f64(negative) + 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_selected_interval_contains_is_half_open() {
        let start = Prague.with_ymd_and_hms(2025, 10, 2, 9, 0, 0).unwrap();
        let end = Prague.with_ymd_and_hms(2025, 10, 2, 10, 0, 0).unwrap();
        let interval = SelectedInterval {
            start,
            end,
            average_price: 1.0,
        };

        assert!(interval.contains(start));
        assert!(!interval.contains(end));
    }

    #[test]
    fn test_inactive_output() {
        let output = EngineOutput::inactive();
        assert!(output.selected.is_empty());
        assert!(!output.is_active_now);
        assert!(output.next_start.is_none());
        assert!(output.overall_average.is_none());
        assert_eq!(output.total_duration(), TimeDelta::zero());
    }
}

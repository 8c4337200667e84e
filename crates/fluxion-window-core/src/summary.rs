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


use fluxion_window_types::{EngineOutput, LocalDateTime, SelectedInterval};

use crate::average::time_weighted_average;

/// Derive the activation flag, next start and overall average
pub fn summarize(selected: Vec<SelectedInterval>, now: LocalDateTime) -> EngineOutput {
    let is_active_now = selected.iter().any(|interval| interval.contains(now));

    let next_start = selected
        .iter()
        .map(|interval| interval.start)
        .filter(|start| *start > now)
        .min();

    let overall_average = time_weighted_average(
        selected
            .iter()
            .map(|interval| (interval.duration(), interval.average_price)),
    );

    EngineOutput {
        selected,
        is_active_now,
        next_start,
        overall_average,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Europe::Prague;

    fn at(hour: u32, minute: u32) -> LocalDateTime {
        Prague.with_ymd_and_hms(2025, 10, 2, hour, minute, 0).unwrap()
    }

    fn selected(from: (u32, u32), to: (u32, u32), average: f64) -> SelectedInterval {
        SelectedInterval {
            start: at(from.0, from.1),
            end: at(to.0, to.1),
            average_price: average,
        }
    }

    #[test]
    fn test_active_inside_window() {
        let output = summarize(vec![selected((9, 0), (11, 0), 0.2)], at(10, 0));

        assert!(output.is_active_now);
        assert!(output.next_start.is_none());
        assert!((output.overall_average.unwrap() - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_window_end_is_exclusive() {
        let output = summarize(vec![selected((9, 0), (11, 0), 0.2)], at(11, 0));
        assert!(!output.is_active_now);
    }

    #[test]
    fn test_next_start_is_earliest_future_start() {
        let output = summarize(
            vec![
                selected((9, 0), (9, 30), 0.3),
                selected((10, 0), (11, 0), 0.1),
                selected((12, 0), (13, 0), 0.2),
            ],
            at(9, 15),
        );

        assert!(output.is_active_now);
        assert_eq!(output.next_start, Some(at(10, 0)));
    }

    #[test]
    fn test_overall_average_is_duration_weighted() {
        let output = summarize(
            vec![selected((9, 0), (9, 30), 0.30), selected((10, 0), (11, 0), 0.10)],
            at(8, 0),
        );

        // (0.5*0.30 + 1*0.10) / 1.5
        let expected = 0.25 / 1.5;
        assert!((output.overall_average.unwrap() - expected).abs() < 1e-9);
        assert!(!output.is_active_now);
        assert_eq!(output.next_start, Some(at(9, 0)));
    }

    #[test]
    fn test_empty_selection() {
        let output = summarize(Vec::new(), at(8, 0));
        assert_eq!(output, EngineOutput::inactive());
    }
}

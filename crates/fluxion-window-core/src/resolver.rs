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


//! Window selection over a clipped price series.
//!
//! Both modes are pure functions of the clipped segments and the request.

use chrono::TimeDelta;
use fluxion_window_types::{
    EvaluationRange, LocalDateTime, PricedInterval, SelectedInterval, SelectionRequest,
};
use tracing::{debug, trace};

use crate::average::time_weighted_average;
use crate::intervals::clip_to_range;

/// Coverage shortfall still accepted as a full window
const COVERAGE_TOLERANCE: TimeDelta = TimeDelta::microseconds(1);

/// Restrict a series to the evaluation range
///
/// Intervals outside the range are dropped, partial ones are truncated and
/// keep their price. The result is sorted by start.
pub fn clip_series(series: &[PricedInterval], range: &EvaluationRange) -> Vec<PricedInterval> {
    let mut clipped: Vec<PricedInterval> = series
        .iter()
        .filter_map(|interval| {
            clip_to_range(interval.start, interval.end, range.start, range.end)
                .map(|span| interval.with_span(span))
        })
        .collect();
    clipped.sort_by_key(|interval| interval.start);
    clipped
}

/// Select the window(s) for `request` from already clipped segments
pub fn resolve(
    segments: &[PricedInterval],
    range: &EvaluationRange,
    request: &SelectionRequest,
) -> Vec<SelectedInterval> {
    if segments.is_empty() {
        return Vec::new();
    }

    if request.continuous {
        resolve_continuous(segments, range, request.duration)
            .into_iter()
            .collect()
    } else {
        resolve_cheapest(segments, request.duration)
    }
}

/// Cheapest contiguous block of `duration`
///
/// Candidate starts are segment starts whose block still ends inside the
/// range. For each candidate the segments are walked forward accumulating
/// covered time until `duration` is reached; a candidate that runs out of
/// segments first is skipped. The lowest average wins, ties keep the earliest
/// candidate.
///
/// Coverage is summed per segment, not measured as a union. With overlapping
/// segments a block containing a hole in the data can still qualify.
pub fn resolve_continuous(
    segments: &[PricedInterval],
    range: &EvaluationRange,
    duration: TimeDelta,
) -> Option<SelectedInterval> {
    let mut best: Option<SelectedInterval> = None;

    for candidate in segments {
        let window_start = candidate.start;
        if window_start < range.start {
            continue;
        }
        let Some(window_end) = window_start.checked_add_signed(duration) else {
            continue;
        };
        if window_end > range.end {
            continue;
        }

        let Some(parts) = cover(segments, window_start, window_end, duration) else {
            trace!("Candidate {} cannot be fully covered", window_start);
            continue;
        };
        let Some(average) = time_weighted_average(parts) else {
            continue;
        };

        if best
            .as_ref()
            .is_none_or(|current| average < current.average_price)
        {
            best = Some(SelectedInterval {
                start: window_start,
                end: window_end,
                average_price: average,
            });
        }
    }

    if let Some(window) = &best {
        debug!(
            "🎯 Continuous window {} - {} (avg {:.4})",
            window.start, window.end, window.average_price
        );
    }
    best
}

/// Walk segments from `window_start`, collecting the parts inside the block
///
/// Returns `None` when the accumulated coverage falls short of `duration`.
fn cover(
    segments: &[PricedInterval],
    window_start: LocalDateTime,
    window_end: LocalDateTime,
    duration: TimeDelta,
) -> Option<Vec<(TimeDelta, f64)>> {
    let mut parts = Vec::new();
    let mut covered = TimeDelta::zero();

    for segment in segments {
        if segment.end <= window_start {
            continue;
        }
        if segment.start >= window_end {
            break;
        }

        let part_start = segment.start.max(window_start);
        let part_end = segment.end.min(window_end);
        if part_end > part_start {
            let part = part_end - part_start;
            parts.push((part, segment.price));
            covered += part;
        }

        if covered + COVERAGE_TOLERANCE >= duration {
            return Some(parts);
        }
    }

    None
}

/// Cheapest fragments totalling `duration`, regrouped in time order
///
/// Segments are taken cheapest first (earliest on equal price), each
/// contributing a prefix of at most the remaining need. If the segments run
/// out the shortfall is accepted. Taken fragments are then sorted by start
/// and grouped: touching fragments share a group, a gap starts a new one.
pub fn resolve_cheapest(segments: &[PricedInterval], duration: TimeDelta) -> Vec<SelectedInterval> {
    let mut by_price: Vec<&PricedInterval> = segments.iter().collect();
    by_price.sort_by(|a, b| a.price.total_cmp(&b.price).then(a.start.cmp(&b.start)));

    let mut need = duration;
    let mut picks: Vec<PricedInterval> = Vec::new();
    for segment in by_price {
        if need <= TimeDelta::zero() {
            break;
        }
        let length = segment.duration();
        if length <= TimeDelta::zero() {
            continue;
        }

        let take = need.min(length);
        if let Some(taken) = PricedInterval::new(segment.start, segment.start + take, segment.price) {
            picks.push(taken);
        }
        need -= take;
    }

    if need > TimeDelta::zero() {
        debug!("Cheapest selection short by {}s", need.num_seconds());
    }

    picks.sort_by_key(|pick| pick.start);

    let mut selected = Vec::new();
    let mut group: Vec<PricedInterval> = Vec::new();
    for pick in picks {
        match group.last_mut() {
            None => group.push(pick),
            Some(previous) if pick.start == previous.end => {
                if same_price(previous.price, pick.price) {
                    previous.end = pick.end;
                } else {
                    group.push(pick);
                }
            }
            Some(_) => {
                selected.extend(close_group(&group));
                group = vec![pick];
            }
        }
    }
    selected.extend(close_group(&group));

    debug!("🎯 Cheapest selection: {} window(s)", selected.len());
    selected
}

#[expect(clippy::float_cmp)]
fn same_price(a: f64, b: f64) -> bool {
    a == b
}

fn close_group(group: &[PricedInterval]) -> Option<SelectedInterval> {
    let (first, last) = (group.first()?, group.last()?);
    let average =
        time_weighted_average(group.iter().map(|fragment| (fragment.duration(), fragment.price)))?;
    Some(SelectedInterval {
        start: first.start,
        end: last.end,
        average_price: average,
    })
}

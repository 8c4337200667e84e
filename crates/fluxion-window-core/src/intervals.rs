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


//! Interval algebra on half-open `[start, end)` spans.

use fluxion_window_types::{LocalDateTime, Span};

/// Merge overlapping or touching spans into a sorted, disjoint list
///
/// Spans that merely touch (`next.start == current.end`) are merged as well.
/// Empty spans are dropped.
pub fn merge_overlaps(spans: impl IntoIterator<Item = Span>) -> Vec<Span> {
    let mut sorted: Vec<Span> = spans.into_iter().filter(|span| !span.is_empty()).collect();
    sorted.sort_by_key(|span| span.start);

    let mut merged: Vec<Span> = Vec::with_capacity(sorted.len());
    for span in sorted {
        match merged.last_mut() {
            Some(current) if span.start <= current.end => {
                current.end = current.end.max(span.end);
            }
            _ => merged.push(span),
        }
    }
    merged
}

/// Remove every blocker from `segment`, returning the surviving fragments
///
/// Blockers are applied one at a time to the fragments left by the previous
/// blocker, so the result is sorted and disjoint for any blocker order.
pub fn subtract_blockers(segment: Span, blockers: &[Span]) -> Vec<Span> {
    let mut fragments = if segment.is_empty() {
        Vec::new()
    } else {
        vec![segment]
    };

    for blocker in blockers {
        if fragments.is_empty() {
            break;
        }

        let mut next = Vec::with_capacity(fragments.len() + 1);
        for fragment in fragments {
            // No overlap
            if blocker.end <= fragment.start || blocker.start >= fragment.end {
                next.push(fragment);
                continue;
            }

            // Left remainder (side truncation or interior split)
            if blocker.start > fragment.start {
                next.push(Span::new(fragment.start, blocker.start));
            }

            // Right remainder (side truncation or interior split)
            if blocker.end < fragment.end {
                next.push(Span::new(blocker.end, fragment.end));
            }

            // Full cover leaves nothing
        }
        fragments = next;
    }

    fragments
}

/// Intersect `[start, end)` with `[range_start, range_end)`
///
/// Returns `None` when the two do not overlap.
pub fn clip_to_range(
    start: LocalDateTime,
    end: LocalDateTime,
    range_start: LocalDateTime,
    range_end: LocalDateTime,
) -> Option<Span> {
    let clipped = Span::new(start.max(range_start), end.min(range_end));
    (!clipped.is_empty()).then_some(clipped)
}

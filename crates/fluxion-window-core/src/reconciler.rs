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


use fluxion_window_types::PricedInterval;
use tracing::debug;

use crate::intervals::{merge_overlaps, subtract_blockers};

/// Fill gaps in the primary series with forecast prices
///
/// Forecast intervals are cut around everything the primary series covers,
/// so a known price is never overridden. The combined series is sorted by
/// start.
pub fn reconcile(primary: Vec<PricedInterval>, forecast: Vec<PricedInterval>) -> Vec<PricedInterval> {
    if forecast.is_empty() {
        return primary;
    }

    let blockers = merge_overlaps(primary.iter().map(PricedInterval::span));

    let fillers: Vec<PricedInterval> = forecast
        .iter()
        .flat_map(|interval| {
            subtract_blockers(interval.span(), &blockers)
                .into_iter()
                .filter(|fragment| !fragment.is_empty())
                .map(move |fragment| interval.with_span(fragment))
        })
        .collect();

    debug!(
        "🔮 Forecast reconciled: {} primary, {} forecast -> {} gap fillers",
        primary.len(),
        forecast.len(),
        fillers.len()
    );

    let mut combined = primary;
    combined.extend(fillers);
    combined.sort_by_key(|interval| interval.start);
    combined
}

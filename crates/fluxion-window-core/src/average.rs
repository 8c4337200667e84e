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
use fluxion_window_types::seconds_f64;

/// Time-weighted average `Σ(price·dur) / Σ(dur)`
///
/// Fragments with a non-positive duration are ignored. Returns `None` when no
/// time is covered.
pub fn time_weighted_average(fragments: impl IntoIterator<Item = (TimeDelta, f64)>) -> Option<f64> {
    let (weighted, total) = fragments
        .into_iter()
        .filter(|(duration, _)| *duration > TimeDelta::zero())
        .fold((0.0, 0.0), |(weighted, total), (duration, price)| {
            let seconds = seconds_f64(duration);
            (weighted + price * seconds, total + seconds)
        });

    (total > 0.0).then(|| weighted / total)
}

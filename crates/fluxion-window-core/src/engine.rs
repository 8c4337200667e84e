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


use fluxion_window_types::{
    EngineOutput, EvaluationRange, IntervalAttribute, LocalDateTime, PricedInterval,
    SelectionRequest, WindowAttributes, WindowState,
};
use tracing::{debug, info};

use crate::config::RenderedSettings;
use crate::error::SkipReason;
use crate::expressions::{parse_boundary, parse_duration};
use crate::reconciler::reconcile;
use crate::resolver::{clip_series, resolve};
use crate::summary::summarize;
use crate::time::LocalZone;

/// Result of one successful recalculation pass
#[derive(Debug, Clone, PartialEq)]
pub struct Recalculation {
    pub range: EvaluationRange,
    pub request: SelectionRequest,
    pub output: EngineOutput,
    pub calculated_at: LocalDateTime,
}

impl Recalculation {
    /// Published state with ISO-8601 local timestamps
    pub fn to_state(&self, zone: &LocalZone) -> WindowState {
        WindowState {
            is_on: self.output.is_active_now,
            attributes: WindowAttributes {
                intervals: self
                    .output
                    .selected
                    .iter()
                    .map(|interval| IntervalAttribute {
                        start: zone.to_iso(&interval.start),
                        end: zone.to_iso(&interval.end),
                        average: interval.average_price,
                    })
                    .collect(),
                start_time: zone.to_iso(&self.range.start),
                end_time: zone.to_iso(&self.range.end),
                duration: self.request.duration_hours(),
                continuous: self.request.continuous,
                next_start_time: self.output.next_start.map(|start| zone.to_iso(&start)),
                average: self.output.overall_average,
                last_calculated: zone.to_iso(&self.calculated_at),
            },
        }
    }
}

/// Run one full pass: reconcile, build the range, clip, resolve, summarize
///
/// Pure apart from logging. An empty primary series or an unusable duration
/// skips the pass; an empty clipped series yields a cleared output.
pub fn recalculate(
    settings: &RenderedSettings,
    now: LocalDateTime,
    zone: &LocalZone,
    primary: Vec<PricedInterval>,
    forecast: Vec<PricedInterval>,
) -> Result<Recalculation, SkipReason> {
    if primary.is_empty() {
        return Err(SkipReason::EmptyPrimarySeries);
    }

    let mut combined = reconcile(primary, forecast);
    combined.sort_by_key(|interval| interval.start);
    let last_end = combined
        .last()
        .map(|interval| interval.end)
        .ok_or(SkipReason::EmptyPrimarySeries)?;

    let start = parse_boundary(settings.start.as_ref(), now, zone).unwrap_or(now);
    let mut end = parse_boundary(settings.end.as_ref(), now, zone).unwrap_or(last_end);
    if end <= now {
        end = zone.next_day(&end);
    }
    let range = EvaluationRange::new(start, end);

    let duration = settings
        .duration
        .as_ref()
        .and_then(parse_duration)
        .ok_or_else(|| SkipReason::InvalidDuration {
            raw: settings.duration.as_ref().map(|value| format!("{value:?}")),
        })?;
    let request = SelectionRequest {
        duration,
        continuous: settings.continuous,
    };

    let segments = clip_series(&combined, &range);
    debug!(
        "📊 Range {} - {}: {} of {} intervals in range",
        range.start,
        range.end,
        segments.len(),
        combined.len()
    );

    let output = if segments.is_empty() {
        info!("⏸️ No price data inside evaluation range, clearing window");
        EngineOutput::inactive()
    } else {
        let output = summarize(resolve(&segments, &range, &request), now);
        let selected = output.total_duration();
        if selected < request.duration {
            info!(
                "📉 Only {} min of {} min requested are available in range",
                selected.num_minutes(),
                request.duration.num_minutes()
            );
        }
        output
    };

    Ok(Recalculation {
        range,
        request,
        output,
        calculated_at: now,
    })
}

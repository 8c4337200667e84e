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


use std::sync::Arc;
use std::time::Duration;

use fluxion_window_core::{LocalZone, TriggerOutcome, WindowSensor};
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Timing for one window task
#[derive(Debug, Clone, Copy)]
pub struct ScheduleConfig {
    /// Unconditional recalculation period (clock tick)
    pub update_interval: Duration,

    /// Source change polling period
    pub watch_interval: Duration,
}

/// Drive one window until `shutdown` flips to `true`
///
/// The first update tick fires immediately. Triggers of one window never
/// overlap since each is awaited inside the loop.
pub async fn run_window(
    sensor: Arc<WindowSensor>,
    zone: LocalZone,
    schedule: ScheduleConfig,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut update_interval = tokio::time::interval(schedule.update_interval);
    update_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut watch_interval = tokio::time::interval_at(
        Instant::now() + schedule.watch_interval,
        schedule.watch_interval,
    );
    watch_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        "⏱️ [SCHEDULER] {} running (update every {:?}, watch every {:?})",
        sensor.entity_id(),
        schedule.update_interval,
        schedule.watch_interval
    );

    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!("🛑 [SCHEDULER] {} stopping", sensor.entity_id());
                    break;
                }
            }
            _ = update_interval.tick() => {
                let outcome = sensor.on_trigger(zone.now()).await;
                log_outcome(&sensor, &outcome);
            }
            _ = watch_interval.tick() => {
                let outcome = sensor.on_source_poll(zone.now()).await;
                log_outcome(&sensor, &outcome);
            }
        }
    }
}

fn log_outcome(sensor: &WindowSensor, outcome: &TriggerOutcome) {
    match outcome {
        TriggerOutcome::Published(state) => {
            debug!("   {} is {}", sensor.entity_id(), state.state_str());
        }
        TriggerOutcome::Skipped(reason) => {
            debug!("   {} kept previous state ({})", sensor.entity_id(), reason);
        }
        TriggerOutcome::Unchanged => {}
    }
}

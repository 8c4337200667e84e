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


//! Trigger adapter driving one price window.
//!
//! [`WindowSensor`] fetches from the host sequentially, runs the pure
//! [`recalculate`] pass and publishes the result. Callers serialize triggers
//! per sensor; concurrent calls are safe but publishing is last-writer-wins.

use std::sync::Arc;

use fluxion_window_types::{LocalDateTime, PricedInterval, WindowState};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::config::{RenderedSettings, WindowConfig};
use crate::engine::recalculate;
use crate::error::SkipReason;
use crate::expressions::{ExpressionValue, parse_bool};
use crate::normalizer::normalize_attributes;
use crate::time::LocalZone;
use crate::traits::{ExpressionRenderer, PriceAttributeSource, SourceSnapshot, WindowPublisher};

/// What a trigger ended up doing
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerOutcome {
    /// A new state was computed (and handed to the publisher)
    Published(WindowState),

    /// The pass was aborted; the previous state stays
    Skipped(SkipReason),

    /// Source poll found no change, nothing was recomputed
    Unchanged,
}

/// `last_updated` markers seen on the previous fetch
#[derive(Debug, Default, Clone, PartialEq)]
struct SourceStamps {
    primary: Option<String>,
    forecast: Option<String>,
}

/// Snapshots from one fetch phase
#[derive(Debug)]
struct Fetched {
    primary: SourceSnapshot,
    forecast: Option<SourceSnapshot>,
}

impl Fetched {
    fn stamps(&self) -> SourceStamps {
        SourceStamps {
            primary: self.primary.last_updated.clone(),
            forecast: self
                .forecast
                .as_ref()
                .and_then(|snapshot| snapshot.last_updated.clone()),
        }
    }
}

/// One configured price window bound to its host collaborators
pub struct WindowSensor {
    config: WindowConfig,
    entity_id: String,
    zone: LocalZone,
    source: Arc<dyn PriceAttributeSource>,
    renderer: Arc<dyn ExpressionRenderer>,
    publisher: Arc<dyn WindowPublisher>,
    last_state: RwLock<Option<WindowState>>,
    stamps: Mutex<Option<SourceStamps>>,
}

impl std::fmt::Debug for WindowSensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowSensor")
            .field("entity_id", &self.entity_id)
            .field("source", &self.source.name())
            .field("renderer", &self.renderer.name())
            .field("publisher", &self.publisher.name())
            .finish_non_exhaustive()
    }
}

impl WindowSensor {
    pub fn new(
        config: WindowConfig,
        zone: LocalZone,
        source: Arc<dyn PriceAttributeSource>,
        renderer: Arc<dyn ExpressionRenderer>,
        publisher: Arc<dyn WindowPublisher>,
    ) -> Self {
        let entity_id = config.entity_id();
        Self {
            config,
            entity_id,
            zone,
            source,
            renderer,
            publisher,
            last_state: RwLock::new(None),
            stamps: Mutex::new(None),
        }
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    /// Last state produced by a successful pass
    pub fn current_state(&self) -> Option<WindowState> {
        self.last_state.read().clone()
    }

    /// Recompute unconditionally (clock tick or startup)
    pub async fn on_trigger(&self, now: LocalDateTime) -> TriggerOutcome {
        let fetched = match self.fetch().await {
            Ok(fetched) => fetched,
            Err(reason) => return self.skip(reason),
        };
        *self.stamps.lock() = Some(fetched.stamps());
        self.evaluate(fetched, now).await
    }

    /// Recompute only when a source entity changed since the last fetch
    pub async fn on_source_poll(&self, now: LocalDateTime) -> TriggerOutcome {
        let fetched = match self.fetch().await {
            Ok(fetched) => fetched,
            Err(reason) => return self.skip(reason),
        };

        let current = fetched.stamps();
        {
            let mut seen = self.stamps.lock();
            if seen.as_ref() == Some(&current) {
                return TriggerOutcome::Unchanged;
            }
            *seen = Some(current);
        }

        debug!("🔔 [WINDOW] {} source changed, recalculating", self.entity_id);
        self.evaluate(fetched, now).await
    }

    async fn fetch(&self) -> Result<Fetched, SkipReason> {
        let primary = match self.source.read_snapshot(&self.config.source_entity).await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                return Err(SkipReason::SourceMissing(self.config.source_entity.clone()));
            }
            Err(e) => {
                return Err(SkipReason::SourceUnavailable(format!(
                    "{}: {e:#}",
                    self.config.source_entity
                )));
            }
        };

        let forecast = match &self.config.forecast_entity {
            Some(entity_id) => match self.source.read_snapshot(entity_id).await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    warn!(
                        "⚠️ [WINDOW] Forecast {} unavailable, continuing without it: {:#}",
                        entity_id, e
                    );
                    None
                }
            },
            None => None,
        };

        Ok(Fetched { primary, forecast })
    }

    async fn evaluate(&self, fetched: Fetched, now: LocalDateTime) -> TriggerOutcome {
        let settings = self.render_settings().await;

        let primary = normalize_attributes(&fetched.primary.attributes, &self.zone);
        let forecast: Vec<PricedInterval> = fetched
            .forecast
            .map(|snapshot| normalize_attributes(&snapshot.attributes, &self.zone))
            .unwrap_or_default();

        let now = self.zone.convert(&now);
        let recalculation = match recalculate(&settings, now, &self.zone, primary, forecast) {
            Ok(recalculation) => recalculation,
            Err(reason) => return self.skip(reason),
        };

        let state = recalculation.to_state(&self.zone);
        info!(
            "💡 [WINDOW] {} -> {} ({} interval(s), next start {})",
            self.entity_id,
            state.state_str(),
            state.attributes.intervals.len(),
            state
                .attributes
                .next_start_time
                .as_deref()
                .unwrap_or("none")
        );

        if let Err(e) = self
            .publisher
            .publish(&self.entity_id, &self.config.name, &state)
            .await
        {
            warn!(
                "⚠️ [WINDOW] Failed to publish {} via {}: {:#}",
                self.entity_id,
                self.publisher.name(),
                e
            );
        }

        *self.last_state.write() = Some(state.clone());
        TriggerOutcome::Published(state)
    }

    fn skip(&self, reason: SkipReason) -> TriggerOutcome {
        warn!("⏭️ [WINDOW] {} skipped: {}", self.entity_id, reason);
        TriggerOutcome::Skipped(reason)
    }

    /// Render every templated setting, leaving literals untouched
    async fn render_settings(&self) -> RenderedSettings {
        if let Some(settings) = self.config.literal_settings() {
            return settings;
        }

        let start = self.render_value(self.config.start_time.as_ref()).await;
        let end = self.render_value(self.config.end_time.as_ref()).await;
        let duration = self.render_value(Some(&self.config.duration)).await;
        let continuous = self
            .render_value(Some(&self.config.continuous))
            .await
            .is_some_and(|value| parse_bool(&value));

        RenderedSettings {
            start,
            end,
            duration,
            continuous,
        }
    }

    async fn render_value(&self, value: Option<&ExpressionValue>) -> Option<ExpressionValue> {
        let value = value?;
        let Some(expression) = value.as_text().filter(|_| value.is_template()) else {
            return Some(value.clone());
        };

        match self.renderer.render(expression).await {
            Ok(output) => Some(ExpressionValue::from_rendered(&output)),
            Err(e) => {
                warn!(
                    "⚠️ [WINDOW] Failed to render '{}' via {}: {:#}",
                    expression,
                    self.renderer.name(),
                    e
                );
                None
            }
        }
    }
}

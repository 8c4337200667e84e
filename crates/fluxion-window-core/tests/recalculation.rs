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


//! End-to-end passes through the window sensor using in-memory host fakes.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{TimeDelta, TimeZone};
use chrono_tz::Europe::Prague;
use fluxion_window_core::normalizer::normalize_attributes;
use fluxion_window_core::{
    ExpressionRenderer, ExpressionValue, LocalZone, PriceAttributeSource, RenderedSettings,
    SkipReason, SourceSnapshot, TriggerOutcome, WindowConfig, WindowPublisher, WindowSensor,
    recalculate,
};
use fluxion_window_types::{LocalDateTime, WindowState};
use parking_lot::Mutex;
use serde_json::{Value, json};

struct StaticSource {
    entities: HashMap<String, Value>,
}

#[async_trait]
impl PriceAttributeSource for StaticSource {
    async fn read_snapshot(&self, entity_id: &str) -> Result<Option<SourceSnapshot>> {
        Ok(self.entities.get(entity_id).map(|attributes| SourceSnapshot {
            attributes: attributes.clone(),
            last_updated: Some("2025-10-02T06:00:00+00:00".to_owned()),
        }))
    }

    fn name(&self) -> &str {
        "static"
    }
}

struct NoTemplates;

#[async_trait]
impl ExpressionRenderer for NoTemplates {
    async fn render(&self, expression: &str) -> Result<String> {
        anyhow::bail!("unexpected template {expression}")
    }

    fn name(&self) -> &str {
        "none"
    }
}

#[derive(Default)]
struct RecordingPublisher {
    states: Mutex<Vec<(String, String, WindowState)>>,
}

#[async_trait]
impl WindowPublisher for RecordingPublisher {
    async fn publish(&self, entity_id: &str, friendly_name: &str, state: &WindowState) -> Result<()> {
        self.states
            .lock()
            .push((entity_id.to_owned(), friendly_name.to_owned(), state.clone()));
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

fn zone() -> LocalZone {
    LocalZone::new(Prague)
}

fn at(day: u32, hour: u32, minute: u32) -> LocalDateTime {
    Prague.with_ymd_and_hms(2025, 10, day, hour, minute, 0).unwrap()
}

/// Quarter-hour primary data for today 09:00-12:00
fn hourly_primary() -> Value {
    let prices = [0.30, 0.30, 0.30, 0.30, 0.10, 0.10, 0.10, 0.10, 0.50, 0.50, 0.50, 0.50];
    let today: Vec<Value> = prices
        .iter()
        .enumerate()
        .map(|(i, price)| {
            let hour = at(2, 9, 0) + TimeDelta::minutes(15 * i64::try_from(i).unwrap());
            json!({ "hour": hour.to_rfc3339(), "price": price })
        })
        .collect();
    json!({ "raw_today": today, "raw_tomorrow": [] })
}

fn explicit_forecast() -> Value {
    json!({
        "prices": [
            {"start": "2025-10-02T11:00:00+02:00", "end": "2025-10-02T14:00:00+02:00", "price": 0.01},
        ]
    })
}

#[test]
fn test_hourly_shape_continuous_selection() {
    let primary = normalize_attributes(&hourly_primary(), &zone());
    assert_eq!(primary.len(), 12);

    let settings = RenderedSettings {
        start: None,
        end: None,
        duration: Some(ExpressionValue::from("2:00")),
        continuous: true,
    };

    let result = recalculate(&settings, at(2, 8, 0), &zone(), primary, Vec::new()).unwrap();
    let state = result.to_state(&zone());

    assert_eq!(state.attributes.intervals.len(), 1);
    assert_eq!(state.attributes.intervals[0].start, "2025-10-02T09:00:00+02:00");
    assert_eq!(state.attributes.intervals[0].end, "2025-10-02T11:00:00+02:00");
    assert!((state.attributes.intervals[0].average - 0.20).abs() < 1e-9);
    assert_eq!(state.attributes.end_time, "2025-10-02T12:00:00+02:00");
}

#[test]
fn test_forecast_only_fills_gaps() {
    let primary = normalize_attributes(&hourly_primary(), &zone());
    let forecast = normalize_attributes(&explicit_forecast(), &zone());

    let settings = RenderedSettings {
        start: None,
        end: None,
        duration: Some(ExpressionValue::Number(1.0)),
        continuous: true,
    };

    let result = recalculate(&settings, at(2, 8, 0), &zone(), primary, forecast).unwrap();

    // The forecast covering 11:00-12:00 is discarded, 12:00-14:00 fills the gap
    assert_eq!(result.range.end, at(2, 14, 0));
    assert_eq!(result.output.selected.len(), 1);
    assert_eq!(result.output.selected[0].start, at(2, 12, 0));
    assert_eq!(result.output.selected[0].end, at(2, 13, 0));
}

#[test]
fn test_empty_payload_is_skipped() {
    let primary = normalize_attributes(&json!({"raw_today": [], "raw_tomorrow": []}), &zone());
    let settings = RenderedSettings {
        start: None,
        end: None,
        duration: Some(ExpressionValue::from("1")),
        continuous: true,
    };

    assert_eq!(
        recalculate(&settings, at(2, 8, 0), &zone(), primary, Vec::new()),
        Err(SkipReason::EmptyPrimarySeries)
    );
}

#[tokio::test]
async fn test_sensor_cheapest_window_through_the_day() {
    let source = Arc::new(StaticSource {
        entities: HashMap::from([
            ("sensor.spot_price".to_owned(), hourly_primary()),
            ("sensor.spot_forecast".to_owned(), explicit_forecast()),
        ]),
    });
    let publisher = Arc::new(RecordingPublisher::default());

    let mut config = WindowConfig::new("sensor.spot_price");
    config.name = "Washing Machine".to_owned();
    config.forecast_entity = Some("sensor.spot_forecast".to_owned());
    config.start_time = Some(ExpressionValue::from("09:00"));
    config.end_time = Some(ExpressionValue::from("12:00"));
    config.duration = ExpressionValue::from("1:30");
    config.continuous = ExpressionValue::Bool(false);

    let sensor = WindowSensor::new(
        config,
        zone(),
        source,
        Arc::new(NoTemplates),
        publisher.clone(),
    );

    // Before the window: inactive, next start at 09:00
    let TriggerOutcome::Published(early) = sensor.on_trigger(at(2, 8, 0)).await else {
        panic!("expected publish");
    };
    assert!(!early.is_on);
    assert_eq!(early.attributes.intervals.len(), 2);
    assert_eq!(
        early.attributes.next_start_time.as_deref(),
        Some("2025-10-02T09:00:00+02:00")
    );
    let expected_average = (0.5 * 0.30 + 1.0 * 0.10) / 1.5;
    assert!((early.attributes.average.unwrap() - expected_average).abs() < 1e-9);

    // Inside the cheap hour: active, range start still anchored at 09:00
    let TriggerOutcome::Published(inside) = sensor.on_trigger(at(2, 10, 15)).await else {
        panic!("expected publish");
    };
    assert!(inside.is_on);
    assert_eq!(inside.attributes.start_time, "2025-10-02T09:00:00+02:00");
    assert!(inside.attributes.next_start_time.is_none());

    // After 12:00 the end rolls to tomorrow, pulling the forecast into range
    let TriggerOutcome::Published(late) = sensor.on_trigger(at(2, 12, 30)).await else {
        panic!("expected publish");
    };
    assert!(late.is_on);
    assert_eq!(late.attributes.end_time, "2025-10-03T12:00:00+02:00");
    assert_eq!(late.attributes.intervals.len(), 1);
    assert_eq!(late.attributes.intervals[0].start, "2025-10-02T12:00:00+02:00");
    assert_eq!(late.attributes.intervals[0].end, "2025-10-02T13:30:00+02:00");

    let states = publisher.states.lock();
    assert_eq!(states.len(), 3);
    assert_eq!(states[0].0, "binary_sensor.washing_machine");
    assert_eq!(states[0].1, "Washing Machine");
}

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


//! Price series ingestion.
//!
//! Provider attribute bags come in two shapes. They are decoded once into a
//! [`PricePayload`] and turned into an ascending [`PricedInterval`] series;
//! nothing downstream looks at the raw JSON again.

use chrono::TimeDelta;
use fluxion_window_types::{LocalDateTime, PricedInterval};
use serde_json::Value;
use tracing::{debug, trace};

use crate::time::LocalZone;

/// One record of the explicit `prices` shape
#[derive(Debug, Clone, PartialEq)]
pub struct ExplicitRecord {
    pub start: Option<LocalDateTime>,
    pub end: Option<LocalDateTime>,
    pub price: Option<f64>,
}

/// One record of the hourly `raw_today` / `raw_tomorrow` shape
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyRecord {
    pub hour: Option<LocalDateTime>,
    pub price: Option<f64>,
}

/// Decoded provider payload
#[derive(Debug, Clone, PartialEq)]
pub enum PricePayload {
    /// `prices: [{start, end, price}]`, authoritative spans
    Explicit(Vec<ExplicitRecord>),

    /// `raw_today ++ raw_tomorrow: [{hour, price}]`, cadence inferred
    Hourly(Vec<HourlyRecord>),
}

impl PricePayload {
    /// Decode a provider attribute bag
    ///
    /// A non-empty `prices` list wins; otherwise `raw_today` and
    /// `raw_tomorrow` are concatenated. Records that are not objects are kept
    /// as empty records so cadence inference still sees them in position.
    pub fn decode(attributes: &Value, zone: &LocalZone) -> Self {
        if let Some(prices) = attributes.get("prices").and_then(Value::as_array)
            && !prices.is_empty()
        {
            debug!("🔍 Decoding explicit price series ({} records)", prices.len());
            return Self::Explicit(
                prices
                    .iter()
                    .map(|record| ExplicitRecord {
                        start: field_datetime(record, "start", zone),
                        end: field_datetime(record, "end", zone),
                        price: field_price(record),
                    })
                    .collect(),
            );
        }

        let records: Vec<HourlyRecord> = ["raw_today", "raw_tomorrow"]
            .iter()
            .filter_map(|key| attributes.get(*key).and_then(Value::as_array))
            .flatten()
            .map(|record| HourlyRecord {
                hour: field_datetime(record, "hour", zone),
                price: field_price(record),
            })
            .collect();

        debug!("🔍 Decoding hourly price series ({} records)", records.len());
        Self::Hourly(records)
    }

    /// Convert into an ascending series, dropping malformed records
    pub fn normalize(self) -> Vec<PricedInterval> {
        let mut series: Vec<PricedInterval> = match self {
            Self::Explicit(records) => {
                let total = records.len();
                let series: Vec<PricedInterval> = records
                    .into_iter()
                    .filter_map(|record| {
                        let interval = PricedInterval::new(record.start?, record.end?, record.price?);
                        if interval.is_none() {
                            trace!("Skipping price record with end <= start");
                        }
                        interval
                    })
                    .collect();
                log_skipped("explicit", total, series.len());
                series
            }
            Self::Hourly(records) => {
                let cadence = infer_cadence(&records);
                let total = records.len();
                let series: Vec<PricedInterval> = records
                    .into_iter()
                    .filter_map(|record| {
                        let start = record.hour?;
                        PricedInterval::new(start, start.checked_add_signed(cadence)?, record.price?)
                    })
                    .collect();
                log_skipped("hourly", total, series.len());
                series
            }
        };

        series.sort_by_key(|interval| interval.start);
        series
    }
}

/// Decode and normalize a provider attribute bag in one step
pub fn normalize_attributes(attributes: &Value, zone: &LocalZone) -> Vec<PricedInterval> {
    PricePayload::decode(attributes, zone).normalize()
}

/// Slot length of an hourly series
///
/// The delta between the first two records when both hours parsed and the
/// second is later, otherwise one hour.
fn infer_cadence(records: &[HourlyRecord]) -> TimeDelta {
    if let [first, second, ..] = records
        && let (Some(h0), Some(h1)) = (first.hour, second.hour)
        && h1 > h0
    {
        return h1 - h0;
    }
    TimeDelta::hours(1)
}

fn field_datetime(record: &Value, key: &str, zone: &LocalZone) -> Option<LocalDateTime> {
    record
        .get(key)
        .and_then(Value::as_str)
        .and_then(|raw| zone.parse_datetime(raw))
}

/// Numeric JSON values and numeric strings; `null` and anything else is missing
fn field_price(record: &Value) -> Option<f64> {
    let price = match record.get("price")? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    price.is_finite().then_some(price)
}

fn log_skipped(shape: &str, total: usize, kept: usize) {
    if kept < total {
        debug!(
            "   Skipped {} malformed {} price records ({} kept)",
            total - kept,
            shape,
            kept
        );
    }
}

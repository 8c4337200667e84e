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


use serde::{Deserialize, Deserializer, Serialize};

use crate::expressions::{ExpressionValue, parse_bool};

/// Configuration of a single price window
///
/// Built once at startup and never mutated. `start_time`, `end_time`,
/// `duration` and `continuous` may hold Jinja expressions that the host
/// renders on every recalculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Display name, also used to derive the published entity id
    #[serde(default = "default_name")]
    pub name: String,

    /// Entity holding the primary price series
    /// Accepts both "source_entity" (config.toml) and "sensor_name" (HA addon options.json)
    #[serde(alias = "sensor_name")]
    pub source_entity: String,

    /// Optional entity holding forecast prices used to fill gaps
    #[serde(
        default,
        alias = "forecast_source_entity",
        deserialize_with = "empty_string_as_none"
    )]
    pub forecast_entity: Option<String>,

    /// Range start: `HH:MM[:SS]`, a datetime, or an expression. Empty = now
    #[serde(default, deserialize_with = "empty_value_as_none")]
    pub start_time: Option<ExpressionValue>,

    /// Range end: same forms as `start_time`. Empty = end of the price data
    #[serde(default, deserialize_with = "empty_value_as_none")]
    pub end_time: Option<ExpressionValue>,

    /// Requested duration: hours, `H:MM[:SS]`, or an expression
    #[serde(default = "default_duration")]
    pub duration: ExpressionValue,

    /// One contiguous block (`true`) or cheapest fragments (`false`)
    #[serde(default = "default_continuous")]
    pub continuous: ExpressionValue,

    /// Published entity id, defaults to `binary_sensor.<slug of name>`
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub entity_id: Option<String>,
}

impl WindowConfig {
    /// Minimal config for `source_entity` with every other field defaulted
    pub fn new(source_entity: impl Into<String>) -> Self {
        Self {
            name: default_name(),
            source_entity: source_entity.into(),
            forecast_entity: None,
            start_time: None,
            end_time: None,
            duration: default_duration(),
            continuous: default_continuous(),
            entity_id: None,
        }
    }

    /// Entity id the window state is published under
    pub fn entity_id(&self) -> String {
        match &self.entity_id {
            Some(entity_id) => entity_id.clone(),
            None => format!("binary_sensor.{}", slugify(&self.name)),
        }
    }

    /// Settings usable without a renderer, when nothing is templated
    pub fn literal_settings(&self) -> Option<RenderedSettings> {
        let templated = [
            self.start_time.as_ref(),
            self.end_time.as_ref(),
            Some(&self.duration),
            Some(&self.continuous),
        ]
        .into_iter()
        .flatten()
        .any(ExpressionValue::is_template);

        (!templated).then(|| RenderedSettings {
            start: self.start_time.clone(),
            end: self.end_time.clone(),
            duration: Some(self.duration.clone()),
            continuous: parse_bool(&self.continuous),
        })
    }
}

/// Configuration values after expression rendering, for one pass
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedSettings {
    pub start: Option<ExpressionValue>,
    pub end: Option<ExpressionValue>,

    /// `None` when rendering failed
    pub duration: Option<ExpressionValue>,
    pub continuous: bool,
}

fn default_name() -> String {
    "Price Window".to_owned()
}

fn default_duration() -> ExpressionValue {
    ExpressionValue::Text("3:00".to_owned())
}

fn default_continuous() -> ExpressionValue {
    ExpressionValue::Bool(true)
}

/// Lowercase ASCII slug with `_` separators, as HA derives object ids
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for ch in name.trim().chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch);
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
    }
    while slug.ends_with('_') {
        slug.pop();
    }

    if slug.is_empty() {
        "price_window".to_owned()
    } else {
        slug
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|text| !text.trim().is_empty()))
}

fn empty_value_as_none<'de, D>(deserializer: D) -> Result<Option<ExpressionValue>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<ExpressionValue>::deserialize(deserializer)?;
    Ok(value.filter(|value| value.as_text().is_none_or(|text| !text.trim().is_empty())))
}

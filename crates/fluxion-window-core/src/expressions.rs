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


//! Configuration values that may be literals or host-rendered expressions.

use chrono::TimeDelta;
use fluxion_window_types::LocalDateTime;
use serde::{Deserialize, Serialize};

use crate::time::LocalZone;

/// A configuration value after rendering
///
/// Literal config values deserialize straight into this; rendered expression
/// output goes through [`ExpressionValue::from_rendered`] so `"2.5"` becomes a
/// number and `"true"` a boolean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExpressionValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl ExpressionValue {
    /// Interpret rendered template output as a native value
    pub fn from_rendered(output: &str) -> Self {
        let trimmed = output.trim();
        match serde_json::from_str::<Self>(trimmed) {
            Ok(value) => value,
            Err(_) => Self::Text(trimmed.to_owned()),
        }
    }

    /// Text content, if this is a string value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Bool(_) | Self::Number(_) => None,
        }
    }

    /// True when the value must be rendered by the host before use
    pub fn is_template(&self) -> bool {
        self.as_text().is_some_and(contains_template)
    }
}

impl From<&str> for ExpressionValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<f64> for ExpressionValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for ExpressionValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Whether a string contains Jinja markup
pub fn contains_template(value: &str) -> bool {
    value.contains("{{") || value.contains("{%")
}

/// Parse a requested duration
///
/// Accepts a number of hours, `H:MM[:SS]` with fractional components, or a
/// decimal string of hours. Zero, negative and unparseable values yield `None`.
pub fn parse_duration(value: &ExpressionValue) -> Option<TimeDelta> {
    let seconds = match value {
        ExpressionValue::Number(hours) => hours * 3600.0,
        ExpressionValue::Text(text) => parse_duration_text(text.trim())?,
        ExpressionValue::Bool(_) => return None,
    };
    seconds_to_delta(seconds)
}

fn parse_duration_text(text: &str) -> Option<f64> {
    if text.contains(':') {
        let mut parts = text.split(':');
        let hours: f64 = parts.next()?.trim().parse().ok()?;
        let minutes: f64 = parts.next()?.trim().parse().ok()?;
        let seconds: f64 = match parts.next() {
            Some(raw) => raw.trim().parse().ok()?,
            None => 0.0,
        };
        return Some(hours * 3600.0 + minutes * 60.0 + seconds);
    }

    text.parse::<f64>().ok().map(|hours| hours * 3600.0)
}

/// Positive, finite seconds rounded to whole microseconds
fn seconds_to_delta(seconds: f64) -> Option<TimeDelta> {
    if !seconds.is_finite() || seconds <= 0.0 {
        return None;
    }

    let micros = (seconds * 1_000_000.0).round();
    // Beyond any TimeDelta we could add to a timestamp anyway
    if micros < 1.0 || micros > 1e17 {
        return None;
    }

    #[expect(clippy::cast_possible_truncation)]
    let micros = micros as i64;
    Some(TimeDelta::microseconds(micros))
}

/// Parse a boolean flag
///
/// `true/on/1/yes` and `false/off/0/no` (case-insensitive); numbers are true
/// when non-zero; anything else is false.
pub fn parse_bool(value: &ExpressionValue) -> bool {
    match value {
        ExpressionValue::Bool(flag) => *flag,
        ExpressionValue::Number(number) => *number != 0.0,
        ExpressionValue::Text(text) => matches!(
            text.trim().to_lowercase().as_str(),
            "true" | "on" | "1" | "yes"
        ),
    }
}

/// Parse a range boundary: a time of day on today's date or a full datetime
///
/// Returns `None` for absent, empty or unparseable values so the caller can
/// apply its default.
pub fn parse_boundary(
    value: Option<&ExpressionValue>,
    now: LocalDateTime,
    zone: &LocalZone,
) -> Option<LocalDateTime> {
    let text = value?.as_text()?.trim();
    if text.is_empty() {
        return None;
    }
    zone.parse_time_of_day(text, now)
        .or_else(|| zone.parse_datetime(text))
}

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

use serde::{Deserialize, Serialize};

// ============= Published State =============

/// One selected window as published in the `intervals` attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalAttribute {
    pub start: String,
    pub end: String,
    pub average: f64,
}

/// Attribute map published alongside the binary state
///
/// All timestamps are ISO-8601 strings in the local zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowAttributes {
    pub intervals: Vec<IntervalAttribute>,
    pub start_time: String,
    pub end_time: String,

    /// Requested duration in hours
    pub duration: f64,
    pub continuous: bool,
    pub next_start_time: Option<String>,
    pub average: Option<f64>,
    pub last_calculated: String,
}

/// The full published state of one price window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowState {
    pub is_on: bool,
    pub attributes: WindowAttributes,
}

impl WindowState {
    /// Home Assistant binary sensor state string
    pub fn state_str(&self) -> &'static str {
        if self.is_on { "on" } else { "off" }
    }
}

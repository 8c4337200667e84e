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


use thiserror::Error;

/// Why a recalculation pass ended without producing output
///
/// None of these are faults: the previously published state simply stays.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    #[error("Primary price series is empty")]
    EmptyPrimarySeries,

    #[error("Invalid duration: {raw:?}")]
    InvalidDuration { raw: Option<String> },

    #[error("Price source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Price source entity not found: {0}")]
    SourceMissing(String),
}

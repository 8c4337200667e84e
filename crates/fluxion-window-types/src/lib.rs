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

//! Shared data types for the FluxION price window engine.
//!
//! Everything in here is rebuilt from scratch on every recalculation pass;
//! none of these values are cached between triggers.

pub mod attributes;
pub mod pricing;
pub mod window;

// Re-export common types for convenience
pub use attributes::{IntervalAttribute, WindowAttributes, WindowState};
pub use pricing::{LocalDateTime, PricedInterval, Span};
pub use window::{EngineOutput, EvaluationRange, SelectedInterval, SelectionRequest, seconds_f64};

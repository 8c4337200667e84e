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


//! Price window resolution engine.
//!
//! Leaf-first: interval algebra, series normalization, forecast
//! reconciliation, window resolution and summarization, topped by the pure
//! [`recalculate`] entry point and the [`WindowSensor`] trigger adapter.

pub mod average;
pub mod config;
pub mod engine;
pub mod error;
pub mod expressions;
pub mod intervals;
pub mod normalizer;
pub mod reconciler;
pub mod resolver;
pub mod sensor;
pub mod summary;
pub mod time;
pub mod traits;

pub use config::{RenderedSettings, WindowConfig};
pub use engine::{Recalculation, recalculate};
pub use error::SkipReason;
pub use expressions::ExpressionValue;
pub use normalizer::PricePayload;
pub use sensor::{TriggerOutcome, WindowSensor};
pub use time::LocalZone;
pub use traits::{ExpressionRenderer, PriceAttributeSource, SourceSnapshot, WindowPublisher};

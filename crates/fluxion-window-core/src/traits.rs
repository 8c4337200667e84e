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


use anyhow::Result;
use async_trait::async_trait;
use fluxion_window_types::WindowState;
use serde_json::Value;

/// Attributes of a price entity together with its change marker
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSnapshot {
    /// Opaque provider attribute bag
    pub attributes: Value,

    /// Host-provided last change timestamp, used to detect updates
    pub last_updated: Option<String>,
}

/// Generic source for reading price entity attributes
#[async_trait]
pub trait PriceAttributeSource: Send + Sync {
    /// Read the current attributes of `entity_id`
    /// Returns `Ok(None)` if the entity does not exist
    async fn read_snapshot(&self, entity_id: &str) -> Result<Option<SourceSnapshot>>;

    /// Get data source name for logging
    fn name(&self) -> &str;
}

/// Renders configuration expressions (Jinja templates) on the host
#[async_trait]
pub trait ExpressionRenderer: Send + Sync {
    /// Render `expression` and return the raw output text
    async fn render(&self, expression: &str) -> Result<String>;

    fn name(&self) -> &str;
}

/// Publishes the computed window state to the host
#[async_trait]
pub trait WindowPublisher: Send + Sync {
    /// Write `state` under `entity_id` with `friendly_name` as display name
    async fn publish(&self, entity_id: &str, friendly_name: &str, state: &WindowState)
    -> Result<()>;

    fn name(&self) -> &str;
}

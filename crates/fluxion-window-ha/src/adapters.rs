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


use crate::client::HomeAssistantClient;
use crate::errors::HaError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use fluxion_window_core::{ExpressionRenderer, PriceAttributeSource, SourceSnapshot, WindowPublisher};
use fluxion_window_types::WindowState;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

// ============= Price Source Adapter =============

/// Reads price entity attributes from Home Assistant
#[derive(Debug, Clone)]
pub struct HaPriceAttributeSource {
    client: Arc<HomeAssistantClient>,
}

impl HaPriceAttributeSource {
    pub fn new(client: Arc<HomeAssistantClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PriceAttributeSource for HaPriceAttributeSource {
    async fn read_snapshot(&self, entity_id: &str) -> Result<Option<SourceSnapshot>> {
        debug!("💰 [ADAPTER] Reading price attributes from: {}", entity_id);

        let state = match self.client.get_state(entity_id).await {
            Ok(state) => state,
            Err(HaError::EntityNotFound(_)) => return Ok(None),
            Err(e) => {
                return Err(anyhow::anyhow!(e))
                    .with_context(|| format!("Failed to read price entity: {entity_id}"));
            }
        };

        if let Some(obj) = state.attributes.as_object() {
            debug!("   Attributes keys: {:?}", obj.keys().collect::<Vec<_>>());
        }

        Ok(Some(SourceSnapshot {
            attributes: state.attributes,
            last_updated: Some(state.last_updated).filter(|stamp| !stamp.is_empty()),
        }))
    }

    fn name(&self) -> &str {
        "Home Assistant price entity"
    }
}

// ============= Template Renderer Adapter =============

/// Renders configuration templates through `/api/template`
#[derive(Debug, Clone)]
pub struct HaTemplateRenderer {
    client: Arc<HomeAssistantClient>,
}

impl HaTemplateRenderer {
    pub fn new(client: Arc<HomeAssistantClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ExpressionRenderer for HaTemplateRenderer {
    async fn render(&self, expression: &str) -> Result<String> {
        self.client
            .render_template(expression)
            .await
            .map_err(|e| anyhow::anyhow!(e))
            .with_context(|| format!("Failed to render template: {expression}"))
    }

    fn name(&self) -> &str {
        "Home Assistant template API"
    }
}

// ============= Window Publisher Adapter =============

/// Publishes the window as a `binary_sensor` state
#[derive(Debug, Clone)]
pub struct HaWindowPublisher {
    client: Arc<HomeAssistantClient>,
}

impl HaWindowPublisher {
    pub fn new(client: Arc<HomeAssistantClient>) -> Self {
        Self { client }
    }

    /// Window attributes plus the HA display attributes
    fn attributes(friendly_name: &str, state: &WindowState) -> Result<Value> {
        let mut attributes =
            serde_json::to_value(&state.attributes).context("Failed to serialize attributes")?;
        if let Some(obj) = attributes.as_object_mut() {
            obj.insert("friendly_name".to_owned(), Value::from(friendly_name));
            obj.insert("icon".to_owned(), Value::from("mdi:clock-start"));
        }
        Ok(attributes)
    }
}

#[async_trait]
impl WindowPublisher for HaWindowPublisher {
    async fn publish(&self, entity_id: &str, friendly_name: &str, state: &WindowState) -> Result<()> {
        let attributes = Self::attributes(friendly_name, state)?;

        self.client
            .set_state(entity_id, state.state_str(), attributes)
            .await
            .map_err(|e| anyhow::anyhow!(e))
            .with_context(|| format!("Failed to publish window state: {entity_id}"))?;

        info!("📤 [ADAPTER] Published {} = {}", entity_id, state.state_str());
        Ok(())
    }

    fn name(&self) -> &str {
        "Home Assistant state API"
    }
}

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

/// Entity state as returned by `GET /api/states/<entity_id>`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HaEntityState {
    pub entity_id: String,
    pub state: String,
    #[serde(default)]
    pub attributes: serde_json::Value,
    #[serde(default)]
    pub last_changed: String,
    #[serde(default)]
    pub last_updated: String,
}

/// Body of `POST /api/states/<entity_id>`
#[derive(Debug, Clone, Serialize)]
pub struct HaStateUpdate<'a> {
    pub state: &'a str,
    pub attributes: serde_json::Value,
}

/// Body of `POST /api/template`
#[derive(Debug, Clone, Serialize)]
pub struct HaTemplateRequest<'a> {
    pub template: &'a str,
}

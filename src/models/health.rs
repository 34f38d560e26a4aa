// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Identity reported by the engine's info endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EngineInfo {
    pub cluster_name: String,
    pub version: String,
}

/// Health probe result.
///
/// Always served with 200; `status` tells whether the engine answered.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HealthResponse {
    Healthy { elasticsearch: EngineInfo },
    Unhealthy { error: String },
}

/// Service banner served at `/`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RootResponse {
    pub message: String,
    pub docs: String,
    pub health: String,
}

// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! The seam between this service and the external search engine.
//!
//! Everything behind [`SearchEngine`] speaks the engine's own wire shapes
//! (`serde_json::Value` request bodies, [`RawSearchResponse`] results).
//! Translation to and from the public API models happens in
//! `services::query`, `services::normalize` and `services::search`.

use crate::models::document::DocumentBody;
use crate::models::health::EngineInfo;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Failures reported while talking to the engine.
///
/// Absence of a document is not represented here; see the `Option`/`bool`
/// return values on [`SearchEngine`].
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Search engine unreachable: {0}")]
    Unreachable(String),

    #[error("Index '{0}' already exists")]
    IndexAlreadyExists(String),

    #[error("Index '{index}' has an incompatible mapping: {detail}")]
    MappingConflict { index: String, detail: String },

    #[error("Invalid search request: {0}")]
    InvalidRequest(String),

    #[error("Search engine error ({status}): {reason}")]
    Engine { status: u16, reason: String },

    #[error("Failed to encode search engine request: {0}")]
    Encode(String),

    #[error("Unexpected search engine response: {0}")]
    Decode(String),
}

impl EngineError {
    pub fn is_unreachable(&self) -> bool {
        matches!(self, EngineError::Unreachable(_))
    }
}

/// Raw search response, as returned by the engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSearchResponse {
    #[serde(default)]
    pub took: u64,
    #[serde(default)]
    pub hits: RawHits,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawHits {
    #[serde(default)]
    pub total: Option<RawTotal>,
    #[serde(default)]
    pub max_score: Option<f64>,
    #[serde(default)]
    pub hits: Vec<RawHit>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTotal {
    pub value: u64,
    /// "eq" for exact counts, "gte" when the engine capped the count
    #[serde(default)]
    pub relation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawHit {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_score", default)]
    pub score: Option<f64>,
    #[serde(rename = "_source", default)]
    pub source: DocumentBody,
}

/// Outcome of a batched write
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkResponse {
    /// True when any item in the batch failed
    #[serde(default)]
    pub errors: bool,
    /// Per-item results, in submission order
    #[serde(default)]
    pub items: Vec<Value>,
}

/// Declared field types of an index, keyed by field name.
pub type FieldMappings = HashMap<String, String>;

/// Operations this service needs from a search engine.
///
/// Implementations must be safe to share between concurrent requests; a single
/// instance is created at startup and handed around as `Arc<dyn SearchEngine>`.
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Liveness probe. `Ok(false)` means the engine answered but is not ready.
    async fn ping(&self) -> Result<bool, EngineError>;

    async fn info(&self) -> Result<EngineInfo, EngineError>;

    async fn index_exists(&self, index: &str) -> Result<bool, EngineError>;

    /// Create an index from a settings + mappings body.
    /// Must return [`EngineError::IndexAlreadyExists`] when it lost a creation race.
    async fn create_index(&self, index: &str, body: &Value) -> Result<(), EngineError>;

    async fn field_mappings(&self, index: &str) -> Result<FieldMappings, EngineError>;

    /// Store `body` under `id` (replacing any previous body), or under an
    /// engine-generated key when `id` is `None`. Returns the key.
    async fn index_document(
        &self,
        index: &str,
        id: Option<&str>,
        body: &Value,
    ) -> Result<String, EngineError>;

    /// Submit action/source pairs as one batch.
    async fn bulk(&self, operations: &[Value]) -> Result<BulkResponse, EngineError>;

    async fn get_document(&self, index: &str, id: &str)
        -> Result<Option<DocumentBody>, EngineError>;

    /// Merge `fields` into the stored body. `Ok(false)` when the document is absent.
    async fn update_document(
        &self,
        index: &str,
        id: &str,
        fields: &DocumentBody,
    ) -> Result<bool, EngineError>;

    /// `Ok(false)` when the document is absent.
    async fn delete_document(&self, index: &str, id: &str) -> Result<bool, EngineError>;

    async fn search(&self, index: &str, body: &Value) -> Result<RawSearchResponse, EngineError>;
}

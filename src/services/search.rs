// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::models::document::{Document, DocumentBody};
use crate::models::health::EngineInfo;
use crate::models::search::{SearchQuery, SearchResponse};
use crate::services::engine::{EngineError, SearchEngine};
use crate::services::normalize::normalize;
use crate::services::query::build_search_body;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

/// Field types every managed index must declare.
pub const EXPECTED_FIELDS: [(&str, &str); 3] = [
    ("title", "text"),
    ("content", "text"),
    ("created_at", "date"),
];

/// Settings and mappings used when creating an index
pub fn index_definition() -> Value {
    let properties: serde_json::Map<String, Value> = EXPECTED_FIELDS
        .iter()
        .map(|(field, kind)| (field.to_string(), json!({ "type": kind })))
        .collect();

    json!({
        "settings": {
            "number_of_shards": 1,
            "number_of_replicas": 0,
        },
        "mappings": {
            "properties": properties,
        },
    })
}

fn to_body<T: Serialize>(value: &T) -> Result<Value, EngineError> {
    serde_json::to_value(value).map_err(|e| EngineError::Encode(e.to_string()))
}

/// What `ensure_index` found or did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexStatus {
    Created,
    AlreadyExists,
}

/// Result of a bulk write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkOutcome {
    /// Number of documents submitted
    pub indexed: usize,
    /// True when any item in the batch failed
    pub errors: bool,
    /// Document keys in submission order, including generated ones
    pub ids: Vec<String>,
}

/// Document and search operations against a single engine connection.
///
/// Every operation takes an optional index name and falls back to the
/// client's default index.
pub struct SearchClient {
    engine: Arc<dyn SearchEngine>,
    index_name: String,
}

impl SearchClient {
    pub fn new(engine: Arc<dyn SearchEngine>, index_name: impl Into<String>) -> Self {
        Self {
            engine,
            index_name: index_name.into(),
        }
    }

    /// Like [`SearchClient::new`], but fails unless the engine answers a liveness probe.
    pub async fn connect(
        engine: Arc<dyn SearchEngine>,
        index_name: impl Into<String>,
    ) -> Result<Self, EngineError> {
        let client = Self::new(engine, index_name);
        client.check_alive().await?;
        tracing::info!("Connected to search engine");
        Ok(client)
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    fn resolve<'a>(&'a self, index: Option<&'a str>) -> &'a str {
        index.unwrap_or(&self.index_name)
    }

    async fn check_alive(&self) -> Result<(), EngineError> {
        if self.engine.ping().await? {
            Ok(())
        } else {
            Err(EngineError::Unreachable(
                "search engine is not responding".to_string(),
            ))
        }
    }

    /// Engine identity, for health checks
    pub async fn info(&self) -> Result<EngineInfo, EngineError> {
        self.engine.info().await
    }

    /// Make sure the index exists with the expected field mapping.
    ///
    /// Idempotent: losing a creation race to another caller counts as success.
    /// An existing index that declares one of the expected fields with a different
    /// type is reported as [`EngineError::MappingConflict`].
    pub async fn ensure_index(&self, index: Option<&str>) -> Result<IndexStatus, EngineError> {
        let index = self.resolve(index);
        self.check_alive().await?;

        if !self.engine.index_exists(index).await? {
            match self.engine.create_index(index, &index_definition()).await {
                Ok(()) => {
                    tracing::info!(index, "Index created");
                    return Ok(IndexStatus::Created);
                }
                Err(EngineError::IndexAlreadyExists(_)) => {
                    tracing::info!(index, "Index created concurrently by another caller");
                }
                Err(e) => {
                    tracing::error!(index, error = %e, "Failed to create index");
                    return Err(e);
                }
            }
        } else {
            tracing::info!(index, "Index already exists");
        }

        self.verify_mapping(index).await?;
        Ok(IndexStatus::AlreadyExists)
    }

    async fn verify_mapping(&self, index: &str) -> Result<(), EngineError> {
        let mappings = self.engine.field_mappings(index).await?;

        for (field, expected) in EXPECTED_FIELDS {
            // Undeclared fields are left to dynamic mapping
            if let Some(actual) = mappings.get(field) {
                if actual != expected {
                    return Err(EngineError::MappingConflict {
                        index: index.to_string(),
                        detail: format!("field '{field}' is '{actual}', expected '{expected}'"),
                    });
                }
            }
        }
        Ok(())
    }

    /// Index a single document and return its key.
    ///
    /// A caller-supplied id that already exists has its body fully replaced.
    pub async fn index_document(
        &self,
        document: Document,
        index: Option<&str>,
    ) -> Result<String, EngineError> {
        let index = self.resolve(index);
        let (id, body) = document.into_parts();
        let body = to_body(&body)?;

        let id = self
            .engine
            .index_document(index, id.as_deref(), &body)
            .await
            .inspect_err(|e| tracing::error!(index, error = %e, "Error indexing document"))?;

        tracing::info!(index, id = %id, "Document indexed");
        Ok(id)
    }

    /// Index documents in one batch, generating a UUID for each document without an id.
    pub async fn bulk_index(
        &self,
        documents: Vec<Document>,
        index: Option<&str>,
    ) -> Result<BulkOutcome, EngineError> {
        let index = self.resolve(index);
        if documents.is_empty() {
            return Ok(BulkOutcome {
                indexed: 0,
                errors: false,
                ids: Vec::new(),
            });
        }

        let mut ids = Vec::with_capacity(documents.len());
        let mut operations = Vec::with_capacity(documents.len() * 2);
        for document in documents {
            let (id, body) = document.into_parts();
            let id = id.unwrap_or_else(|| Uuid::new_v4().to_string());
            operations.push(json!({ "index": { "_index": index, "_id": id } }));
            operations.push(to_body(&body)?);
            ids.push(id);
        }

        let response = self
            .engine
            .bulk(&operations)
            .await
            .inspect_err(|e| tracing::error!(index, error = %e, "Error bulk indexing"))?;

        if response.errors {
            tracing::warn!(index, count = ids.len(), "Bulk indexing reported item failures");
        } else {
            tracing::info!(index, count = ids.len(), "Bulk indexed documents");
        }

        Ok(BulkOutcome {
            indexed: ids.len(),
            errors: response.errors,
            ids,
        })
    }

    /// Search with a validated query
    pub async fn search(
        &self,
        query: &SearchQuery,
        index: Option<&str>,
    ) -> Result<SearchResponse, EngineError> {
        let index = self.resolve(index);
        let body = build_search_body(query)?;

        let raw = self
            .engine
            .search(index, &body)
            .await
            .inspect_err(|e| tracing::error!(index, error = %e, "Error searching"))?;

        Ok(normalize(raw))
    }

    /// Fetch a stored body. `Ok(None)` when the document does not exist.
    pub async fn get_document(
        &self,
        id: &str,
        index: Option<&str>,
    ) -> Result<Option<DocumentBody>, EngineError> {
        let index = self.resolve(index);
        let found = self
            .engine
            .get_document(index, id)
            .await
            .inspect_err(|e| tracing::error!(index, id, error = %e, "Error getting document"))?;

        if found.is_none() {
            tracing::debug!(index, id, "Document not found");
        }
        Ok(found)
    }

    /// Merge `fields` into an existing document. `Ok(false)` when it does not exist.
    pub async fn update_document(
        &self,
        id: &str,
        fields: &DocumentBody,
        index: Option<&str>,
    ) -> Result<bool, EngineError> {
        let index = self.resolve(index);
        let updated = self
            .engine
            .update_document(index, id, fields)
            .await
            .inspect_err(|e| tracing::error!(index, id, error = %e, "Error updating document"))?;

        if updated {
            tracing::info!(index, id, "Document updated");
        } else {
            tracing::debug!(index, id, "Update target not found");
        }
        Ok(updated)
    }

    /// Remove a document. `Ok(false)` when it does not exist.
    pub async fn delete_document(&self, id: &str, index: Option<&str>) -> Result<bool, EngineError> {
        let index = self.resolve(index);
        let deleted = self
            .engine
            .delete_document(index, id)
            .await
            .inspect_err(|e| tracing::error!(index, id, error = %e, "Error deleting document"))?;

        if deleted {
            tracing::info!(index, id, "Document deleted");
        } else {
            tracing::debug!(index, id, "Delete target not found");
        }
        Ok(deleted)
    }
}

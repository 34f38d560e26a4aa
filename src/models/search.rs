// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::models::document::DocumentBody;
use crate::models::error::{Validate, ValidationError};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const MIN_PAGE_SIZE: u32 = 1;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Request to search indexed documents
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SearchQuery {
    /// Free-text query
    pub query: String,
    /// Fields to match against, in order (default: title, content)
    #[serde(default = "default_fields")]
    pub fields: Vec<String>,
    /// Page size, 1..=100 (default: 10)
    #[serde(default = "default_size")]
    pub size: u32,
    /// Pagination offset (default: 0)
    #[serde(default, rename = "from", alias = "from_")]
    pub offset: u32,
}

fn default_fields() -> Vec<String> {
    vec!["title".to_string(), "content".to_string()]
}

fn default_size() -> u32 {
    10
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            fields: default_fields(),
            size: default_size(),
            offset: 0,
        }
    }

    pub fn with_page(mut self, offset: u32, size: u32) -> Self {
        self.offset = offset;
        self.size = size;
        self
    }

    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }
}

impl Validate for SearchQuery {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.query.is_empty() {
            return Err(ValidationError::new("query", "must not be empty"));
        }
        if self.fields.is_empty() {
            return Err(ValidationError::new("fields", "must name at least one field"));
        }
        if self.fields.iter().any(|f| f.is_empty()) {
            return Err(ValidationError::new("fields", "field names must not be empty"));
        }
        if !(MIN_PAGE_SIZE..=MAX_PAGE_SIZE).contains(&self.size) {
            return Err(ValidationError::new(
                "size",
                format!("must be between {MIN_PAGE_SIZE} and {MAX_PAGE_SIZE}"),
            ));
        }
        Ok(())
    }
}

/// A single ranked match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SearchHit {
    /// Engine-assigned document key
    pub id: String,
    /// Relevance score on the engine's own scale
    pub score: f64,
    /// Stored document body, unprojected
    #[schema(value_type = Object)]
    pub source: DocumentBody,
}

/// Search response containing results and metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SearchResponse {
    /// Total number of matching documents, not just this page
    pub total: u64,
    /// Highest score among all matches; null when nothing matched
    pub max_score: Option<f64>,
    /// Hits in engine order (descending relevance)
    pub hits: Vec<SearchHit>,
    /// Engine execution time in milliseconds
    pub took: u64,
}

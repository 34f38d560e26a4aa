// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::models::error::{Validate, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// Maximum title length, counted in characters.
pub const TITLE_MAX_LEN: usize = 500;

/// Free-form stored document body, as returned by the engine.
pub type DocumentBody = Map<String, Value>;

/// Indexable unit accepted by the create and bulk-create endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Document {
    /// Caller-controlled document key. Generated by the engine (or by bulk
    /// indexing) when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub content: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

/// The part of a [`Document`] that is stored as the engine body.
/// The id travels as the document key, never as a body field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Document {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Split into the document key and the body sent to the engine.
    pub fn into_parts(self) -> (Option<String>, StoredDocument) {
        (
            self.id,
            StoredDocument {
                title: self.title,
                content: self.content,
                created_at: self.created_at,
            },
        )
    }
}

fn check_title(title: &str) -> Result<(), ValidationError> {
    if title.is_empty() {
        return Err(ValidationError::new("title", "must not be empty"));
    }
    if title.chars().count() > TITLE_MAX_LEN {
        return Err(ValidationError::new(
            "title",
            format!("must be at most {TITLE_MAX_LEN} characters"),
        ));
    }
    Ok(())
}

fn check_content(content: &str) -> Result<(), ValidationError> {
    if content.is_empty() {
        return Err(ValidationError::new("content", "must not be empty"));
    }
    Ok(())
}

impl Validate for Document {
    fn validate(&self) -> Result<(), ValidationError> {
        check_title(&self.title)?;
        check_content(&self.content)?;
        match self.id.as_deref() {
            Some("") => {
                return Err(ValidationError::new("id", "must not be empty when supplied"));
            }
            // Not representable as a URL path segment
            Some("." | "..") => {
                return Err(ValidationError::new("id", "must not be '.' or '..'"));
            }
            _ => {}
        }
        Ok(())
    }
}

impl Validate for Vec<Document> {
    fn validate(&self) -> Result<(), ValidationError> {
        for (position, document) in self.iter().enumerate() {
            document.validate().map_err(|e| {
                ValidationError::new("documents", format!("item {position}: {e}"))
            })?;
        }
        Ok(())
    }
}

/// Partial updates may carry any fields, but the declared ones keep their constraints.
impl Validate for DocumentBody {
    fn validate(&self) -> Result<(), ValidationError> {
        for (field, check) in [
            ("title", check_title as fn(&str) -> Result<(), ValidationError>),
            ("content", check_content),
        ] {
            match self.get(field) {
                None => {}
                Some(Value::String(s)) => check(s)?,
                Some(_) => return Err(ValidationError::new(field, "must be a string")),
            }
        }
        if let Some(created_at) = self.get("created_at") {
            let parses = created_at
                .as_str()
                .is_some_and(|s| DateTime::parse_from_rfc3339(s).is_ok());
            if !parses {
                return Err(ValidationError::new(
                    "created_at",
                    "must be an RFC 3339 timestamp",
                ));
            }
        }
        Ok(())
    }
}

/// Response after creating a single document
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateDocumentResponse {
    pub id: String,
    pub message: String,
}

/// Response after bulk indexing
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BulkIndexResponse {
    /// Number of documents submitted in the batch
    pub indexed: usize,
    /// True when at least one item in the batch failed
    pub errors: bool,
    /// Keys of the submitted documents, in request order
    pub ids: Vec<String>,
    pub message: String,
}

/// Generic acknowledgement
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

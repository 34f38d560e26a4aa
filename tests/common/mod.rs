// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

// Shared by several test binaries; each uses a different subset.
#![allow(dead_code)]

use async_trait::async_trait;
use docsearch::models::document::DocumentBody;
use docsearch::models::health::EngineInfo;
use docsearch::services::engine::{
    BulkResponse, EngineError, FieldMappings, RawHit, RawHits, RawSearchResponse, RawTotal,
    SearchEngine,
};
use docsearch::services::search::SearchClient;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

pub const TEST_INDEX: &str = "documents";

#[derive(Default)]
struct MemoryIndex {
    mappings: FieldMappings,
    docs: BTreeMap<String, DocumentBody>,
}

/// In-process stand-in for the search engine.
///
/// Matching is a rough imitation of a fuzzy multi-match: lowercase word tokens,
/// a query term matches a token within the AUTO edit distance (0 edits up to
/// 2 chars, 1 up to 5, otherwise 2), and a document scores the best per-field
/// count of matched terms.
#[derive(Default)]
pub struct MemoryEngine {
    indices: Mutex<HashMap<String, MemoryIndex>>,
    down: AtomicBool,
    failing: AtomicBool,
    lose_create_race: AtomicBool,
    next_id: AtomicU64,
    create_calls: AtomicU64,
    last_search: Mutex<Option<Value>>,
    rejected_bulk_item: Mutex<Option<usize>>,
}

impl MemoryEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Simulate a dead cluster: every call fails as unreachable.
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    /// Every data call answers with an engine-side 500.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// The next `create_index` finds that someone else created the index first.
    pub fn lose_next_create_race(&self) {
        self.lose_create_race.store(true, Ordering::SeqCst);
    }

    /// The item at `position` of the next bulk request is rejected; the rest are stored.
    pub fn reject_bulk_item(&self, position: usize) {
        *self.rejected_bulk_item.lock().unwrap() = Some(position);
    }

    pub fn create_calls(&self) -> u64 {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn last_search(&self) -> Option<Value> {
        self.last_search.lock().unwrap().clone()
    }

    pub fn mappings(&self, index: &str) -> Option<FieldMappings> {
        self.indices
            .lock()
            .unwrap()
            .get(index)
            .map(|i| i.mappings.clone())
    }

    /// Create an index directly, bypassing the client.
    pub fn seed_index(&self, index: &str, mappings: &[(&str, &str)]) {
        let mut indices = self.indices.lock().unwrap();
        let entry = indices.entry(index.to_string()).or_default();
        for (field, kind) in mappings {
            entry.mappings.insert(field.to_string(), kind.to_string());
        }
    }

    fn check(&self) -> Result<(), EngineError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(EngineError::Unreachable("connection refused".to_string()));
        }
        Ok(())
    }

    fn check_data(&self) -> Result<(), EngineError> {
        self.check()?;
        if self.failing.load(Ordering::SeqCst) {
            return Err(EngineError::Engine {
                status: 500,
                reason: "simulated failure".to_string(),
            });
        }
        Ok(())
    }

    fn generate_id(&self) -> String {
        format!("mem-{}", self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn store(&self, index: &str, id: String, body: &Value) -> Result<String, EngineError> {
        let body = body
            .as_object()
            .cloned()
            .ok_or_else(|| EngineError::InvalidRequest("body must be an object".to_string()))?;
        let mut indices = self.indices.lock().unwrap();
        indices
            .entry(index.to_string())
            .or_default()
            .docs
            .insert(id.clone(), body);
        Ok(id)
    }
}

fn auto_fuzziness(term: &str) -> usize {
    match term.chars().count() {
        0..=2 => 0,
        3..=5 => 1,
        _ => 2,
    }
}

fn tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn field_score(terms: &[String], value: Option<&Value>) -> usize {
    let Some(Value::String(text)) = value else {
        return 0;
    };
    let words = tokens(text);
    terms
        .iter()
        .filter(|term| {
            words
                .iter()
                .any(|word| strsim::levenshtein(term, word) <= auto_fuzziness(term))
        })
        .count()
}

#[async_trait]
impl SearchEngine for MemoryEngine {
    async fn ping(&self) -> Result<bool, EngineError> {
        self.check()?;
        Ok(true)
    }

    async fn info(&self) -> Result<EngineInfo, EngineError> {
        self.check()?;
        Ok(EngineInfo {
            cluster_name: "memory-cluster".to_string(),
            version: "8.15.0".to_string(),
        })
    }

    async fn index_exists(&self, index: &str) -> Result<bool, EngineError> {
        self.check()?;
        Ok(self.indices.lock().unwrap().contains_key(index))
    }

    async fn create_index(&self, index: &str, body: &Value) -> Result<(), EngineError> {
        self.check()?;
        self.create_calls.fetch_add(1, Ordering::SeqCst);

        let mappings: FieldMappings = body
            .pointer("/mappings/properties")
            .and_then(Value::as_object)
            .map(|props| {
                props
                    .iter()
                    .map(|(field, spec)| {
                        let kind = spec["type"].as_str().unwrap_or("object").to_string();
                        (field.clone(), kind)
                    })
                    .collect()
            })
            .unwrap_or_default();

        let mut indices = self.indices.lock().unwrap();
        if self.lose_create_race.swap(false, Ordering::SeqCst) {
            // The competing caller used the same definition
            indices.insert(
                index.to_string(),
                MemoryIndex {
                    mappings,
                    docs: BTreeMap::new(),
                },
            );
            return Err(EngineError::IndexAlreadyExists(index.to_string()));
        }
        if indices.contains_key(index) {
            return Err(EngineError::IndexAlreadyExists(index.to_string()));
        }
        indices.insert(
            index.to_string(),
            MemoryIndex {
                mappings,
                docs: BTreeMap::new(),
            },
        );
        Ok(())
    }

    async fn field_mappings(&self, index: &str) -> Result<FieldMappings, EngineError> {
        self.check()?;
        self.indices
            .lock()
            .unwrap()
            .get(index)
            .map(|i| i.mappings.clone())
            .ok_or_else(|| EngineError::Engine {
                status: 404,
                reason: format!("index_not_found_exception: no such index [{index}]"),
            })
    }

    async fn index_document(
        &self,
        index: &str,
        id: Option<&str>,
        body: &Value,
    ) -> Result<String, EngineError> {
        self.check_data()?;
        let id = id.map(str::to_string).unwrap_or_else(|| self.generate_id());
        self.store(index, id, body)
    }

    async fn bulk(&self, operations: &[Value]) -> Result<BulkResponse, EngineError> {
        self.check_data()?;
        let rejected = self.rejected_bulk_item.lock().unwrap().take();
        let mut errors = false;
        let mut items = Vec::new();
        for (position, pair) in operations.chunks(2).enumerate() {
            let [action, body] = pair else {
                return Err(EngineError::InvalidRequest(
                    "bulk body must be action/source pairs".to_string(),
                ));
            };
            let meta = &action["index"];
            let index = meta["_index"].as_str().unwrap_or(TEST_INDEX).to_string();
            let id = meta["_id"]
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| self.generate_id());
            if rejected == Some(position) {
                errors = true;
                items.push(json!({"index": {
                    "_index": index,
                    "_id": id,
                    "status": 400,
                    "error": {
                        "type": "document_parsing_exception",
                        "reason": "failed to parse field [created_at]",
                    },
                }}));
                continue;
            }
            let id = self.store(&index, id, body)?;
            items.push(json!({"index": {"_index": index, "_id": id, "status": 201}}));
        }
        Ok(BulkResponse { errors, items })
    }

    async fn get_document(
        &self,
        index: &str,
        id: &str,
    ) -> Result<Option<DocumentBody>, EngineError> {
        self.check_data()?;
        Ok(self
            .indices
            .lock()
            .unwrap()
            .get(index)
            .and_then(|i| i.docs.get(id).cloned()))
    }

    async fn update_document(
        &self,
        index: &str,
        id: &str,
        fields: &DocumentBody,
    ) -> Result<bool, EngineError> {
        self.check_data()?;
        let mut indices = self.indices.lock().unwrap();
        let Some(doc) = indices.get_mut(index).and_then(|i| i.docs.get_mut(id)) else {
            return Ok(false);
        };
        for (key, value) in fields {
            doc.insert(key.clone(), value.clone());
        }
        Ok(true)
    }

    async fn delete_document(&self, index: &str, id: &str) -> Result<bool, EngineError> {
        self.check_data()?;
        Ok(self
            .indices
            .lock()
            .unwrap()
            .get_mut(index)
            .and_then(|i| i.docs.remove(id))
            .is_some())
    }

    async fn search(&self, index: &str, body: &Value) -> Result<RawSearchResponse, EngineError> {
        self.check_data()?;
        *self.last_search.lock().unwrap() = Some(body.clone());

        let multi_match = &body["query"]["multi_match"];
        let terms = tokens(multi_match["query"].as_str().unwrap_or_default());
        let fields: Vec<&str> = multi_match["fields"]
            .as_array()
            .map(|f| f.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        let from = body["from"].as_u64().unwrap_or(0) as usize;
        let size = body["size"].as_u64().unwrap_or(10) as usize;

        let indices = self.indices.lock().unwrap();
        let mut matches: Vec<(f64, String, DocumentBody)> = indices
            .get(index)
            .map(|i| {
                i.docs
                    .iter()
                    .filter_map(|(id, doc)| {
                        let best = fields
                            .iter()
                            .map(|field| field_score(&terms, doc.get(*field)))
                            .max()
                            .unwrap_or(0);
                        (best > 0).then(|| (best as f64, id.clone(), doc.clone()))
                    })
                    .collect()
            })
            .unwrap_or_default();

        matches.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

        let total = matches.len() as u64;
        let max_score = matches.first().map(|m| m.0);
        let hits = matches
            .into_iter()
            .skip(from)
            .take(size)
            .map(|(score, id, source)| RawHit {
                id,
                score: Some(score),
                source,
            })
            .collect();

        Ok(RawSearchResponse {
            took: 1,
            hits: RawHits {
                total: Some(RawTotal {
                    value: total,
                    relation: Some("eq".to_string()),
                }),
                max_score,
                hits,
            },
        })
    }
}

/// A client over a fresh in-memory engine whose default index already exists.
pub async fn test_client() -> (Arc<MemoryEngine>, SearchClient) {
    let engine = MemoryEngine::new();
    let client = SearchClient::new(engine.clone(), TEST_INDEX);
    client
        .ensure_index(None)
        .await
        .expect("Failed to create test index");
    (engine, client)
}

// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Translation of a [`SearchQuery`] into an engine query body.

use crate::models::search::SearchQuery;
use crate::services::engine::EngineError;
use serde_json::{json, Value};

/// Edit-distance tolerance scaled by term length, computed by the engine.
pub const FUZZINESS: &str = "AUTO";

/// Build a best-fields multi-match body with fuzzy matching, pagination and an
/// exact total-hit count.
///
/// Page bounds are taken as given; the API layer validates them. An empty
/// field list is refused.
pub fn build_search_body(query: &SearchQuery) -> Result<Value, EngineError> {
    if query.fields.is_empty() {
        return Err(EngineError::InvalidRequest(
            "at least one search field is required".to_string(),
        ));
    }

    Ok(json!({
        "query": {
            "multi_match": {
                "query": query.query,
                "fields": query.fields,
                "type": "best_fields",
                "fuzziness": FUZZINESS,
            }
        },
        "from": query.offset,
        "size": query.size,
        "track_total_hits": true,
    }))
}

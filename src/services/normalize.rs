// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::models::search::{SearchHit, SearchResponse};
use crate::services::engine::{RawHit, RawSearchResponse};

/// Reshape a raw engine response into the public [`SearchResponse`].
///
/// Pure structural transform: hit order, scores and timings are kept as the
/// engine reported them.
pub fn normalize(raw: RawSearchResponse) -> SearchResponse {
    let hits: Vec<SearchHit> = raw.hits.hits.into_iter().map(to_hit).collect();

    let total = raw
        .hits
        .total
        .map(|t| t.value)
        .unwrap_or(hits.len() as u64);

    SearchResponse {
        total,
        max_score: raw.hits.max_score,
        hits,
        took: raw.took,
    }
}

fn to_hit(hit: RawHit) -> SearchHit {
    SearchHit {
        id: hit.id,
        score: hit.score.unwrap_or(0.0),
        source: hit.source,
    }
}

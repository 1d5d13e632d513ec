use crate::error::ServerResult;
use crate::state::{IndexKind, SearchService, Target};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use fingerprint::Fingerprint;
use index::SearchHits;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Search request body.
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    /// Query fingerprint as raw bit indices.
    pub fingerprint: Vec<i64>,

    /// Optional cap on the number of returned matches.
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Search response.
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub total: usize,
    /// Plain ids or `{id, score}` pairs, per the index's build-time mode.
    pub matches: SearchHits,
}

/// Query one of the four indexes (POST /{index_type}/{target}).
///
/// The path segments are parsed into [`IndexKind`] and [`Target`]; unknown
/// segments never reach an index. The fingerprint is validated before the
/// lookup, so a negative bit id is a client error, not a miss.
pub async fn search_index(
    State(state): State<Arc<SearchService>>,
    Path((kind, target)): Path<(IndexKind, Target)>,
    Json(request): Json<SearchRequest>,
) -> ServerResult<impl IntoResponse> {
    let query = Fingerprint::try_from_raw(&request.fingerprint)?;

    let started = Instant::now();
    let mut hits = state.search(kind, target, &query);
    if let Some(limit) = request.limit {
        hits.truncate(limit);
    }

    let kind_label = label(kind);
    let target_label = label_target(target);
    metrics::counter!("search_requests_total", "kind" => kind_label, "target" => target_label)
        .increment(1);
    metrics::histogram!("search_duration_seconds", "kind" => kind_label, "target" => target_label)
        .record(started.elapsed().as_secs_f64());

    tracing::debug!(
        kind = kind_label,
        target = target_label,
        query_bits = query.len(),
        matches = hits.len(),
        "search served"
    );

    Ok(Json(SearchResponse {
        total: hits.len(),
        matches: hits,
    }))
}

fn label(kind: IndexKind) -> &'static str {
    match kind {
        IndexKind::Substructure => "substructure",
        IndexKind::Similarity => "similarity",
    }
}

fn label_target(target: Target) -> &'static str {
    match target {
        Target::Molecule => "molecule",
        Target::Reaction => "reaction",
    }
}

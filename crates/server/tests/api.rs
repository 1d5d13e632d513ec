//! HTTP-level tests for the query daemon: routing, request validation, and
//! the JSON contract of the search endpoint.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::util::ServiceExt;

use index::{snapshot, IndexBuilder, RawRecord, SimilarityConfig, SubstructureConfig};
use server::{build_router, SearchService, ServerConfig};

fn sample_records() -> Vec<RawRecord> {
    vec![
        RawRecord::new(1, vec![1, 2, 3]),
        RawRecord::new(2, vec![2, 3, 4]),
        RawRecord::new(3, vec![1, 2, 3, 4, 5]),
    ]
}

fn test_service() -> Arc<SearchService> {
    let builder = IndexBuilder::new();
    let similarity_cfg = SimilarityConfig::new()
        .with_threshold(0.2)
        .with_check_threshold(Some(0.5));

    let service = SearchService::from_parts(
        ServerConfig::default(),
        builder
            .build_substructure(SubstructureConfig::default(), sample_records())
            .unwrap(),
        builder
            .build_substructure(SubstructureConfig::default(), vec![])
            .unwrap(),
        builder
            .build_similarity(similarity_cfg, sample_records())
            .unwrap(),
        builder.build_similarity(similarity_cfg, vec![]).unwrap(),
    );
    Arc::new(service)
}

async fn post_json(app: axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn substructure_search_returns_matching_ids() {
    let app = build_router(test_service());
    let (status, body) = post_json(
        app,
        "/substructure/molecule",
        json!({ "fingerprint": [2, 3] }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 3);
    assert_eq!(body["matches"], json!([1, 2, 3]));
}

#[tokio::test]
async fn similarity_search_returns_scored_matches() {
    let app = build_router(test_service());
    let (status, body) = post_json(
        app,
        "/similarity/molecule",
        json!({ "fingerprint": [2, 3, 4] }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["matches"][0]["id"], 2);
    assert_eq!(body["matches"][0]["score"], 1.0);
}

#[tokio::test]
async fn limit_caps_the_match_list() {
    let app = build_router(test_service());
    let (status, body) = post_json(
        app,
        "/substructure/molecule",
        json!({ "fingerprint": [2, 3], "limit": 1 }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["matches"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn empty_fingerprint_matches_nothing() {
    let app = build_router(test_service());
    let (status, body) =
        post_json(app, "/substructure/molecule", json!({ "fingerprint": [] })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn empty_target_index_answers_empty() {
    let app = build_router(test_service());
    let (status, body) = post_json(
        app,
        "/substructure/reaction",
        json!({ "fingerprint": [2, 3] }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn negative_bit_is_a_client_error() {
    let app = build_router(test_service());
    let (status, body) = post_json(
        app,
        "/substructure/molecule",
        json!({ "fingerprint": [1, -2] }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn unknown_index_kind_is_rejected() {
    let app = build_router(test_service());
    let (status, _) = post_json(app, "/fulltext/molecule", json!({ "fingerprint": [1] })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_and_stats_respond() {
    let app = build_router(test_service());
    let response = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(Request::builder().uri("/stats").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let stats: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(stats["molecule_substructure"]["records"], 3);
    assert_eq!(stats["reaction_similarity"]["records"], 0);
}

#[tokio::test]
async fn service_loads_snapshot_bundle_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let builder = IndexBuilder::new();
    let similarity_cfg = SimilarityConfig::new()
        .with_threshold(0.2)
        .with_check_threshold(Some(0.5));

    let molecule_substructure = builder
        .build_substructure(SubstructureConfig::default(), sample_records())
        .unwrap();
    let reaction_substructure = builder
        .build_substructure(SubstructureConfig::default(), vec![])
        .unwrap();
    let molecule_similarity = builder
        .build_similarity(similarity_cfg, sample_records())
        .unwrap();
    let reaction_similarity = builder.build_similarity(similarity_cfg, vec![]).unwrap();

    let mut config = ServerConfig::default();
    config.snapshots.molecule_substructure = dir.path().join("mol_sub.idx");
    config.snapshots.reaction_substructure = dir.path().join("rxn_sub.idx");
    config.snapshots.molecule_similarity = dir.path().join("mol_sim.idx");
    config.snapshots.reaction_similarity = dir.path().join("rxn_sim.idx");

    std::fs::write(
        &config.snapshots.molecule_substructure,
        snapshot::save_substructure(&molecule_substructure).unwrap(),
    )
    .unwrap();
    std::fs::write(
        &config.snapshots.reaction_substructure,
        snapshot::save_substructure(&reaction_substructure).unwrap(),
    )
    .unwrap();
    std::fs::write(
        &config.snapshots.molecule_similarity,
        snapshot::save_similarity(&molecule_similarity).unwrap(),
    )
    .unwrap();
    std::fs::write(
        &config.snapshots.reaction_similarity,
        snapshot::save_similarity(&reaction_similarity).unwrap(),
    )
    .unwrap();

    let service = SearchService::load(config).unwrap();
    let app = build_router(Arc::new(service));

    let (status, body) = post_json(
        app,
        "/substructure/molecule",
        json!({ "fingerprint": [1, 5] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["matches"], json!([3]));
}

#[tokio::test]
async fn swapped_snapshot_kind_fails_loading() {
    let dir = tempfile::tempdir().unwrap();
    let builder = IndexBuilder::new();
    let similarity_cfg = SimilarityConfig::default();

    let substructure = builder
        .build_substructure(SubstructureConfig::default(), sample_records())
        .unwrap();
    let similarity = builder
        .build_similarity(similarity_cfg, sample_records())
        .unwrap();

    let mut config = ServerConfig::default();
    config.snapshots.molecule_substructure = dir.path().join("mol_sub.idx");
    config.snapshots.reaction_substructure = dir.path().join("rxn_sub.idx");
    config.snapshots.molecule_similarity = dir.path().join("mol_sim.idx");
    config.snapshots.reaction_similarity = dir.path().join("rxn_sim.idx");

    // Similarity blob where a substructure index is expected.
    std::fs::write(
        &config.snapshots.molecule_substructure,
        snapshot::save_similarity(&similarity).unwrap(),
    )
    .unwrap();
    std::fs::write(
        &config.snapshots.reaction_substructure,
        snapshot::save_substructure(&substructure).unwrap(),
    )
    .unwrap();
    std::fs::write(
        &config.snapshots.molecule_similarity,
        snapshot::save_similarity(&similarity).unwrap(),
    )
    .unwrap();
    std::fs::write(
        &config.snapshots.reaction_similarity,
        snapshot::save_similarity(&similarity).unwrap(),
    )
    .unwrap();

    assert!(SearchService::load(config).is_err());
}

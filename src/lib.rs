//! Umbrella crate for the chemscreen fingerprint search core.
//!
//! The core consumes a stream of `(record_id, fingerprint)` pairs — usually
//! sourced from a relational query the core knows nothing about — and
//! answers two query shapes over them:
//!
//! - **substructure**: every record whose fingerprint is a superset of the
//!   query fingerprint (exact screening over an inverted bit index);
//! - **similarity**: every record whose Jaccard similarity to the query
//!   clears a threshold (approximate MinHash-LSH retrieval, optionally
//!   re-ranked by exact Jaccard).
//!
//! This crate re-exports the public surface of the member crates and offers
//! the two batch entry points callers typically reach for first. The serving
//! daemon lives in the separate `chemscreen-server` binary crate.

pub use fingerprint::{
    minhash_signature, Fingerprint, FingerprintError, MinHashConfig, RecordId,
};
pub use index::{
    snapshot, CancelToken, Hit, IndexBuilder, IndexError, IndexSnapshot, RawRecord, SearchHits,
    SimilarityConfig, SimilarityIndex, SimilarityStats, SubstructureConfig, SubstructureIndex,
    SubstructureStats, SNAPSHOT_SCHEMA_VERSION,
};

/// Build a substructure index from a record stream.
///
/// `workers > 1` shards fingerprint construction across a bounded pool;
/// `chunk_size` controls how many records each scheduling unit carries.
pub fn build_substructure_index<I>(
    records: I,
    cfg: SubstructureConfig,
    workers: usize,
    chunk_size: usize,
) -> Result<SubstructureIndex, IndexError>
where
    I: IntoIterator<Item = RawRecord>,
{
    IndexBuilder::new()
        .with_workers(workers)
        .with_chunk_size(chunk_size)
        .build_substructure(cfg, records)
}

/// Build a similarity index from a record stream.
pub fn build_similarity_index<I>(
    records: I,
    cfg: SimilarityConfig,
    workers: usize,
    chunk_size: usize,
) -> Result<SimilarityIndex, IndexError>
where
    I: IntoIterator<Item = RawRecord>,
{
    IndexBuilder::new()
        .with_workers(workers)
        .with_chunk_size(chunk_size)
        .build_similarity(cfg, records)
}

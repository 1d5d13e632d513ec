//! # Chemscreen Index
//!
//! In-memory search structures over chemical fingerprints. Two index types
//! share one build and persistence pipeline:
//!
//! - [`SubstructureIndex`] — an inverted index mapping fingerprint bit →
//!   record-id set, answering exact superset screening ("every record whose
//!   fingerprint contains all query bits"). Intersections run rarest bit
//!   first and short-circuit as soon as the running candidate set empties.
//! - [`SimilarityIndex`] — a MinHash-LSH structure answering approximate
//!   Tanimoto-threshold retrieval, with optional exact-Jaccard re-ranking
//!   over retained fingerprints.
//!
//! Both are build-once/read-many: [`IndexBuilder`] constructs them from a
//! stream of `(id, bits)` records (optionally sharding the per-record
//! hashing across a worker pool), after which `search` is a pure read that
//! many threads may call concurrently. A built index can be serialized with
//! the [`snapshot`] module and restored in a different process with
//! bit-identical query results.
//!
//! ## Example
//!
//! ```
//! use index::{IndexBuilder, RawRecord, SearchHits, SubstructureConfig};
//!
//! let records = vec![
//!     RawRecord::new(1, vec![1, 2, 3]),
//!     RawRecord::new(2, vec![2, 3, 4]),
//!     RawRecord::new(3, vec![1, 2, 3, 4, 5]),
//! ];
//! let index = IndexBuilder::new()
//!     .build_substructure(SubstructureConfig::default(), records)
//!     .unwrap();
//!
//! let query = fingerprint::Fingerprint::from_bits([2, 3]);
//! match index.search(&query) {
//!     SearchHits::Ids(ids) => assert_eq!(ids, vec![1, 2, 3]),
//!     SearchHits::Scored(_) => unreachable!("unranked build"),
//! }
//! ```

pub mod builder;
mod idset;
mod lsh;
pub mod similarity;
pub mod snapshot;
pub mod substructure;

pub use builder::{CancelToken, IndexBuilder, RawRecord};
pub use similarity::{SimilarityConfig, SimilarityIndex, SimilarityStats};
pub use snapshot::{IndexSnapshot, SNAPSHOT_SCHEMA_VERSION};
pub use substructure::{SubstructureConfig, SubstructureIndex, SubstructureStats};

use bincode::error::{DecodeError, EncodeError};
use fingerprint::{FingerprintError, MinHashConfigError, RecordId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while building, querying, or persisting an index.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndexError {
    /// A record's raw bit list failed validation during build.
    #[error("record {id} has an invalid fingerprint: {source}")]
    InvalidRecord {
        id: RecordId,
        #[source]
        source: FingerprintError,
    },
    /// The same record id was supplied twice in one build batch.
    #[error("duplicate record id {0} in build batch")]
    DuplicateId(RecordId),
    /// The build was cancelled via [`CancelToken`]; the partial index is
    /// discarded.
    #[error("build cancelled after {inserted} records")]
    Cancelled { inserted: usize },
    #[error("invalid index config: {0}")]
    InvalidConfig(String),
    #[error("worker pool error: {0}")]
    WorkerPool(String),
    #[error("snapshot encode error: {0}")]
    Encode(String),
    #[error("snapshot decode error: {0}")]
    Decode(String),
    #[error("snapshot compression error: {0}")]
    Compression(String),
    /// A snapshot does not match what the caller expects: wrong schema
    /// version, wrong index kind, or internally inconsistent state.
    #[error("snapshot mismatch: {0}")]
    StateMismatch(String),
}

impl From<EncodeError> for IndexError {
    fn from(e: EncodeError) -> Self {
        IndexError::Encode(e.to_string())
    }
}

impl From<DecodeError> for IndexError {
    fn from(e: DecodeError) -> Self {
        IndexError::Decode(e.to_string())
    }
}

impl From<std::io::Error> for IndexError {
    fn from(e: std::io::Error) -> Self {
        IndexError::Compression(e.to_string())
    }
}

impl From<MinHashConfigError> for IndexError {
    fn from(e: MinHashConfigError) -> Self {
        IndexError::InvalidConfig(e.to_string())
    }
}

/// One ranked search result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    /// Matched record id.
    pub id: RecordId,
    /// Exact Jaccard similarity between query and stored fingerprint.
    pub score: f64,
}

/// Search output; the variant is fixed by the index's build-time config.
///
/// Unranked indexes return plain id lists (ascending id, but callers must
/// treat the order as unspecified). Ranked indexes return `(id, score)`
/// pairs sorted by descending score with ascending-id tie-break.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SearchHits {
    Ids(Vec<RecordId>),
    Scored(Vec<Hit>),
}

impl SearchHits {
    pub fn len(&self) -> usize {
        match self {
            SearchHits::Ids(ids) => ids.len(),
            SearchHits::Scored(hits) => hits.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keep at most `limit` leading results.
    pub fn truncate(&mut self, limit: usize) {
        match self {
            SearchHits::Ids(ids) => ids.truncate(limit),
            SearchHits::Scored(hits) => hits.truncate(limit),
        }
    }

    /// Matched ids, dropping scores when present.
    pub fn ids(&self) -> Vec<RecordId> {
        match self {
            SearchHits::Ids(ids) => ids.clone(),
            SearchHits::Scored(hits) => hits.iter().map(|h| h.id).collect(),
        }
    }
}

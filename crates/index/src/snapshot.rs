//! Opaque persistence of built indexes.
//!
//! An offline build job serializes its finished index to bytes; a separate
//! long-running query process restores it without touching the source
//! fingerprints. The payload is a schema-versioned envelope, bincode-encoded
//! and zstd-compressed. Restoring verifies the schema version and the
//! index's internal consistency, so a blob produced by an incompatible
//! configuration surfaces as [`IndexError::StateMismatch`] instead of
//! silently wrong query results.

use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::{Deserialize, Serialize};
use zstd::{decode_all, encode_all};

use crate::similarity::SimilarityIndex;
use crate::substructure::SubstructureIndex;
use crate::IndexError;

/// Bump whenever the serialized layout of any index state changes.
pub const SNAPSHOT_SCHEMA_VERSION: u16 = 1;

const ZSTD_LEVEL: i32 = 3;

/// A restored index of either kind.
#[derive(Debug, Deserialize)]
pub enum IndexSnapshot {
    Substructure(SubstructureIndex),
    Similarity(SimilarityIndex),
}

// Borrowing mirror of `IndexSnapshot` so saving never clones index state.
// Variant order must match the owned enum; bincode encodes by variant index.
#[derive(Serialize)]
enum IndexSnapshotRef<'a> {
    Substructure(&'a SubstructureIndex),
    Similarity(&'a SimilarityIndex),
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    schema_version: u16,
    index: IndexSnapshotRef<'a>,
}

#[derive(Deserialize)]
struct Envelope {
    schema_version: u16,
    index: IndexSnapshot,
}

/// Serialize a substructure index to an opaque blob.
pub fn save_substructure(index: &SubstructureIndex) -> Result<Vec<u8>, IndexError> {
    encode(IndexSnapshotRef::Substructure(index))
}

/// Serialize a similarity index to an opaque blob.
pub fn save_similarity(index: &SimilarityIndex) -> Result<Vec<u8>, IndexError> {
    encode(IndexSnapshotRef::Similarity(index))
}

/// Restore an index of either kind, verifying schema version and internal
/// consistency.
pub fn load(bytes: &[u8]) -> Result<IndexSnapshot, IndexError> {
    let decompressed = decode_all(bytes)?;
    let (envelope, _): (Envelope, usize) = decode_from_slice(&decompressed, standard())?;
    if envelope.schema_version != SNAPSHOT_SCHEMA_VERSION {
        return Err(IndexError::StateMismatch(format!(
            "snapshot schema version {} (this build reads {})",
            envelope.schema_version, SNAPSHOT_SCHEMA_VERSION
        )));
    }
    match &envelope.index {
        IndexSnapshot::Substructure(index) => index.verify()?,
        IndexSnapshot::Similarity(index) => index.verify()?,
    }
    Ok(envelope.index)
}

fn encode(index: IndexSnapshotRef<'_>) -> Result<Vec<u8>, IndexError> {
    let envelope = EnvelopeRef {
        schema_version: SNAPSHOT_SCHEMA_VERSION,
        index,
    };
    let encoded = encode_to_vec(&envelope, standard())?;
    Ok(encode_all(&encoded[..], ZSTD_LEVEL)?)
}

impl IndexSnapshot {
    /// Extract a substructure index or report the kind mismatch.
    pub fn into_substructure(self) -> Result<SubstructureIndex, IndexError> {
        match self {
            IndexSnapshot::Substructure(index) => Ok(index),
            IndexSnapshot::Similarity(_) => Err(IndexError::StateMismatch(
                "snapshot holds a similarity index, expected substructure".into(),
            )),
        }
    }

    /// Extract a similarity index or report the kind mismatch.
    pub fn into_similarity(self) -> Result<SimilarityIndex, IndexError> {
        match self {
            IndexSnapshot::Similarity(index) => Ok(index),
            IndexSnapshot::Substructure(_) => Err(IndexError::StateMismatch(
                "snapshot holds a substructure index, expected similarity".into(),
            )),
        }
    }
}

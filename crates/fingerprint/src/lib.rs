//! Chemical structure fingerprints for the chemscreen indexing core.
//!
//! A fingerprint is a finite set of bit indices produced by an external
//! descriptor-hashing procedure. This crate provides the set representation
//! ([`Fingerprint`], backed by a compressed roaring bitmap), the Jaccard
//! (Tanimoto) similarity over such sets, and deterministic MinHash
//! signatures used by the similarity index for LSH bucketing.
//!
//! The crate is pure and I/O-free: every operation is a function of its
//! inputs and a [`MinHashConfig`], so fingerprints and signatures computed
//! on one host are bit-identical on any other.

mod bitset;
mod config;
mod minhash;

pub use bitset::{Fingerprint, FingerprintError};
pub use config::{MinHashConfig, MinHashConfigError};
pub use minhash::{minhash_signature, splitmix64};

/// Opaque record identifier supplied by the external data layer.
pub type RecordId = u64;

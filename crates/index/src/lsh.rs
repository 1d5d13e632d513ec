//! Banded locality-sensitive hashing over MinHash signatures.
//!
//! The signature is split into `bands` contiguous groups of `rows` slots;
//! each group is hashed into that band's bucket table. Two records become
//! candidates for each other when they collide in at least one band. The
//! banding geometry is chosen from the configured similarity threshold by
//! minimizing the equally weighted false-positive/false-negative integrals
//! over the divisors of the signature length, so every slot lands in
//! exactly one band.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::xxh3_64_with_seed;

use fingerprint::{splitmix64, RecordId};

use crate::idset::IdSet;
use crate::IndexError;

/// Integration step for the banding-error estimate.
const INTEGRATION_STEP: f64 = 0.001;

/// MinHash-LSH bucket index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct MinHashLsh {
    num_perm: usize,
    bands: usize,
    rows: usize,
    band_seeds: Vec<u64>,
    /// One bucket table per band: band hash → record ids.
    tables: Vec<HashMap<u64, IdSet>>,
    members: IdSet,
}

impl MinHashLsh {
    /// Build an empty structure for `num_perm`-slot signatures tuned to the
    /// given similarity threshold.
    pub(crate) fn new(num_perm: usize, threshold: f64, seed: u64) -> Self {
        let (bands, rows) = optimal_banding(threshold, num_perm);
        let band_seeds = (0..bands)
            .map(|band| splitmix64(seed.wrapping_add((band as u64).wrapping_mul(0xA076_1D64_78BD_642F))))
            .collect();
        Self {
            num_perm,
            bands,
            rows,
            band_seeds,
            tables: vec![HashMap::new(); bands],
            members: IdSet::new(),
        }
    }

    pub(crate) fn insert(&mut self, id: RecordId, signature: &[u64]) -> Result<(), IndexError> {
        debug_assert_eq!(signature.len(), self.num_perm);
        if !self.members.insert(id) {
            return Err(IndexError::DuplicateId(id));
        }
        for band in 0..self.bands {
            let hash = self.band_hash(signature, band);
            self.tables[band].entry(hash).or_default().insert(id);
        }
        Ok(())
    }

    /// Union of every bucket the query signature collides with.
    pub(crate) fn candidates(&self, signature: &[u64]) -> IdSet {
        debug_assert_eq!(signature.len(), self.num_perm);
        let mut out = IdSet::new();
        for band in 0..self.bands {
            let hash = self.band_hash(signature, band);
            if let Some(bucket) = self.tables[band].get(&hash) {
                out.union_with(bucket);
            }
        }
        out
    }

    fn band_hash(&self, signature: &[u64], band: usize) -> u64 {
        let start = band * self.rows;
        let slice = &signature[start..start + self.rows];
        let mut buf = Vec::with_capacity(self.rows * 8);
        for &slot in slice {
            buf.extend_from_slice(&slot.to_le_bytes());
        }
        xxh3_64_with_seed(&buf, self.band_seeds[band])
    }

    pub(crate) fn num_perm(&self) -> usize {
        self.num_perm
    }

    pub(crate) fn bands(&self) -> usize {
        self.bands
    }

    pub(crate) fn rows(&self) -> usize {
        self.rows
    }

    pub(crate) fn len(&self) -> u64 {
        self.members.len()
    }

    pub(crate) fn contains(&self, id: RecordId) -> bool {
        self.members.contains(id)
    }

    pub(crate) fn verify(&self) -> Result<(), IndexError> {
        if self.bands * self.rows != self.num_perm {
            return Err(IndexError::StateMismatch(format!(
                "banding {}x{} does not cover num_perm {}",
                self.bands, self.rows, self.num_perm
            )));
        }
        if self.band_seeds.len() != self.bands || self.tables.len() != self.bands {
            return Err(IndexError::StateMismatch(
                "band table count disagrees with banding geometry".into(),
            ));
        }
        Ok(())
    }
}

/// Probability that two items with Jaccard `s` collide in at least one band.
fn collision_probability(s: f64, bands: usize, rows: usize) -> f64 {
    1.0 - (1.0 - s.powi(rows as i32)).powi(bands as i32)
}

/// Pick `(bands, rows)` among the divisors of `num_perm` minimizing the
/// equally weighted false-positive/false-negative error around `threshold`.
fn optimal_banding(threshold: f64, num_perm: usize) -> (usize, usize) {
    let mut best = (1, num_perm);
    let mut best_error = f64::INFINITY;
    for bands in 1..=num_perm {
        if num_perm % bands != 0 {
            continue;
        }
        let rows = num_perm / bands;
        let false_positive = integrate(|s| collision_probability(s, bands, rows), 0.0, threshold);
        let false_negative =
            integrate(|s| 1.0 - collision_probability(s, bands, rows), threshold, 1.0);
        let error = 0.5 * false_positive + 0.5 * false_negative;
        if error < best_error {
            best_error = error;
            best = (bands, rows);
        }
    }
    best
}

/// Midpoint-rule integral of `f` over `[a, b]`.
fn integrate(f: impl Fn(f64) -> f64, a: f64, b: f64) -> f64 {
    if b <= a {
        return 0.0;
    }
    let steps = ((b - a) / INTEGRATION_STEP).ceil().max(1.0) as usize;
    let dx = (b - a) / steps as f64;
    (0..steps).map(|i| f(a + (i as f64 + 0.5) * dx) * dx).sum()
}

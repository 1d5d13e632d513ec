//! MinHash signatures over fingerprint bit sets.
//!
//! Each signature slot simulates one random permutation of the bit universe:
//! the slot key is derived from the config seed by splitmix64 chaining, every
//! set bit is mixed with that key through xxh3-64, and the slot value is the
//! minimum over all bits. Matching slots between two signatures estimate the
//! Jaccard similarity of the underlying sets.

use rayon::prelude::*;
use xxhash_rust::xxh3::xxh3_64_with_seed;

use crate::bitset::Fingerprint;
use crate::config::MinHashConfig;

/// Compute a MinHash signature of length `cfg.num_perm`.
///
/// An empty fingerprint yields the degenerate all-`u64::MAX` signature; the
/// similarity index never inserts or queries it, but the convention keeps
/// the function total.
pub fn minhash_signature(fp: &Fingerprint, cfg: &MinHashConfig) -> Vec<u64> {
    if cfg.num_perm == 0 {
        return Vec::new();
    }
    if fp.is_empty() {
        return vec![u64::MAX; cfg.num_perm];
    }

    // One contiguous pass over the bitmap, then slot loops over the slice.
    let bits: Vec<u32> = fp.iter().collect();

    let mut signature = Vec::with_capacity(cfg.num_perm);
    if cfg.use_parallel {
        (0..cfg.num_perm)
            .into_par_iter()
            .map(|slot| compute_slot(&bits, slot, cfg.seed))
            .collect_into_vec(&mut signature);
    } else {
        for slot in 0..cfg.num_perm {
            signature.push(compute_slot(&bits, slot, cfg.seed));
        }
    }
    signature
}

/// Minimum mixed hash over all bits for one permutation slot.
#[inline]
fn compute_slot(bits: &[u32], slot: usize, seed: u64) -> u64 {
    let step = (slot as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    let key = splitmix64(seed.wrapping_add(step));
    let mut minv = u64::MAX;
    for &bit in bits {
        let h = mix_u64(bit as u64, key);
        if h < minv {
            minv = h;
        }
    }
    minv
}

#[inline]
fn mix_u64(x: u64, key: u64) -> u64 {
    let mut h = xxh3_64_with_seed(&x.to_le_bytes(), key);
    h ^= h >> 33;
    h = h.wrapping_mul(0xff51afd7ed558ccd);
    h ^= h >> 33;
    h = h.wrapping_mul(0xc4ceb9fe1a85ec53);
    h ^ (h >> 33)
}

/// Fast 64-bit finalizer used to derive per-slot keys from one seed.
#[inline]
pub fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

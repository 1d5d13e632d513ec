//! Fingerprint bitset representation and set algebra.
//!
//! Fingerprints are sets of `u32` bit indices. A compressed bitmap keeps
//! intersection and union cardinalities cheap at the densities this system
//! sees (tens of thousands of set bits over a 2^12–2^16 universe), which is
//! what the substructure screen and exact Tanimoto re-ranking lean on.

use roaring::RoaringBitmap;
use serde::de::Error as DeError;
use serde::ser::Error as SerError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Errors produced while constructing a fingerprint from untrusted input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FingerprintError {
    #[error("invalid fingerprint bit {value}; bits must be in 0..=4294967295")]
    InvalidBit { value: i64 },
}

/// A set of fingerprint bit indices.
///
/// Duplicate bits in the input collapse; order never matters. Similarity
/// between two fingerprints is the Jaccard index of their bit sets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fingerprint {
    bits: RoaringBitmap,
}

impl Fingerprint {
    /// An empty fingerprint.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from trusted bit indices.
    pub fn from_bits<I>(bits: I) -> Self
    where
        I: IntoIterator<Item = u32>,
    {
        let mut set = RoaringBitmap::new();
        for bit in bits {
            set.insert(bit);
        }
        Self { bits: set }
    }

    /// Build from raw integers as they arrive from a JSON body or a database
    /// cursor. Negative values and values above `u32::MAX` are rejected
    /// before any index sees them.
    pub fn try_from_raw(raw: &[i64]) -> Result<Self, FingerprintError> {
        let mut set = RoaringBitmap::new();
        for &value in raw {
            let bit =
                u32::try_from(value).map_err(|_| FingerprintError::InvalidBit { value })?;
            set.insert(bit);
        }
        Ok(Self { bits: set })
    }

    /// Number of set bits.
    pub fn len(&self) -> u64 {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn contains(&self, bit: u32) -> bool {
        self.bits.contains(bit)
    }

    /// Iterate set bits in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.bits.iter()
    }

    /// `|self ∩ other|`.
    pub fn intersection_len(&self, other: &Fingerprint) -> u64 {
        self.bits.intersection_len(&other.bits)
    }

    /// `|self ∪ other|`.
    pub fn union_len(&self, other: &Fingerprint) -> u64 {
        self.bits.union_len(&other.bits)
    }

    /// `true` when every bit of `self` is present in `other`.
    pub fn is_subset_of(&self, other: &Fingerprint) -> bool {
        self.bits.is_subset(&other.bits)
    }

    /// Jaccard (Tanimoto) similarity: `|A ∩ B| / |A ∪ B|`.
    ///
    /// Two empty fingerprints have similarity 0.0, not NaN.
    pub fn jaccard(&self, other: &Fingerprint) -> f64 {
        let union = self.union_len(other);
        if union == 0 {
            return 0.0;
        }
        self.intersection_len(other) as f64 / union as f64
    }
}

impl FromIterator<u32> for Fingerprint {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self::from_bits(iter)
    }
}

// The roaring byte format is the stable wire shape for bitmaps; serde sees
// an opaque byte string so bincode and JSON both round-trip it unchanged.
impl Serialize for Fingerprint {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut buf = Vec::with_capacity(self.bits.serialized_size());
        self.bits
            .serialize_into(&mut buf)
            .map_err(SerError::custom)?;
        serializer.serialize_bytes(&buf)
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes = Vec::<u8>::deserialize(deserializer)?;
        let bits = RoaringBitmap::deserialize_from(&bytes[..]).map_err(DeError::custom)?;
        Ok(Self { bits })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_bits_collapses_duplicates() {
        let fp = Fingerprint::from_bits([3, 1, 3, 2, 1]);
        assert_eq!(fp.len(), 3);
        assert_eq!(fp.iter().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn try_from_raw_rejects_negative_bits() {
        let err = Fingerprint::try_from_raw(&[1, -5, 2]).unwrap_err();
        assert_eq!(err, FingerprintError::InvalidBit { value: -5 });
    }

    #[test]
    fn try_from_raw_rejects_overflowing_bits() {
        let too_big = u32::MAX as i64 + 1;
        let err = Fingerprint::try_from_raw(&[too_big]).unwrap_err();
        assert_eq!(err, FingerprintError::InvalidBit { value: too_big });
    }

    #[test]
    fn try_from_raw_accepts_full_u32_range() {
        let fp = Fingerprint::try_from_raw(&[0, u32::MAX as i64]).unwrap();
        assert!(fp.contains(0));
        assert!(fp.contains(u32::MAX));
    }

    #[test]
    fn jaccard_of_identical_nonempty_sets_is_one() {
        let fp = Fingerprint::from_bits([1, 2, 3]);
        assert_eq!(fp.jaccard(&fp), 1.0);
    }

    #[test]
    fn jaccard_of_two_empty_sets_is_zero() {
        let a = Fingerprint::new();
        let b = Fingerprint::new();
        assert_eq!(a.jaccard(&b), 0.0);
    }

    #[test]
    fn jaccard_is_bounded() {
        let a = Fingerprint::from_bits([1, 2, 3]);
        let b = Fingerprint::from_bits([2, 3, 4]);
        let score = a.jaccard(&b);
        assert!((0.0..=1.0).contains(&score));
        assert_eq!(score, 2.0 / 4.0);
    }

    #[test]
    fn jaccard_with_disjoint_set_is_zero() {
        let a = Fingerprint::from_bits([1, 2]);
        let b = Fingerprint::from_bits([3, 4]);
        assert_eq!(a.jaccard(&b), 0.0);
    }

    #[test]
    fn subset_test_matches_superset_screening() {
        let query = Fingerprint::from_bits([2, 3]);
        let record = Fingerprint::from_bits([1, 2, 3, 4]);
        assert!(query.is_subset_of(&record));
        assert!(!record.is_subset_of(&query));
        assert!(Fingerprint::new().is_subset_of(&record));
    }

    #[test]
    fn intersection_and_union_cardinalities() {
        let a = Fingerprint::from_bits([1, 2, 3, 4]);
        let b = Fingerprint::from_bits([3, 4, 5]);
        assert_eq!(a.intersection_len(&b), 2);
        assert_eq!(a.union_len(&b), 5);
    }

    #[test]
    fn serde_roundtrip_preserves_bits() {
        let fp = Fingerprint::from_bits([0, 7, 4095, 65535]);
        let encoded = serde_json::to_vec(&fp).unwrap();
        let decoded: Fingerprint = serde_json::from_slice(&encoded).unwrap();
        assert_eq!(fp, decoded);
    }
}

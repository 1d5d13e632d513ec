//! Record-id sets backing posting lists and LSH buckets.

use fingerprint::RecordId;
use roaring::RoaringTreemap;
use serde::de::Error as DeError;
use serde::ser::Error as SerError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Compressed set of 64-bit record ids.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct IdSet(RoaringTreemap);

impl IdSet {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the id was already present.
    pub(crate) fn insert(&mut self, id: RecordId) -> bool {
        self.0.insert(id)
    }

    pub(crate) fn contains(&self, id: RecordId) -> bool {
        self.0.contains(id)
    }

    pub(crate) fn len(&self) -> u64 {
        self.0.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Ascending-id iteration.
    pub(crate) fn iter(&self) -> impl Iterator<Item = RecordId> + '_ {
        self.0.iter()
    }

    pub(crate) fn to_vec(&self) -> Vec<RecordId> {
        self.0.iter().collect()
    }

    pub(crate) fn intersect_with(&mut self, other: &IdSet) {
        self.0 &= &other.0;
    }

    pub(crate) fn union_with(&mut self, other: &IdSet) {
        self.0 |= &other.0;
    }
}

// Same byte-string serde shape as `Fingerprint`: the roaring format is the
// wire representation, so bincode snapshots and JSON debugging both work.
impl Serialize for IdSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut buf = Vec::with_capacity(self.0.serialized_size() as usize);
        self.0.serialize_into(&mut buf).map_err(SerError::custom)?;
        serializer.serialize_bytes(&buf)
    }
}

impl<'de> Deserialize<'de> for IdSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes = Vec::<u8>::deserialize(deserializer)?;
        let set = RoaringTreemap::deserialize_from(&bytes[..]).map_err(DeError::custom)?;
        Ok(Self(set))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_reports_duplicates() {
        let mut set = IdSet::new();
        assert!(set.insert(7));
        assert!(!set.insert(7));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn intersection_and_union() {
        let mut a = IdSet::new();
        let mut b = IdSet::new();
        for id in [1, 2, 3] {
            a.insert(id);
        }
        for id in [2, 3, 4] {
            b.insert(id);
        }

        let mut i = a.clone();
        i.intersect_with(&b);
        assert_eq!(i.to_vec(), vec![2, 3]);

        let mut u = a;
        u.union_with(&b);
        assert_eq!(u.to_vec(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn iteration_is_ascending() {
        let mut set = IdSet::new();
        for id in [9, 1, 5, u64::MAX] {
            set.insert(id);
        }
        assert_eq!(set.to_vec(), vec![1, 5, 9, u64::MAX]);
    }

    #[test]
    fn serde_roundtrip() {
        let mut set = IdSet::new();
        for id in [0, 42, 1 << 40] {
            set.insert(id);
        }
        let encoded = serde_json::to_vec(&set).unwrap();
        let decoded: IdSet = serde_json::from_slice(&encoded).unwrap();
        assert_eq!(set, decoded);
    }
}

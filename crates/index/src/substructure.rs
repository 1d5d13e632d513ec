//! Inverted-index substructure screening.
//!
//! A record matches a query when the query's bit set is a subset of the
//! record's fingerprint. The index keeps one posting list per bit plus a
//! cached cardinality per list; queries intersect posting lists starting
//! from the rarest bit so the running candidate set collapses as early as
//! possible.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use fingerprint::{Fingerprint, RecordId};

use crate::idset::IdSet;
use crate::{Hit, IndexError, SearchHits};

/// Build-time options for a [`SubstructureIndex`].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubstructureConfig {
    /// Retain per-record fingerprints and return results ranked by exact
    /// Jaccard similarity. Roughly doubles the memory footprint.
    pub ranked: bool,
}

impl SubstructureConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ranked(mut self, ranked: bool) -> Self {
        self.ranked = ranked;
        self
    }
}

/// Summary counters exposed by the serving layer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubstructureStats {
    pub records: u64,
    pub distinct_bits: usize,
    pub ranked: bool,
}

/// Exact superset screen over fingerprint bits.
///
/// Built once by [`crate::IndexBuilder`]; immutable afterwards, so any
/// number of threads may search it concurrently without locking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubstructureIndex {
    cfg: SubstructureConfig,
    /// bit → ids of every record whose fingerprint set that bit.
    postings: HashMap<u32, IdSet>,
    /// Posting-list cardinalities, cached at finalize time to drive the
    /// rarest-bit-first intersection order.
    sizes: HashMap<u32, u64>,
    /// Every indexed record id.
    members: IdSet,
    /// Raw fingerprints, retained only in ranked mode.
    fingerprints: Option<HashMap<RecordId, Fingerprint>>,
}

impl SubstructureIndex {
    pub(crate) fn new(cfg: SubstructureConfig) -> Self {
        Self {
            cfg,
            postings: HashMap::new(),
            sizes: HashMap::new(),
            members: IdSet::new(),
            fingerprints: cfg.ranked.then(HashMap::new),
        }
    }

    pub(crate) fn insert(&mut self, id: RecordId, fp: Fingerprint) -> Result<(), IndexError> {
        if !self.members.insert(id) {
            return Err(IndexError::DuplicateId(id));
        }
        for bit in fp.iter() {
            self.postings.entry(bit).or_default().insert(id);
        }
        if let Some(store) = self.fingerprints.as_mut() {
            store.insert(id, fp);
        }
        Ok(())
    }

    /// Cache posting-list sizes once all insertions are done.
    pub(crate) fn finalize(&mut self) {
        self.sizes = self
            .postings
            .iter()
            .map(|(&bit, list)| (bit, list.len()))
            .collect();
    }

    /// Find every record whose fingerprint is a superset of `query`.
    ///
    /// The empty query matches nothing. Results are ranked by descending
    /// exact Jaccard (ties by ascending id) when the index was built with
    /// `ranked: true`, otherwise an ascending id list.
    pub fn search(&self, query: &Fingerprint) -> SearchHits {
        let survivors = self.screen(query);
        match &self.fingerprints {
            Some(store) => {
                let mut hits: Vec<Hit> = survivors
                    .iter()
                    .filter_map(|id| {
                        store.get(&id).map(|fp| Hit {
                            id,
                            score: query.jaccard(fp),
                        })
                    })
                    .collect();
                hits.sort_unstable_by(|a, b| {
                    b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id))
                });
                SearchHits::Scored(hits)
            }
            None => SearchHits::Ids(survivors.to_vec()),
        }
    }

    /// Posting-list intersection, rarest bit first.
    fn screen(&self, query: &Fingerprint) -> IdSet {
        if query.is_empty() {
            return IdSet::new();
        }

        let mut lists = Vec::with_capacity(query.len() as usize);
        for bit in query.iter() {
            // A bit no record ever set has an empty posting list.
            let Some(list) = self.postings.get(&bit) else {
                return IdSet::new();
            };
            let size = self.sizes.get(&bit).copied().unwrap_or_else(|| list.len());
            lists.push((list, size));
        }
        lists.sort_unstable_by_key(|&(_, size)| size);

        let mut acc = lists[0].0.clone();
        for (list, _) in &lists[1..] {
            acc.intersect_with(list);
            if acc.is_empty() {
                break;
            }
        }
        acc
    }

    pub fn len(&self) -> u64 {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains_id(&self, id: RecordId) -> bool {
        self.members.contains(id)
    }

    pub fn ranked(&self) -> bool {
        self.cfg.ranked
    }

    pub fn stats(&self) -> SubstructureStats {
        SubstructureStats {
            records: self.members.len(),
            distinct_bits: self.postings.len(),
            ranked: self.cfg.ranked,
        }
    }

    /// Internal consistency check applied when restoring from a snapshot.
    pub(crate) fn verify(&self) -> Result<(), IndexError> {
        if self.cfg.ranked != self.fingerprints.is_some() {
            return Err(IndexError::StateMismatch(
                "ranked flag disagrees with retained fingerprints".into(),
            ));
        }
        if let Some(store) = &self.fingerprints {
            if store.len() as u64 != self.members.len() {
                return Err(IndexError::StateMismatch(format!(
                    "{} retained fingerprints for {} records",
                    store.len(),
                    self.members.len()
                )));
            }
        }
        Ok(())
    }
}

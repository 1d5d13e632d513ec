//! Approximate Tanimoto-threshold retrieval via MinHash-LSH.
//!
//! Candidate retrieval is sub-linear: a query only touches the LSH buckets
//! its signature collides with. Precision is then a caller-controlled
//! trade-off — with `check_threshold` set, raw fingerprints are retained and
//! every candidate is re-scored with exact Jaccard; without it, the raw
//! candidate set is returned with LSH's approximate recall/precision.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use fingerprint::{minhash_signature, Fingerprint, MinHashConfig, RecordId};

use crate::idset::IdSet;
use crate::lsh::MinHashLsh;
use crate::{Hit, IndexError, SearchHits};

/// Build-time options for a [`SimilarityIndex`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SimilarityConfig {
    /// Signature parameters; `num_perm` and `seed` must match between build
    /// and query time, which the index guarantees by storing this config.
    pub minhash: MinHashConfig,
    /// Approximate similarity level the LSH banding is tuned for.
    pub threshold: f64,
    /// When set, retain raw fingerprints, drop candidates with exact
    /// Jaccard below this value, and rank the survivors.
    pub check_threshold: Option<f64>,
}

impl SimilarityConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_minhash(mut self, minhash: MinHashConfig) -> Self {
        self.minhash = minhash;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_check_threshold(mut self, check_threshold: Option<f64>) -> Self {
        self.check_threshold = check_threshold;
        self
    }

    pub fn validate(&self) -> Result<(), IndexError> {
        self.minhash.validate()?;
        if !(self.threshold > 0.0 && self.threshold <= 1.0) {
            return Err(IndexError::InvalidConfig(format!(
                "threshold must be in (0.0, 1.0] (got {})",
                self.threshold
            )));
        }
        if let Some(check) = self.check_threshold {
            if !(0.0..=1.0).contains(&check) {
                return Err(IndexError::InvalidConfig(format!(
                    "check_threshold must be in [0.0, 1.0] (got {check})"
                )));
            }
        }
        Ok(())
    }
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            minhash: MinHashConfig::default(),
            threshold: 0.6,
            check_threshold: Some(0.7),
        }
    }
}

/// Summary counters exposed by the serving layer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SimilarityStats {
    pub records: u64,
    pub num_perm: usize,
    pub bands: usize,
    pub rows: usize,
    pub threshold: f64,
    pub check_threshold: Option<f64>,
}

/// MinHash-LSH similarity index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityIndex {
    cfg: SimilarityConfig,
    lsh: MinHashLsh,
    /// Raw fingerprints for exact re-ranking; present iff `check_threshold`.
    fingerprints: Option<HashMap<RecordId, Fingerprint>>,
}

impl SimilarityIndex {
    pub(crate) fn new(cfg: SimilarityConfig) -> Result<Self, IndexError> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            lsh: MinHashLsh::new(cfg.minhash.num_perm, cfg.threshold, cfg.minhash.seed),
            fingerprints: cfg.check_threshold.map(|_| HashMap::new()),
        })
    }

    /// Insert one record with its precomputed signature. The builder owns
    /// signature computation so it can shard it across workers.
    pub(crate) fn insert(
        &mut self,
        id: RecordId,
        fp: Fingerprint,
        signature: &[u64],
    ) -> Result<(), IndexError> {
        self.lsh.insert(id, signature)?;
        if let Some(store) = self.fingerprints.as_mut() {
            store.insert(id, fp);
        }
        Ok(())
    }

    /// Retrieve records similar to `query`.
    ///
    /// The empty query has no meaningful signature and returns no matches.
    pub fn search(&self, query: &Fingerprint) -> SearchHits {
        let candidates = if query.is_empty() {
            IdSet::new()
        } else {
            let signature = minhash_signature(query, &self.cfg.minhash);
            self.lsh.candidates(&signature)
        };

        match (&self.fingerprints, self.cfg.check_threshold) {
            (Some(store), Some(check)) => {
                let mut hits: Vec<Hit> = candidates
                    .iter()
                    .filter_map(|id| {
                        store.get(&id).map(|fp| Hit {
                            id,
                            score: query.jaccard(fp),
                        })
                    })
                    .filter(|hit| hit.score >= check)
                    .collect();
                hits.sort_unstable_by(|a, b| {
                    b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id))
                });
                SearchHits::Scored(hits)
            }
            _ => SearchHits::Ids(candidates.to_vec()),
        }
    }

    pub fn len(&self) -> u64 {
        self.lsh.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lsh.len() == 0
    }

    pub fn contains_id(&self, id: RecordId) -> bool {
        self.lsh.contains(id)
    }

    pub fn config(&self) -> &SimilarityConfig {
        &self.cfg
    }

    pub fn stats(&self) -> SimilarityStats {
        SimilarityStats {
            records: self.lsh.len(),
            num_perm: self.lsh.num_perm(),
            bands: self.lsh.bands(),
            rows: self.lsh.rows(),
            threshold: self.cfg.threshold,
            check_threshold: self.cfg.check_threshold,
        }
    }

    /// Internal consistency check applied when restoring from a snapshot.
    pub(crate) fn verify(&self) -> Result<(), IndexError> {
        self.cfg.validate()?;
        self.lsh.verify()?;
        if self.lsh.num_perm() != self.cfg.minhash.num_perm {
            return Err(IndexError::StateMismatch(format!(
                "LSH geometry built for num_perm {} but config says {}",
                self.lsh.num_perm(),
                self.cfg.minhash.num_perm
            )));
        }
        if self.cfg.check_threshold.is_some() != self.fingerprints.is_some() {
            return Err(IndexError::StateMismatch(
                "check_threshold disagrees with retained fingerprints".into(),
            ));
        }
        Ok(())
    }
}

//! Bulk index construction from a record stream.
//!
//! The builder consumes records chunk by chunk so a database cursor over
//! millions of rows never has to be materialized. Per chunk, the
//! embarrassingly parallel part — bit validation, bitmap construction,
//! MinHash signatures — can run on a bounded rayon pool; insertion into the
//! shared index stays on the coordinating thread, since neither index type
//! supports concurrent writers.
//!
//! Failure policy is fail-fast: the first malformed record or duplicate id
//! aborts the build and the partial index is dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use rayon::ThreadPool;
use serde::{Deserialize, Serialize};

use fingerprint::{minhash_signature, Fingerprint, RecordId};

use crate::similarity::{SimilarityConfig, SimilarityIndex};
use crate::substructure::{SubstructureConfig, SubstructureIndex};
use crate::IndexError;

/// One input record as it arrives from the external data layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawRecord {
    pub id: RecordId,
    /// Raw fingerprint bits, unvalidated.
    pub bits: Vec<i64>,
}

impl RawRecord {
    pub fn new(id: RecordId, bits: Vec<i64>) -> Self {
        Self { id, bits }
    }
}

/// Cooperative cancellation handle for long builds.
///
/// Cancelling stops the builder at the next chunk boundary; in-flight chunk
/// work drains first.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Configurable batch builder for both index types.
#[derive(Debug, Clone)]
pub struct IndexBuilder {
    workers: usize,
    chunk_size: usize,
    cancel: Option<CancelToken>,
}

const DEFAULT_CHUNK_SIZE: usize = 8192;

impl Default for IndexBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self {
            workers: 1,
            chunk_size: DEFAULT_CHUNK_SIZE,
            cancel: None,
        }
    }

    /// Number of hashing workers. `1` keeps everything on the calling
    /// thread.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Records dispatched per scheduling unit. Larger chunks amortize pool
    /// overhead, smaller chunks balance load and tighten cancellation
    /// latency.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Build a [`SubstructureIndex`] from a record stream.
    pub fn build_substructure<I>(
        &self,
        cfg: SubstructureConfig,
        records: I,
    ) -> Result<SubstructureIndex, IndexError>
    where
        I: IntoIterator<Item = RawRecord>,
    {
        let mut index = SubstructureIndex::new(cfg);
        let inserted = self.drive(
            records,
            |record| {
                let fp = Fingerprint::try_from_raw(&record.bits).map_err(|source| {
                    IndexError::InvalidRecord {
                        id: record.id,
                        source,
                    }
                })?;
                Ok((record.id, fp))
            },
            |(id, fp)| index.insert(id, fp),
        )?;
        index.finalize();
        tracing::info!(records = inserted, "built substructure index");
        Ok(index)
    }

    /// Build a [`SimilarityIndex`] from a record stream.
    pub fn build_similarity<I>(
        &self,
        cfg: SimilarityConfig,
        records: I,
    ) -> Result<SimilarityIndex, IndexError>
    where
        I: IntoIterator<Item = RawRecord>,
    {
        let mut index = SimilarityIndex::new(cfg)?;
        // Per-record parallelism already comes from the chunk map; nested
        // slot parallelism would only add scheduling churn.
        let slot_cfg = cfg
            .minhash
            .with_parallel(cfg.minhash.use_parallel && self.workers <= 1);
        let inserted = self.drive(
            records,
            |record| {
                let fp = Fingerprint::try_from_raw(&record.bits).map_err(|source| {
                    IndexError::InvalidRecord {
                        id: record.id,
                        source,
                    }
                })?;
                let signature = minhash_signature(&fp, &slot_cfg);
                Ok((record.id, fp, signature))
            },
            |(id, fp, signature)| index.insert(id, fp, &signature),
        )?;
        tracing::info!(records = inserted, "built similarity index");
        Ok(index)
    }

    /// Chunked map/reduce loop shared by both build paths: `prepare` runs
    /// per record (possibly on the pool), `consume` runs sequentially.
    fn drive<I, T>(
        &self,
        records: I,
        prepare: impl Fn(RawRecord) -> Result<T, IndexError> + Send + Sync,
        mut consume: impl FnMut(T) -> Result<(), IndexError>,
    ) -> Result<usize, IndexError>
    where
        I: IntoIterator<Item = RawRecord>,
        T: Send,
    {
        self.validate()?;
        let pool = self.pool()?;
        let mut iter = records.into_iter();
        let mut inserted = 0usize;

        loop {
            if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
                return Err(IndexError::Cancelled { inserted });
            }

            let chunk: Vec<RawRecord> = iter.by_ref().take(self.chunk_size).collect();
            if chunk.is_empty() {
                break;
            }

            let prepared: Vec<T> = match &pool {
                Some(pool) => pool.install(|| {
                    chunk
                        .into_par_iter()
                        .map(&prepare)
                        .collect::<Result<Vec<_>, _>>()
                })?,
                None => chunk
                    .into_iter()
                    .map(&prepare)
                    .collect::<Result<Vec<_>, _>>()?,
            };

            for item in prepared {
                consume(item)?;
                inserted += 1;
            }
            tracing::debug!(inserted, "index build progress");
        }
        Ok(inserted)
    }

    fn validate(&self) -> Result<(), IndexError> {
        if self.workers == 0 {
            return Err(IndexError::InvalidConfig("workers must be >= 1".into()));
        }
        if self.chunk_size == 0 {
            return Err(IndexError::InvalidConfig("chunk_size must be >= 1".into()));
        }
        Ok(())
    }

    fn pool(&self) -> Result<Option<ThreadPool>, IndexError> {
        if self.workers <= 1 {
            return Ok(None);
        }
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
            .map(Some)
            .map_err(|e| IndexError::WorkerPool(e.to_string()))
    }
}

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use index::{snapshot, SearchHits, SimilarityIndex, SimilarityStats, SubstructureIndex, SubstructureStats};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Which search algorithm a request addresses.
///
/// Parsed straight from the URL path; an unknown segment is a client error
/// before any index is touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    Substructure,
    Similarity,
}

/// Which record corpus a request addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    Molecule,
    Reaction,
}

/// Shared application state: the four loaded indexes.
///
/// One explicit field per `(kind, target)` pair — no name-keyed lookup, no
/// global mutable state. Built once at startup and shared via `Arc`; every
/// handler only reads.
#[derive(Clone)]
pub struct SearchService {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    molecule_substructure: Arc<SubstructureIndex>,
    reaction_substructure: Arc<SubstructureIndex>,
    molecule_similarity: Arc<SimilarityIndex>,
    reaction_similarity: Arc<SimilarityIndex>,

    started_at: Instant,
}

impl SearchService {
    /// Load the four snapshot files named by the config.
    pub fn load(config: ServerConfig) -> ServerResult<Self> {
        let paths = config.snapshots.clone();
        let molecule_substructure = load_substructure(&paths.molecule_substructure)?;
        let reaction_substructure = load_substructure(&paths.reaction_substructure)?;
        let molecule_similarity = load_similarity(&paths.molecule_similarity)?;
        let reaction_similarity = load_similarity(&paths.reaction_similarity)?;

        tracing::info!(
            molecule_substructure = molecule_substructure.len(),
            reaction_substructure = reaction_substructure.len(),
            molecule_similarity = molecule_similarity.len(),
            reaction_similarity = reaction_similarity.len(),
            "loaded index bundle"
        );

        Ok(Self::from_parts(
            config,
            molecule_substructure,
            reaction_substructure,
            molecule_similarity,
            reaction_similarity,
        ))
    }

    /// Assemble a service from already-built indexes (tests, embedding).
    pub fn from_parts(
        config: ServerConfig,
        molecule_substructure: SubstructureIndex,
        reaction_substructure: SubstructureIndex,
        molecule_similarity: SimilarityIndex,
        reaction_similarity: SimilarityIndex,
    ) -> Self {
        Self {
            config: Arc::new(config),
            molecule_substructure: Arc::new(molecule_substructure),
            reaction_substructure: Arc::new(reaction_substructure),
            molecule_similarity: Arc::new(molecule_similarity),
            reaction_similarity: Arc::new(reaction_similarity),
            started_at: Instant::now(),
        }
    }

    /// Route a query to the addressed index.
    pub fn search(
        &self,
        kind: IndexKind,
        target: Target,
        query: &fingerprint::Fingerprint,
    ) -> SearchHits {
        match kind {
            IndexKind::Substructure => self.substructure(target).search(query),
            IndexKind::Similarity => self.similarity(target).search(query),
        }
    }

    pub fn substructure(&self, target: Target) -> &SubstructureIndex {
        match target {
            Target::Molecule => &self.molecule_substructure,
            Target::Reaction => &self.reaction_substructure,
        }
    }

    pub fn similarity(&self, target: Target) -> &SimilarityIndex {
        match target {
            Target::Molecule => &self.molecule_similarity,
            Target::Reaction => &self.reaction_similarity,
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn stats(&self) -> ServiceStats {
        ServiceStats {
            molecule_substructure: self.molecule_substructure.stats(),
            reaction_substructure: self.reaction_substructure.stats(),
            molecule_similarity: self.molecule_similarity.stats(),
            reaction_similarity: self.reaction_similarity.stats(),
        }
    }
}

/// Per-index counters for the stats endpoint.
#[derive(Debug, Serialize)]
pub struct ServiceStats {
    pub molecule_substructure: SubstructureStats,
    pub reaction_substructure: SubstructureStats,
    pub molecule_similarity: SimilarityStats,
    pub reaction_similarity: SimilarityStats,
}

fn load_substructure(path: &Path) -> ServerResult<SubstructureIndex> {
    let bytes = std::fs::read(path).map_err(|e| {
        ServerError::Config(format!("cannot read snapshot {}: {e}", path.display()))
    })?;
    Ok(snapshot::load(&bytes)?.into_substructure()?)
}

fn load_similarity(path: &Path) -> ServerResult<SimilarityIndex> {
    let bytes = std::fs::read(path).map_err(|e| {
        ServerError::Config(format!("cannot read snapshot {}: {e}", path.display()))
    })?;
    Ok(snapshot::load(&bytes)?.into_similarity()?)
}

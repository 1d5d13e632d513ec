//! MinHash configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration for MinHash signature computation.
///
/// Two configs with the same `num_perm` and `seed` produce bit-identical
/// signatures for the same fingerprint, independent of `use_parallel`. The
/// similarity index stores its config inside snapshots so a restored index
/// keeps hashing queries the same way it hashed records at build time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MinHashConfig {
    /// Number of permutation functions (signature length).
    pub num_perm: usize,
    /// Seed for the permutation hash family.
    pub seed: u64,
    /// Compute signature slots on the rayon pool.
    pub use_parallel: bool,
}

impl MinHashConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the signature length. Typical values: 32-256; more permutations
    /// tighten the Jaccard estimate at linear cost.
    pub fn with_num_perm(mut self, num_perm: usize) -> Self {
        self.num_perm = num_perm;
        self
    }

    /// Set the hash-family seed for reproducible signatures.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Enable or disable parallel slot computation.
    pub fn with_parallel(mut self, use_parallel: bool) -> Self {
        self.use_parallel = use_parallel;
        self
    }

    pub fn validate(&self) -> Result<(), MinHashConfigError> {
        if self.num_perm < 2 {
            return Err(MinHashConfigError::InvalidNumPerm {
                num_perm: self.num_perm,
            });
        }
        Ok(())
    }
}

impl Default for MinHashConfig {
    fn default() -> Self {
        Self {
            num_perm: 64,
            seed: 0xFEED_FACE_CAFE_BEEF,
            use_parallel: false,
        }
    }
}

/// Errors for invalid MinHash parameters.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MinHashConfigError {
    #[error("invalid config: num_perm must be >= 2 (got {num_perm})")]
    InvalidNumPerm { num_perm: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let cfg = MinHashConfig::default();
        assert_eq!(cfg.num_perm, 64);
        assert!(!cfg.use_parallel);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn builder_chain() {
        let cfg = MinHashConfig::new()
            .with_num_perm(128)
            .with_seed(42)
            .with_parallel(true);
        assert_eq!(cfg.num_perm, 128);
        assert_eq!(cfg.seed, 42);
        assert!(cfg.use_parallel);
    }

    #[test]
    fn num_perm_below_two_rejected() {
        let cfg = MinHashConfig::new().with_num_perm(1);
        assert!(matches!(
            cfg.validate(),
            Err(MinHashConfigError::InvalidNumPerm { num_perm: 1 })
        ));
    }

    #[test]
    fn serde_roundtrip() {
        let cfg = MinHashConfig::new().with_num_perm(96).with_seed(7);
        let encoded = serde_json::to_string(&cfg).unwrap();
        let decoded: MinHashConfig = serde_json::from_str(&encoded).unwrap();
        assert_eq!(cfg, decoded);
    }
}

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Paths of the four snapshot files the daemon serves.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SnapshotPaths {
    #[serde(default = "default_molecule_substructure")]
    pub molecule_substructure: PathBuf,
    #[serde(default = "default_reaction_substructure")]
    pub reaction_substructure: PathBuf,
    #[serde(default = "default_molecule_similarity")]
    pub molecule_similarity: PathBuf,
    #[serde(default = "default_reaction_similarity")]
    pub reaction_similarity: PathBuf,
}

impl Default for SnapshotPaths {
    fn default() -> Self {
        Self {
            molecule_substructure: default_molecule_substructure(),
            reaction_substructure: default_reaction_substructure(),
            molecule_similarity: default_molecule_similarity(),
            reaction_similarity: default_reaction_similarity(),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum request body size in MB
    #[serde(default = "default_max_body_size_mb")]
    pub max_body_size_mb: usize,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Metrics endpoint enabled
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,

    /// Snapshot bundle to load at startup
    #[serde(default)]
    pub snapshots: SnapshotPaths,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            max_body_size_mb: default_max_body_size_mb(),
            enable_cors: default_true(),
            log_level: default_log_level(),
            metrics_enabled: default_true(),
            snapshots: SnapshotPaths::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from config files and environment variables
    pub fn load() -> anyhow::Result<Self> {
        let builder = config::Config::builder()
            // Load from file if exists
            .add_source(config::File::with_name("chemscreen").required(false))
            // Override with environment variables
            .add_source(config::Environment::with_prefix("CHEMSCREEN_SERVER").separator("__"));

        let config: ServerConfig = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.bind_addr, self.port);
        Ok(addr_str.parse()?)
    }

    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get max body size in bytes
    pub fn max_body_size(&self) -> usize {
        self.max_body_size_mb * 1024 * 1024
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_body_size_mb() -> usize {
    10
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_molecule_substructure() -> PathBuf {
    PathBuf::from("snapshots/molecule_substructure.idx")
}

fn default_reaction_substructure() -> PathBuf {
    PathBuf::from("snapshots/reaction_substructure.idx")
}

fn default_molecule_similarity() -> PathBuf {
    PathBuf::from("snapshots/molecule_similarity.idx")
}

fn default_reaction_similarity() -> PathBuf {
    PathBuf::from("snapshots/reaction_similarity.idx")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.timeout_secs, 30);
        assert_eq!(cfg.max_body_size_mb, 10);
        assert!(cfg.enable_cors);
        assert!(cfg.metrics_enabled);
    }

    #[test]
    fn test_socket_addr() {
        let cfg = ServerConfig::default();
        let addr = cfg.socket_addr().unwrap();
        assert_eq!(addr.port(), 8080);
    }

    #[test]
    fn default_snapshot_paths_are_distinct() {
        let paths = SnapshotPaths::default();
        let all = [
            &paths.molecule_substructure,
            &paths.reaction_substructure,
            &paths.molecule_similarity,
            &paths.reaction_similarity,
        ];
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}

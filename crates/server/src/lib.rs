//! Chemscreen query daemon — HTTP wrapper over prebuilt fingerprint indexes.
//!
//! An offline indexing job builds and snapshots four indexes (molecule and
//! reaction targets, substructure and similarity kinds); this server loads
//! the bundle at startup and answers fingerprint queries over a thin JSON
//! API. The indexes are immutable once loaded, so request handling is pure
//! reads over shared state — replacing an index means restarting the daemon
//! with new snapshot files (replace-on-reload, never in-place mutation).
//!
//! # Endpoints
//!
//! - `POST /{index_type}/{target}` — search one index; `index_type` is
//!   `substructure` or `similarity`, `target` is `molecule` or `reaction`.
//!   Body: `{"fingerprint": [1, 2, 3], "limit": 50}` (`limit` optional).
//!   Response: `{"total": n, "matches": [...]}` where matches are plain ids
//!   or `{"id", "score"}` pairs depending on how the index was built.
//! - `GET /health` — liveness probe
//! - `GET /ready` — readiness probe
//! - `GET /stats` — per-index record counts and geometry
//! - `GET /metrics` — Prometheus metrics

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::{build_router, start_server};
pub use state::{IndexKind, SearchService, Target};

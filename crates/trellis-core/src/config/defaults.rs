//! Default values for Trellis configuration.
//!
//! All hardcoded defaults are centralized here for easy maintenance.

// ============================================================================
// Backend Defaults
// ============================================================================

/// Default storage backend: "memory" or "surreal".
pub const DEFAULT_BACKEND: &str = "surreal";

/// Default on-disk location of the SurrealDB (RocksDB) store.
pub const DEFAULT_DB_PATH: &str = ".trellis/graph";

/// SurrealDB namespace used for the graph.
pub const DEFAULT_DB_NAMESPACE: &str = "trellis";

/// SurrealDB database name used for the graph.
pub const DEFAULT_DB_NAME: &str = "supply_chain";

// ============================================================================
// Query Defaults
// ============================================================================

/// Maximum number of backend calls in flight for one fan-out.
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// Maximum number of hops explored by route search.
pub const DEFAULT_MAX_PATH_LENGTH: usize = 10;

/// Follow IsOccurrence edges to artifact-level SBOM/SLSA/vuln evidence.
pub const DEFAULT_SECONDARY_HOP: bool = true;

/// Per-request deadline in milliseconds (0 disables the deadline).
pub const DEFAULT_QUERY_TIMEOUT_MS: u64 = 0;

// ============================================================================
// Visualizer Defaults
// ============================================================================

/// Base URL of the graph visualizer that accepts `?path=` id lists.
pub const DEFAULT_VISUALIZER_URL: &str = "http://localhost:3000";

// ============================================================================
// File Names
// ============================================================================

/// Project-local config file name.
pub const PROJECT_CONFIG_FILE: &str = "trellis.toml";

/// Directory under the user config dir.
pub const USER_CONFIG_DIR: &str = "trellis";

/// File name inside the user config directory.
pub const USER_CONFIG_FILE: &str = "config.toml";

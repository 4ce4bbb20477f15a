//! Configuration system for the runtime.
//!
//! This module defines the configuration structure and enums used to
//! parameterize the runtime. It provides:
//! 1. **Defaults:** Baseline values for the queue bound and fusion controls.
//! 2. **Fuser Selection:** The four partitioning strategies.
//!
//! Configuration is supplied via JSON from an embedding layer, or use
//! `Config::default()` when embedding directly. Options are read once at
//! init and are process-wide for the owning runtime instance.

use serde::Deserialize;

/// Default configuration constants for the runtime.
mod defaults {
    /// Maximum number of instructions the queue holds before an implicit
    /// flush (2^15).
    pub const QUEUE_MAX: usize = 1 << 15;

    /// Minimum parallel loop extent accepted in a merged kernel.
    /// Zero disables the check.
    pub const MIN_THREADING: u64 = 0;

    /// Whether the fuse cache is consulted on flush.
    pub const CACHE_ENABLED: bool = true;
}

/// Fusion strategy used to partition a flushed instruction list into kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuserKind {
    /// Left-to-right sweep merging each block into the current kernel
    /// while legal.
    Serial,
    /// Layer-by-layer sweep over the dependency DAG; merges only blocks
    /// of equal depth.
    #[serde(alias = "breadth-first")]
    BreadthFirst,
    /// Merges reshapable blocks first, then falls back to breadth-first
    /// over the residual.
    #[serde(alias = "reshapable-first")]
    ReshapableFirst,
    /// Repeatedly merges the neighbouring pair with the highest price
    /// drop until no legal merge remains.
    #[default]
    Greedy,
}

/// Root configuration structure containing all runtime settings.
///
/// # Examples
///
/// Creating a default configuration:
///
/// ```
/// use arrayfuse_core::config::{Config, FuserKind};
///
/// let config = Config::default();
/// assert_eq!(config.fuser, FuserKind::Greedy);
/// assert_eq!(config.min_threading, 0);
/// assert!(config.cache_enabled);
/// ```
///
/// Deserializing from JSON:
///
/// ```
/// use arrayfuse_core::config::{Config, FuserKind};
///
/// let json = r#"{
///     "fuser": "breadth_first",
///     "min_threading": 1024,
///     "queue_max": 4096,
///     "cache_enabled": false
/// }"#;
///
/// let config: Config = serde_json::from_str(json).unwrap();
/// assert_eq!(config.fuser, FuserKind::BreadthFirst);
/// assert_eq!(config.queue_max, 4096);
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Fusion strategy applied on flush.
    #[serde(default)]
    pub fuser: FuserKind,

    /// Smallest parallel loop extent the backend can tolerate in a merged
    /// kernel; 0 disables the check.
    #[serde(default = "Config::default_min_threading")]
    pub min_threading: u64,

    /// Queue capacity; reaching it triggers an implicit guard flush.
    #[serde(default = "Config::default_queue_max")]
    pub queue_max: usize,

    /// Whether repeated workloads may reuse memoized kernel layouts.
    #[serde(default = "Config::default_cache_enabled")]
    pub cache_enabled: bool,
}

impl Config {
    /// Returns the default minimum threading extent.
    fn default_min_threading() -> u64 {
        defaults::MIN_THREADING
    }

    /// Returns the default queue capacity.
    fn default_queue_max() -> usize {
        defaults::QUEUE_MAX
    }

    /// Returns the default fuse-cache toggle.
    fn default_cache_enabled() -> bool {
        defaults::CACHE_ENABLED
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fuser: FuserKind::default(),
            min_threading: defaults::MIN_THREADING,
            queue_max: defaults::QUEUE_MAX,
            cache_enabled: defaults::CACHE_ENABLED,
        }
    }
}

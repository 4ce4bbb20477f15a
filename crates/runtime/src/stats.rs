//! Runtime statistics collection.
//!
//! Tracks counters for the bridge layer. It provides:
//! 1. **Queue activity:** instructions enqueued and flushed, flush count.
//! 2. **Fusion:** kernels dispatched and fuse-cache hit/miss counts.
//! 3. **Registry:** bases created and destroyed.
//! 4. **Failures:** backend execution failures.

use std::fmt;

/// Counters for one runtime instance.
#[derive(Clone, Debug, Default)]
pub struct RuntimeStats {
    /// Instructions accepted into the queue.
    pub instructions_enqueued: u64,
    /// Instructions handed to the backend across all flushes.
    pub instructions_flushed: u64,
    /// Flushes that reached the backend (empty flushes are no-ops).
    pub flushes: u64,
    /// Kernels dispatched to the backend.
    pub kernels_dispatched: u64,
    /// Flushes served from the fuse cache.
    pub fuse_cache_hits: u64,
    /// Flushes that ran the partitioner.
    pub fuse_cache_misses: u64,
    /// Bases allocated in the registry.
    pub bases_created: u64,
    /// Bases retired by executed `Discard` instructions.
    pub bases_destroyed: u64,
    /// Flushes that failed in the backend.
    pub backend_failures: u64,
}

impl RuntimeStats {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Average kernels per dispatched flush.
    pub fn kernels_per_flush(&self) -> f64 {
        if self.flushes == 0 {
            0.0
        } else {
            self.kernels_dispatched as f64 / self.flushes as f64
        }
    }
}

impl fmt::Display for RuntimeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "runtime statistics:")?;
        writeln!(f, "  instructions enqueued: {}", self.instructions_enqueued)?;
        writeln!(f, "  instructions flushed:  {}", self.instructions_flushed)?;
        writeln!(f, "  flushes:               {}", self.flushes)?;
        writeln!(f, "  kernels dispatched:    {}", self.kernels_dispatched)?;
        writeln!(
            f,
            "  fuse cache:            {} hits, {} misses",
            self.fuse_cache_hits, self.fuse_cache_misses
        )?;
        writeln!(
            f,
            "  bases:                 {} created, {} destroyed",
            self.bases_created, self.bases_destroyed
        )?;
        write!(f, "  backend failures:      {}", self.backend_failures)
    }
}

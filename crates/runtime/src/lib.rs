//! Lazy array-computation runtime library.
//!
//! This crate implements the core of a lazy array runtime with the following:
//! 1. **Arrays:** Base storage metadata (`BaseRegistry`) and strided `View` windows.
//! 2. **IR:** Instructions on views, fused `Kernel` groups, and a versioned wire codec.
//! 3. **Fusion:** Four partitioning strategies (serial, breadth-first, reshapable-first,
//!    greedy) that merge instructions into the largest legal kernels.
//! 4. **Caching:** A fuse cache that memoizes kernel layouts by structural signature.
//! 5. **Runtime:** `Runtime` (queue, guard/flush, dispatch) driving a pluggable `Backend`.

/// Base storage metadata and strided view algebra.
pub mod array;
/// Backend trait consumed by the runtime, plus a reference `NullBackend`.
pub mod backend;
/// Common types, constants, and error definitions.
pub mod common;
/// Runtime configuration (defaults, fuser selection, queue bounds).
pub mod config;
/// Fusers, singleton preparation, and the fuse cache.
pub mod fuse;
/// Intermediate representation: opcodes, instructions, kernels, serialization.
pub mod ir;
/// Bounded instruction queue filled by the frontend and drained by `flush`.
pub mod queue;
/// Top-level runtime: enqueue, guard, flush, and retirement.
pub mod runtime;
/// Runtime statistics collection.
pub mod stats;

/// Backend contract; implement this to receive fused kernels.
pub use crate::backend::{Backend, ExtensionId, NullBackend};
/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::{Config, FuserKind};
/// Top-level runtime; owns the registry, queue, fuse cache, and backend.
pub use crate::runtime::Runtime;

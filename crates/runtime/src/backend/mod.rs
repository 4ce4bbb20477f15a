//! Backend contract.
//!
//! The runtime core never executes a kernel itself; it hands the ordered
//! kernel list to a backend. Backends range from single-threaded code
//! generators to multi-device GPU queues or cluster dispatchers; that
//! concurrency is opaque to the core, which drives the backend
//! synchronously from `flush`.

/// Reference backend that accepts every fusion and executes nothing.
pub mod null;

pub use null::NullBackend;

use std::fmt;

use crate::common::error::BackendError;
use crate::config::Config;
use crate::ir::instruction::Instruction;
use crate::ir::kernel::Kernel;

/// Identifier of a registered extension (user-defined function).
///
/// Valid ids are positive; 0 marks "no extension" on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ExtensionId(pub i64);

impl fmt::Display for ExtensionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ext-{}", self.0)
    }
}

/// Executor of fused kernels.
///
/// # Contract
///
/// - `check_fusible` must be pure, deterministic, commutative, and
///   reflexive-true; it encodes the backend's loop-fusibility rules
///   (typically: operand shapes broadcast-compatible after a common
///   reshape, reductions compatible only when their axes align). A pair
///   involving a system opcode (`Sync`, `Discard`, `Free`, `None`) must
///   be accepted: system instructions carry no loop nest and impose no
///   fusibility constraint of their own.
/// - `execute` receives kernels whole: a kernel either executes wholly or
///   fails wholly, and `Discard`/`Free` instructions must take effect only
///   after every non-system instruction of the same kernel has completed.
/// - Kernels arrive with derived input views, output views, and temp bases
///   so the backend can allocate and release per-kernel scratch.
pub trait Backend {
    /// Initializes the backend with the runtime configuration.
    fn init(&mut self, config: &Config) -> Result<(), BackendError>;

    /// Executes the kernel list in order.
    fn execute(&mut self, kernels: &[Kernel]) -> Result<(), BackendError>;

    /// Registers a user-defined extension by name.
    fn register_extension(&mut self, name: &str) -> Result<ExtensionId, BackendError>;

    /// Releases backend resources.
    fn shutdown(&mut self) -> Result<(), BackendError>;

    /// Whether two instructions can participate in the same kernel.
    fn check_fusible(&self, a: &Instruction, b: &Instruction) -> bool;

    /// Whether an input loaded for one fused kernel can be reused by
    /// another, letting shared inputs count as a fusion price drop.
    fn shares_loaded_inputs(&self) -> bool {
        true
    }
}

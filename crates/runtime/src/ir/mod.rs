//! Intermediate representation.
//!
//! A flush snapshots the queue into an `Ir`: an ordered instruction list
//! and, after partitioning, an ordered kernel list. One IR exists per
//! flush; it exclusively owns both lists and is discarded after execution.
//!
//! The module also hosts the opcode set, the instruction/operand model,
//! the kernel model with its fusion-legality predicates, and the wire
//! codec.

use std::fmt;

/// Instruction, operand, and constant definitions.
pub mod instruction;
/// Kernel model: derived input/output/temp lists and fusion legality.
pub mod kernel;
/// Opcode set and classification predicates.
pub mod opcode;
/// Versioned little-endian wire codec.
pub mod serialize;

pub use instruction::{Constant, ExtensionCall, Instruction, Operand};
pub use kernel::Kernel;
pub use opcode::Opcode;

use crate::common::error::DecodeError;
use crate::fuse::FuseContext;

/// One flush worth of instructions, plus the kernels derived from them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Ir {
    /// Flushed instructions, in enqueue order.
    pub instrs: Vec<Instruction>,
    /// Kernel partition; empty before fusion.
    pub kernels: Vec<Kernel>,
}

impl Ir {
    /// Creates an IR from a flushed instruction list; no kernels exist yet.
    pub fn new(instrs: Vec<Instruction>) -> Self {
        Self {
            instrs,
            kernels: Vec::new(),
        }
    }

    /// Price of the IR: the sum of its kernels' prices.
    ///
    /// Used only to rank fusion choices, never to predict performance.
    pub fn cost(&self, ctx: &FuseContext<'_>) -> u64 {
        self.kernels.iter().map(|k| k.cost(ctx)).sum()
    }

    /// Serializes the instruction list (kernels are never serialized; the
    /// receiver re-partitions).
    pub fn to_bytes(&self) -> Vec<u8> {
        serialize::encode(&self.instrs)
    }

    /// Deserializes an IR from bytes produced by [`Ir::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        Ok(Self::new(serialize::decode(bytes)?))
    }
}

impl fmt::Display for Ir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "ir [{} instrs, {} kernels]",
            self.instrs.len(),
            self.kernels.len()
        )?;
        for (index, kernel) in self.kernels.iter().enumerate() {
            write!(f, "kernel-{index} {kernel}")?;
        }
        Ok(())
    }
}

//! Fuse cache.
//!
//! Memoizes the kernel partition of a flushed instruction list so repeat
//! workloads skip the partitioner. The key is a 64-bit hash over the
//! sequence of (opcode, per-operand structural signature) tuples, where a
//! view's base is abstracted to its positional index in a first-seen
//! `base_ids` vector. Two instruction lists that differ only in which
//! concrete bases occupy each positional slot therefore hash to the same
//! key, and a hit is materialized by replaying the cached partition over
//! the caller's instructions, substituting the caller's bases at the
//! cached positions.
//!
//! The signature covers everything the legality predicates may consult
//! (opcode, rank, shape, stride, start, constant type, extension id) and
//! nothing they may not (data pointers, element values), so hits are
//! trusted without re-verifying fusibility. Keys are computed after the
//! canonical reshape pass, which is idempotent, so queued and replayed
//! lists agree. Entries are invalidated only when the cache is cleared.

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use tracing::trace;

use crate::array::base::BaseId;
use crate::ir::instruction::{Instruction, Operand};
use crate::ir::kernel::Kernel;

use super::singleton;

/// A memoized kernel layout: per-kernel instruction counts over the
/// canonical instruction order, plus the base id vector the layout was
/// canonicalized with.
#[derive(Clone, Debug)]
struct CachePayload {
    kernel_lens: Vec<usize>,
    base_ids: Vec<BaseId>,
}

/// Hash-keyed store of memoized kernel layouts.
#[derive(Debug, Default)]
pub struct FuseCache {
    entries: HashMap<u64, CachePayload>,
}

impl FuseCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of memoized layouts.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the cache holds no layouts.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every memoized layout.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Structural key of an instruction list.
    ///
    /// Bases are abstracted to their first-seen position, so the key is
    /// invariant under renaming of concrete bases.
    pub fn key_of(instrs: &[Instruction]) -> u64 {
        let mut hasher = DefaultHasher::new();
        let mut slots: Vec<BaseId> = Vec::new();
        for instr in instrs {
            instr.opcode.to_wire().hash(&mut hasher);
            for operand in &instr.operands {
                match operand {
                    Operand::View(view) => {
                        let slot = slot_of(&mut slots, view.base);
                        0i8.hash(&mut hasher);
                        slot.hash(&mut hasher);
                        view.start.hash(&mut hasher);
                        view.shape.hash(&mut hasher);
                        view.stride.hash(&mut hasher);
                    }
                    Operand::Constant(constant) => {
                        1i8.hash(&mut hasher);
                        constant.elem_type.to_wire().hash(&mut hasher);
                    }
                }
            }
            instr.ext.as_ref().map_or(0, |e| e.id.0).hash(&mut hasher);
        }
        hasher.finish()
    }

    /// Checks the cache for a layout matching `instrs`.
    ///
    /// Applies the canonical reshape to `instrs` in place (so hit and miss
    /// paths agree on the instruction shapes), then materializes the
    /// cached partition over the caller's instructions on a hit.
    pub fn get(&self, instrs: &mut [Instruction]) -> Option<Vec<Kernel>> {
        for instr in instrs.iter_mut() {
            singleton::reshape_instruction(instr);
        }
        let key = Self::key_of(instrs);
        let payload = self.entries.get(&key)?;
        if payload.kernel_lens.iter().sum::<usize>() != instrs.len() {
            return None;
        }
        let mut kernels = Vec::with_capacity(payload.kernel_lens.len());
        let mut offset = 0;
        for &len in &payload.kernel_lens {
            let mut kernel = Kernel::new();
            for instr in &instrs[offset..offset + len] {
                kernel.add_instr(instr.clone());
            }
            offset += len;
            kernels.push(kernel);
        }
        trace!(key, kernels = kernels.len(), "fuse cache hit");
        Some(kernels)
    }

    /// Stores the layout computed for `instrs` (already reshaped by the
    /// singleton pass).
    pub fn insert(&mut self, instrs: &[Instruction], kernels: &[Kernel]) {
        let key = Self::key_of(instrs);
        let mut slots: Vec<BaseId> = Vec::new();
        for instr in instrs {
            for operand in &instr.operands {
                if let Operand::View(view) = operand {
                    let _ = slot_of(&mut slots, view.base);
                }
            }
        }
        let payload = CachePayload {
            kernel_lens: kernels.iter().map(|k| k.instr_list().len()).collect(),
            base_ids: slots,
        };
        trace!(key, kernels = kernels.len(), "fuse cache insert");
        let _ = self.entries.insert(key, payload);
    }

    /// Number of base slots the layout under `key` was canonicalized with.
    pub fn slot_count(&self, key: u64) -> Option<usize> {
        self.entries.get(&key).map(|p| p.base_ids.len())
    }
}

/// Positional index of `base` in the first-seen slot vector, appending it
/// when new.
fn slot_of(slots: &mut Vec<BaseId>, base: BaseId) -> usize {
    if let Some(pos) = slots.iter().position(|&b| b == base) {
        return pos;
    }
    slots.push(base);
    slots.len() - 1
}

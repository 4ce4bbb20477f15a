//! Singleton block preparation.
//!
//! Produces the initial block list the fusers work on: one kernel per
//! instruction, in original order. Before blocks are formed, every
//! elementwise instruction is *reshaped*: axes that address one contiguous
//! run in all view operands collapse into a single axis, and shared
//! length-1 axes are dropped. Collapsing maximizes cross-instruction shape
//! compatibility without changing semantics, and the rewrite is
//! idempotent.

use crate::ir::instruction::{Instruction, Operand};
use crate::ir::kernel::Kernel;

/// Reshapes an instruction in place by collapsing trivially contiguous
/// axes of its view operands.
///
/// Only elementwise instructions are rewritten; reductions are locked to
/// their axis and system instructions carry no loop nest.
pub fn reshape_instruction(instr: &mut Instruction) {
    if !instr.opcode.is_elementwise() {
        return;
    }
    loop {
        let (merge_at, drop_at) = {
            let views: Vec<_> = instr
                .operands
                .iter()
                .filter_map(Operand::as_view)
                .collect();
            let Some(first) = views.first() else {
                return;
            };
            let rank = first.rank();
            let merge_at = (0..rank.saturating_sub(1))
                .find(|&axis| views.iter().all(|v| v.can_merge_axes(axis)));
            let drop_at = (rank > 1)
                .then(|| (0..rank).find(|&axis| views.iter().all(|v| v.shape[axis] == 1)))
                .flatten();
            (merge_at, drop_at)
        };

        if let Some(axis) = merge_at {
            for operand in &mut instr.operands {
                if let Some(view) = operand.as_view_mut() {
                    view.merge_axes(axis);
                }
            }
        } else if let Some(axis) = drop_at {
            for operand in &mut instr.operands {
                if let Some(view) = operand.as_view_mut() {
                    view.drop_axis(axis);
                }
            }
        } else {
            return;
        }
    }
}

/// Whether an instruction's loop nest is still freely reshapable.
///
/// True when every view operand is dense row-major, so the nest can be
/// collapsed further to match a peer. Reductions and extension calls are
/// locked; system instructions follow their kernel.
pub fn is_reshapable(instr: &Instruction) -> bool {
    if instr.opcode.is_system() {
        return true;
    }
    if !instr.opcode.is_elementwise() {
        return false;
    }
    instr
        .operands
        .iter()
        .filter_map(Operand::as_view)
        .all(|v| v.is_contiguous())
}

/// Reshapes every instruction, then wraps each in its own kernel.
pub fn build(instrs: &mut [Instruction]) -> Vec<Kernel> {
    for instr in instrs.iter_mut() {
        reshape_instruction(instr);
    }
    instrs
        .iter()
        .map(|instr| Kernel::from_instr(instr.clone()))
        .collect()
}

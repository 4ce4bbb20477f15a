//! Reshapable-first fuser.
//!
//! Blocks whose loop nests are still freely reshapable (all operand views
//! dense row-major) can adapt to any peer, so they merge first; blocks
//! locked to a specific nest (reductions, strided windows) are left for a
//! breadth-first pass over the residual.

use tracing::trace;

use crate::fuse::{FuseContext, attach_system, breadth_first, singleton};
use crate::ir::kernel::Kernel;

/// Whether every instruction of the kernel is still reshapable.
fn is_reshapable(kernel: &Kernel) -> bool {
    kernel.instr_list().iter().all(singleton::is_reshapable)
}

/// Fuses `blocks`, prioritizing merges among reshapable peers.
pub fn fuse(blocks: &mut Vec<Kernel>, ctx: &FuseContext<'_>) {
    attach_system(blocks, ctx);

    // Pass 1: saturate merges among neighbouring reshapable peers.
    loop {
        let mut merged_any = false;
        let mut index = 0;
        while index + 1 < blocks.len() {
            if is_reshapable(&blocks[index])
                && is_reshapable(&blocks[index + 1])
                && ctx.merge_allowed(&blocks[index], &blocks[index + 1])
            {
                let merged = Kernel::merge(&blocks[index], &blocks[index + 1]);
                blocks[index] = merged;
                let _ = blocks.remove(index + 1);
                merged_any = true;
            } else {
                index += 1;
            }
        }
        if !merged_any {
            break;
        }
    }

    // Pass 2: breadth-first over the residual.
    breadth_first::fuse_layers(blocks, ctx);
    trace!(kernels = blocks.len(), "reshapable-first fuse complete");
}

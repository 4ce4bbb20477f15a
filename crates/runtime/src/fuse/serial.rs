//! Serial sweep fuser.
//!
//! Left-to-right sweep over the block list. A current block accumulates
//! neighbours while the merge stays legal; the first illegal neighbour
//! seals the current kernel and starts the next one. System-only blocks
//! attach to their predecessor first, under `fusible_gently`.

use tracing::trace;

use crate::fuse::{FuseContext, attach_system};
use crate::ir::kernel::Kernel;

/// Fuses `blocks` in a serial naive manner.
pub fn fuse(blocks: &mut Vec<Kernel>, ctx: &FuseContext<'_>) {
    attach_system(blocks, ctx);
    let drained = std::mem::take(blocks);
    let mut current: Option<Kernel> = None;
    for next in drained {
        match current.take() {
            None => current = Some(next),
            Some(block) => {
                if ctx.merge_allowed(&block, &next) {
                    current = Some(Kernel::merge(&block, &next));
                } else {
                    blocks.push(block);
                    current = Some(next);
                }
            }
        }
    }
    if let Some(block) = current {
        blocks.push(block);
    }
    trace!(kernels = blocks.len(), "serial fuse complete");
}

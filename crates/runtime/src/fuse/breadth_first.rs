//! Breadth-first fuser.
//!
//! Builds the dependency DAG over blocks and sweeps it layer by layer.
//! Within a layer, neighbouring blocks of equal depth merge greedily; the
//! sweep advances to the next layer only when the current one is
//! saturated. Determinism comes from visiting blocks in original index
//! order within each layer.
//!
//! Producer/consumer chains land in different layers, so this strategy
//! fuses breadth (independent work of the same depth) rather than depth.

use tracing::trace;

use crate::fuse::{FuseContext, attach_system};
use crate::ir::kernel::Kernel;

/// Depth of every block in the dependency DAG.
///
/// A block's depth is one more than the deepest earlier block it conflicts
/// with; roots sit at depth 0. Dependencies only ever point backwards in
/// the list, so a single forward pass suffices.
pub(crate) fn depths(blocks: &[Kernel]) -> Vec<u64> {
    let mut depth = vec![0u64; blocks.len()];
    for later in 0..blocks.len() {
        for earlier in 0..later {
            if blocks[earlier].dependency(&blocks[later]) {
                depth[later] = depth[later].max(depth[earlier] + 1);
            }
        }
    }
    depth
}

/// Fuses `blocks` in a topological breadth-first manner.
pub fn fuse(blocks: &mut Vec<Kernel>, ctx: &FuseContext<'_>) {
    attach_system(blocks, ctx);
    fuse_layers(blocks, ctx);
    trace!(kernels = blocks.len(), "breadth-first fuse complete");
}

/// Layer sweep shared with the reshapable-first fuser.
pub(crate) fn fuse_layers(blocks: &mut Vec<Kernel>, ctx: &FuseContext<'_>) {
    let mut depth = depths(blocks);
    let Some(&max_depth) = depth.iter().max() else {
        return;
    };
    for layer in 0..=max_depth {
        // Saturate this layer: repeat until a full sweep merges nothing.
        loop {
            let mut merged_any = false;
            let mut index = 0;
            while index + 1 < blocks.len() {
                if depth[index] == layer
                    && depth[index + 1] == layer
                    && ctx.merge_allowed(&blocks[index], &blocks[index + 1])
                {
                    let merged = Kernel::merge(&blocks[index], &blocks[index + 1]);
                    blocks[index] = merged;
                    let _ = blocks.remove(index + 1);
                    let _ = depth.remove(index + 1);
                    merged_any = true;
                } else {
                    index += 1;
                }
            }
            if !merged_any {
                break;
            }
        }
    }
}

//! Greedy fuser.
//!
//! Repeatedly merges the neighbouring pair with the highest price drop.
//! Each round scores every adjacent pair with `dependency_cost` (−1 marks
//! an illegal fusion and is skipped), merges the best one, and rescans the
//! affected neighbourhood. Zero-drop fusible pairs still merge after all
//! positive drops are exhausted, which is what coalesces a batch of
//! independent same-shape instructions into one kernel; the loop stops
//! when no fusible neighbouring pair remains.
//!
//! Ties break toward the lower left-endpoint index, keeping the result
//! deterministic. System-only blocks attach to their predecessor first,
//! under `fusible_gently`.

use tracing::trace;

use crate::fuse::{FuseContext, attach_system};
use crate::ir::kernel::Kernel;

/// Fuses `blocks` greedily by descending price drop.
pub fn fuse(blocks: &mut Vec<Kernel>, ctx: &FuseContext<'_>) {
    attach_system(blocks, ctx);
    loop {
        let mut best: Option<(usize, i64)> = None;
        for index in 0..blocks.len().saturating_sub(1) {
            if !ctx.threading_ok(&blocks[index], &blocks[index + 1]) {
                continue;
            }
            // The later block consumes the earlier one's outputs.
            let drop = blocks[index + 1].dependency_cost(&blocks[index], ctx);
            if drop < 0 {
                continue;
            }
            let better = match best {
                None => true,
                Some((_, best_drop)) => drop > best_drop,
            };
            if better {
                best = Some((index, drop));
            }
        }
        let Some((index, drop)) = best else {
            break;
        };
        trace!(index, drop, "greedy merge");
        let merged = Kernel::merge(&blocks[index], &blocks[index + 1]);
        blocks[index] = merged;
        let _ = blocks.remove(index + 1);
    }
}

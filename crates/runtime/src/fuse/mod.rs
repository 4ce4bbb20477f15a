//! Fusion engine.
//!
//! The partitioner takes a singleton block list (one kernel per
//! instruction, in original order) and merges neighbouring blocks under
//! legality. Restricting merges to neighbours keeps every kernel a
//! contiguous run of the flushed instruction list, so concatenating the
//! emitted kernels reproduces the input order exactly and the kernel order
//! stays topological with respect to data dependencies.
//!
//! Four strategies are provided:
//! 1. **Serial:** left-to-right sweep into a current block.
//! 2. **Breadth-first:** dependency-layer sweep, saturating each layer.
//! 3. **Reshapable-first:** reshapable peers first, breadth-first residual.
//! 4. **Greedy:** highest price-drop neighbour pair first.

/// Breadth-first fuser over dependency layers.
pub mod breadth_first;
/// Fuse cache memoizing kernel layouts by structural signature.
pub mod cache;
/// Greedy highest-price-drop fuser.
pub mod greedy;
/// Reshapable-first fuser.
pub mod reshapable;
/// Serial sweep fuser.
pub mod serial;
/// Singleton block preparation and instruction reshaping.
pub mod singleton;

pub use cache::FuseCache;

use crate::array::base::BaseRegistry;
use crate::array::view::View;
use crate::config::FuserKind;
use crate::ir::instruction::Instruction;
use crate::ir::kernel::Kernel;

/// Legality context threaded through every fusion decision.
///
/// Wraps the backend's `check_fusible` predicate (system opcodes
/// short-circuit to fusible), the registry used for view pricing, and the
/// fusion tuning knobs.
pub struct FuseContext<'a> {
    registry: &'a BaseRegistry,
    check: &'a dyn Fn(&Instruction, &Instruction) -> bool,
    /// Smallest parallel loop extent accepted in a merged kernel; 0
    /// disables the check.
    pub min_threading: u64,
    /// Whether an input shared between two kernels counts as a price drop
    /// (backend can reuse a loaded tile).
    pub count_shared_inputs: bool,
}

impl<'a> FuseContext<'a> {
    /// Creates a context over a registry and a fusibility predicate.
    pub fn new(
        registry: &'a BaseRegistry,
        check: &'a dyn Fn(&Instruction, &Instruction) -> bool,
        min_threading: u64,
        count_shared_inputs: bool,
    ) -> Self {
        Self {
            registry,
            check,
            min_threading,
            count_shared_inputs,
        }
    }

    /// Whether two instructions may share a kernel.
    ///
    /// Delegates to the backend's `check_fusible` for every pair, with no
    /// special-casing here. Accepting pairs that involve a system opcode
    /// is part of the backend's contract (they carry no loop nest).
    pub fn fusible(&self, a: &Instruction, b: &Instruction) -> bool {
        (self.check)(a, b)
    }

    /// Price of a view: distinct elements times element size.
    pub fn cost_of_view(&self, view: &View) -> u64 {
        view.nelements_nbcast() * self.registry.elem_size(view.base)
    }

    /// Whether merging `a` and `b` keeps enough parallelism.
    pub fn threading_ok(&self, a: &Kernel, b: &Kernel) -> bool {
        self.min_threading == 0 || a.threading().max(b.threading()) >= self.min_threading
    }

    /// Full merge legality for neighbouring blocks: pairwise fusibility
    /// plus the threading floor.
    pub fn merge_allowed(&self, a: &Kernel, b: &Kernel) -> bool {
        self.threading_ok(a, b) && a.fusible(b, self)
    }
}

impl std::fmt::Debug for FuseContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FuseContext")
            .field("min_threading", &self.min_threading)
            .field("count_shared_inputs", &self.count_shared_inputs)
            .finish_non_exhaustive()
    }
}

/// Partitions `instrs` into kernels with the selected strategy.
///
/// Instructions may be reshaped in place before partitioning (trivially
/// contiguous axes collapse to widen shape compatibility).
pub fn partition(
    instrs: &mut [Instruction],
    ctx: &FuseContext<'_>,
    kind: FuserKind,
) -> Vec<Kernel> {
    let mut blocks = singleton::build(instrs);
    match kind {
        FuserKind::Serial => serial::fuse(&mut blocks, ctx),
        FuserKind::BreadthFirst => breadth_first::fuse(&mut blocks, ctx),
        FuserKind::ReshapableFirst => reshapable::fuse(&mut blocks, ctx),
        FuserKind::Greedy => greedy::fuse(&mut blocks, ctx),
    }
    blocks
}

/// Folds every block consisting only of system opcodes into its
/// predecessor when gently fusible (always, for an all-system block).
///
/// Every strategy runs this first: it keeps `Discard`/`Free`/`Sync` in
/// the kernel of the instruction that produced their base even when the
/// backend refuses every computational merge, and it is the one place
/// where `fusible_gently` (rather than the general predicate) decides.
pub(crate) fn attach_system(blocks: &mut Vec<Kernel>, ctx: &FuseContext<'_>) {
    let mut index = 1;
    while index < blocks.len() {
        if blocks[index].is_system_only()
            && blocks[index - 1].fusible_gently(&blocks[index], ctx)
        {
            let merged = Kernel::merge(&blocks[index - 1], &blocks[index]);
            blocks[index - 1] = merged;
            let _ = blocks.remove(index);
        } else {
            index += 1;
        }
    }
}

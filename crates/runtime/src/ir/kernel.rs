//! Kernel model and fusion legality.
//!
//! A kernel is an ordered group of instructions intended to execute as one
//! fused loop nest. Building a kernel is nothing but repeated `add_instr`
//! calls, which maintain three derived lists:
//!
//! - `inputs`: views read by some instruction and not produced earlier in
//!   the same kernel,
//! - `outputs`: views written by some instruction whose base is not
//!   discarded later in the same kernel,
//! - `temps`: bases written and then discarded entirely inside the kernel,
//!   so the backend can treat them as per-kernel scratch.
//!
//! Backends must retire `Discard`/`Free` instructions only after every
//! non-system instruction of the same kernel has completed.

use std::fmt;

use crate::array::base::BaseId;
use crate::array::view::View;
use crate::fuse::FuseContext;
use crate::ir::instruction::Instruction;
use crate::ir::opcode::Opcode;

/// An ordered group of instructions executed as one fused loop nest.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Kernel {
    instrs: Vec<Instruction>,
    inputs: Vec<View>,
    outputs: Vec<View>,
    temps: Vec<BaseId>,
}

impl Kernel {
    /// Creates an empty kernel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a kernel holding a single instruction.
    pub fn from_instr(instr: Instruction) -> Self {
        let mut kernel = Self::new();
        kernel.add_instr(instr);
        kernel
    }

    /// Instructions of this kernel, in original relative order.
    pub fn instr_list(&self) -> &[Instruction] {
        &self.instrs
    }

    /// Views read from outside the kernel.
    pub fn input_list(&self) -> &[View] {
        &self.inputs
    }

    /// Views surviving the kernel as outputs.
    pub fn output_list(&self) -> &[View] {
        &self.outputs
    }

    /// Bases written and discarded entirely inside the kernel.
    pub fn temp_list(&self) -> &[BaseId] {
        &self.temps
    }

    /// Appends an instruction, updating the input/output/temp bookkeeping.
    pub fn add_instr(&mut self, instr: Instruction) {
        if instr.opcode == Opcode::Discard {
            if let Some(base) = instr.written_base() {
                if let Some(pos) = self.outputs.iter().position(|o| o.base == base) {
                    self.temps.push(base);
                    let _ = self.outputs.remove(pos);
                }
            }
        } else if instr.opcode != Opcode::Free && !instr.operands.is_empty() {
            if let Some(target) = instr.write_view() {
                if !self.outputs.iter().any(|o| o.aligned(target)) {
                    self.outputs.push(target.clone());
                }
            }
            for view in instr.read_views() {
                if self.inputs.iter().any(|i| i.aligned(view)) {
                    continue;
                }
                let local_source = self
                    .instrs
                    .iter()
                    .filter_map(Instruction::write_view)
                    .any(|w| w.aligned(view));
                if !local_source {
                    self.inputs.push(view.clone());
                }
            }
        }
        self.instrs.push(instr);
    }

    /// Merges two kernels, replaying `b` after `a` so the derived lists
    /// stay consistent.
    pub fn merge(a: &Self, b: &Self) -> Self {
        let mut merged = Self::new();
        for instr in a.instrs.iter().chain(&b.instrs) {
            merged.add_instr(instr.clone());
        }
        merged
    }

    /// Whether this kernel and `other` touch a common base with at least
    /// one writer (RAW, WAW, or WAR on base identity).
    pub fn dependency(&self, other: &Self) -> bool {
        self.instrs
            .iter()
            .any(|i| other.instrs.iter().any(|o| i.conflicts(o)))
    }

    /// Whether every instruction pair across the two kernels is fusible.
    pub fn fusible(&self, other: &Self, ctx: &FuseContext<'_>) -> bool {
        self.instrs
            .iter()
            .all(|i| other.instrs.iter().all(|o| ctx.fusible(i, o)))
    }

    /// Whether `instr` may join this kernel without changing its
    /// dependency footprint.
    ///
    /// System instructions always may; a kernel made entirely of system
    /// instructions accepts anything; otherwise `instr` must be fusible
    /// with at least one computational instruction already present.
    pub fn fusible_gently_instr(&self, instr: &Instruction, ctx: &FuseContext<'_>) -> bool {
        if instr.opcode.is_system() {
            return true;
        }
        if self.is_system_only() {
            return true;
        }
        self.instrs
            .iter()
            .filter(|i| !i.opcode.is_system())
            .any(|i| ctx.fusible(instr, i))
    }

    /// Whether every instruction of `other` is gently fusible with this
    /// kernel.
    pub fn fusible_gently(&self, other: &Self, ctx: &FuseContext<'_>) -> bool {
        other
            .instrs
            .iter()
            .all(|i| self.fusible_gently_instr(i, ctx))
    }

    /// Whether every instruction of the kernel is a system opcode.
    pub fn is_system_only(&self) -> bool {
        self.instrs.iter().all(|i| i.opcode.is_system())
    }

    /// Whether the kernel holds a `Discard` of `base`.
    pub fn contains_discard_of(&self, base: BaseId) -> bool {
        self.instrs
            .iter()
            .any(|i| i.opcode == Opcode::Discard && i.written_base() == Some(base))
    }

    /// Price of the kernel: bytes moved across its input and output views.
    ///
    /// A pricing function, not a performance predictor; its sole use is to
    /// rank fusion choices.
    pub fn cost(&self, ctx: &FuseContext<'_>) -> u64 {
        self.inputs
            .iter()
            .chain(&self.outputs)
            .map(|v| ctx.cost_of_view(v))
            .sum()
    }

    /// Price drop the IR gains if this kernel is fused with `other`.
    ///
    /// Zero when `self` and `other` are the same kernel; −1 when fusion is
    /// illegal. Otherwise the drop counts inputs of `self` served by
    /// `other` (its outputs always, its inputs when the backend reports it
    /// can share loaded tiles), plus outputs of `other` that `self`
    /// discards. A zero drop is possible because of system instructions.
    pub fn dependency_cost(&self, other: &Self, ctx: &FuseContext<'_>) -> i64 {
        if std::ptr::eq(self, other) {
            return 0;
        }
        if !self.fusible(other, ctx) {
            return -1;
        }
        let mut price_drop: i64 = 0;
        for input in &self.inputs {
            for output in &other.outputs {
                if input.aligned(output) {
                    price_drop += ctx.cost_of_view(input) as i64;
                }
            }
            if ctx.count_shared_inputs {
                for shared in &other.inputs {
                    if input.aligned(shared) {
                        price_drop += ctx.cost_of_view(input) as i64;
                    }
                }
            }
        }
        for output in &other.outputs {
            if self.contains_discard_of(output.base) {
                price_drop += ctx.cost_of_view(output) as i64;
            }
        }
        price_drop
    }

    /// Largest loop extent any instruction of the kernel sweeps.
    ///
    /// This is the parallelism the backend can exploit; merges are refused
    /// when it falls below the configured `min_threading`.
    pub fn threading(&self) -> u64 {
        self.instrs
            .iter()
            .map(Instruction::sweep_extent)
            .max()
            .unwrap_or(0)
    }
}

impl fmt::Display for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "kernel [{} instrs, {} in, {} out, {} temp]",
            self.instrs.len(),
            self.inputs.len(),
            self.outputs.len(),
            self.temps.len()
        )?;
        for instr in &self.instrs {
            writeln!(f, "  {}", instr.opcode)?;
        }
        Ok(())
    }
}

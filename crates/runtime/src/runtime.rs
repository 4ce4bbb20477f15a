//! Top-level runtime.
//!
//! `Runtime` threads the whole pipeline together: the frontend records
//! instructions through `enqueue` (guarded against queue overflow by an
//! implicit flush), and `flush` promotes the queue to an IR, consults the
//! fuse cache, runs the configured fuser on a miss, dispatches the kernel
//! list to the backend, and reaps retired bases.
//!
//! Scheduling is single-threaded cooperative: nothing here is concurrent,
//! and the only suspension point is `flush`, which invokes the backend
//! synchronously. A caller that wants to multiplex independent graphs
//! instantiates independent runtimes.

use tracing::{debug, trace};

use crate::array::base::{BaseId, BaseRegistry};
use crate::array::view::View;
use crate::backend::{Backend, ExtensionId};
use crate::common::error::{BackendError, ContractError, InitError, RuntimeError};
use crate::common::types::ElemType;
use crate::config::Config;
use crate::fuse::{self, FuseCache, FuseContext};
use crate::ir::Ir;
use crate::ir::instruction::{ExtensionCall, Instruction, Operand};
use crate::ir::opcode::Opcode;
use crate::queue::InstructionQueue;
use crate::stats::RuntimeStats;

/// A lazy array-computation runtime over one backend.
#[derive(Debug)]
pub struct Runtime<B: Backend> {
    config: Config,
    registry: BaseRegistry,
    queue: InstructionQueue,
    cache: FuseCache,
    backend: B,
    stats: RuntimeStats,
}

impl<B: Backend> Runtime<B> {
    /// Creates a runtime, initializing the backend.
    ///
    /// A backend initialization failure is fatal and surfaces here.
    pub fn new(config: Config, mut backend: B) -> Result<Self, InitError> {
        backend.init(&config).map_err(InitError::Backend)?;
        let queue = InstructionQueue::new(config.queue_max);
        Ok(Self {
            config,
            registry: BaseRegistry::new(),
            queue,
            cache: FuseCache::new(),
            backend,
            stats: RuntimeStats::new(),
        })
    }

    /// The configuration the runtime was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The base registry.
    pub fn registry(&self) -> &BaseRegistry {
        &self.registry
    }

    /// The backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable access to the backend.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Runtime counters.
    pub fn stats(&self) -> &RuntimeStats {
        &self.stats
    }

    /// The fuse cache.
    pub fn fuse_cache(&self) -> &FuseCache {
        &self.cache
    }

    /// Drops every memoized kernel layout.
    pub fn clear_fuse_cache(&mut self) {
        self.cache.clear();
    }

    /// Number of pending instructions in the queue.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Allocates a new base; its data stays unmaterialized until the
    /// backend fills it.
    pub fn new_base(&mut self, elem_type: ElemType, nelem: u64) -> Result<BaseId, ContractError> {
        let id = self.registry.new_base(elem_type, nelem)?;
        self.stats.bases_created += 1;
        Ok(id)
    }

    /// Queues a `Discard` for `base`.
    ///
    /// The base is retired only when the instruction executes; discarding
    /// the same base twice before that is a contract violation.
    pub fn discard(&mut self, base: BaseId) -> Result<(), RuntimeError> {
        let view = self.full_view(base)?;
        self.registry.mark_discard(base)?;
        let instr = Instruction::new(Opcode::Discard, vec![Operand::View(view)]);
        if let Err(err) = self.enqueue(instr) {
            // The instruction never reached the queue; allow a retry.
            self.registry.clear_discard(base);
            return Err(err);
        }
        Ok(())
    }

    /// Queues a `Free` for `base`: the data buffer is released when the
    /// instruction executes, the metadata survives.
    pub fn free(&mut self, base: BaseId) -> Result<(), RuntimeError> {
        let view = self.full_view(base)?;
        self.enqueue(Instruction::new(Opcode::Free, vec![Operand::View(view)]))
    }

    /// Queues a `Sync` for `base`, requesting host-visible data. Follow
    /// with [`Runtime::flush`] before reading.
    pub fn sync(&mut self, base: BaseId) -> Result<(), RuntimeError> {
        let view = self.full_view(base)?;
        self.enqueue(Instruction::new(Opcode::Sync, vec![Operand::View(view)]))
    }

    /// Registers a user-defined extension with the backend.
    ///
    /// A rejected registration is fatal, as is a non-positive id.
    pub fn register_extension(&mut self, name: &str) -> Result<ExtensionId, InitError> {
        let id = self
            .backend
            .register_extension(name)
            .map_err(|source| InitError::Extension {
                name: name.to_string(),
                source,
            })?;
        if id.0 <= 0 {
            return Err(InitError::Extension {
                name: name.to_string(),
                source: BackendError::new(id.0 as i32, "invalid extension id"),
            });
        }
        Ok(id)
    }

    /// Queues an opaque extension call.
    ///
    /// The payload is owned by the IR until the containing kernel
    /// executes and is released on both success and failure of the flush.
    pub fn enqueue_extension(
        &mut self,
        id: ExtensionId,
        payload: Vec<u8>,
    ) -> Result<(), RuntimeError> {
        self.enqueue(Instruction::user_func(ExtensionCall { id, payload }))
    }

    /// Appends an instruction to the queue.
    ///
    /// Validates the instruction first (a rejected instruction leaves the
    /// queue untouched), then guards against overflow with an implicit
    /// flush. A backend error during the guard flush discards the new
    /// instruction and leaves the queue empty.
    pub fn enqueue(&mut self, instr: Instruction) -> Result<(), RuntimeError> {
        instr.validate(&self.registry)?;
        let _ = self.guard()?;
        self.queue.push(instr);
        self.stats.instructions_enqueued += 1;
        Ok(())
    }

    /// Flushes the queue when it is about to overflow.
    fn guard(&mut self) -> Result<usize, RuntimeError> {
        if self.queue.is_full() {
            self.flush_queue()
        } else {
            Ok(0)
        }
    }

    /// Flushes the instruction queue.
    ///
    /// Builds the IR, partitions it into kernels (or replays a memoized
    /// layout), dispatches to the backend, and retires executed
    /// `Discard`/`Free` instructions. Returns the number of instructions
    /// flushed; an empty queue flushes as a no-op without touching the
    /// backend.
    pub fn flush(&mut self) -> Result<usize, RuntimeError> {
        if self.queue.is_empty() {
            return Ok(0);
        }
        self.flush_queue()
    }

    /// Flushes pending work and shuts the backend down.
    pub fn shutdown(&mut self) -> Result<(), RuntimeError> {
        let _ = self.flush()?;
        self.backend.shutdown().map_err(RuntimeError::Backend)
    }

    /// Dense whole-base view used by the system instruction helpers.
    fn full_view(&self, base: BaseId) -> Result<View, ContractError> {
        let record = self
            .registry
            .get(base)
            .ok_or(ContractError::UnknownBase(base))?;
        Ok(View::new(base, 0, vec![record.nelem as i64], vec![1]))
    }

    /// Drains the queue and drives one batch through fusion and dispatch.
    fn flush_queue(&mut self) -> Result<usize, RuntimeError> {
        let mut instrs = self.queue.take();
        let count = instrs.len();

        let cached = if self.config.cache_enabled {
            self.cache.get(&mut instrs)
        } else {
            None
        };
        let hit = cached.is_some();
        let kernels = match cached {
            Some(kernels) => kernels,
            None => {
                let backend = &self.backend;
                let check =
                    |a: &Instruction, b: &Instruction| backend.check_fusible(a, b);
                let ctx = FuseContext::new(
                    &self.registry,
                    &check,
                    self.config.min_threading,
                    backend.shares_loaded_inputs(),
                );
                fuse::partition(&mut instrs, &ctx, self.config.fuser)
            }
        };
        if self.config.cache_enabled {
            if hit {
                self.stats.fuse_cache_hits += 1;
            } else {
                self.stats.fuse_cache_misses += 1;
                self.cache.insert(&instrs, &kernels);
            }
        }

        let mut ir = Ir::new(instrs);
        ir.kernels = kernels;
        debug!(
            instructions = count,
            kernels = ir.kernels.len(),
            cache_hit = hit,
            "flush"
        );
        trace!(layout = %ir, "kernel layout");
        self.stats.flushes += 1;
        self.stats.instructions_flushed += count as u64;
        self.stats.kernels_dispatched += ir.kernels.len() as u64;

        match self.backend.execute(&ir.kernels) {
            Ok(()) => {
                self.reap(&ir);
                Ok(count)
            }
            Err(err) => {
                self.stats.backend_failures += 1;
                // The Discard instructions of this batch are gone without
                // executing; unmark their bases so the caller can inspect
                // state and discard again.
                for instr in &ir.instrs {
                    if instr.opcode == Opcode::Discard {
                        if let Some(base) = instr.written_base() {
                            self.registry.clear_discard(base);
                        }
                    }
                }
                Err(RuntimeError::Backend(err))
            }
        }
    }

    /// Retires `Discard`/`Free` side effects of a successfully executed
    /// batch. Extension payloads die with the IR in the same pass.
    fn reap(&mut self, ir: &Ir) {
        for instr in &ir.instrs {
            match instr.opcode {
                Opcode::Discard => {
                    if let Some(base) = instr.written_base() {
                        if self.registry.retire(base) {
                            self.stats.bases_destroyed += 1;
                        }
                    }
                }
                Opcode::Free => {
                    if let Some(base) = instr.written_base() {
                        self.registry.release_data(base);
                    }
                }
                _ => {}
            }
        }
    }
}

//! Null backend.
//!
//! Accepts every kernel, materializes output bases with sequential data
//! handles, and performs no numerical work. Useful as a test double and as
//! a template for real backends: `init`/`execute`/`register_extension`/
//! `shutdown` mirror the entry points a code-generating backend exposes.

use std::collections::HashMap;

use crate::array::base::BaseId;
use crate::backend::{Backend, ExtensionId};
use crate::common::error::BackendError;
use crate::config::Config;
use crate::ir::instruction::Instruction;
use crate::ir::kernel::Kernel;

/// Backend that counts work and executes nothing.
#[derive(Debug, Default)]
pub struct NullBackend {
    initialized: bool,
    next_handle: u64,
    handles: HashMap<BaseId, u64>,
    extensions: Vec<String>,
    /// Kernels executed over the backend's lifetime.
    pub executed_kernels: u64,
    /// Instructions executed over the backend's lifetime.
    pub executed_instructions: u64,
}

impl NullBackend {
    /// Creates a fresh, uninitialized null backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `execute` has materialized a handle for `base`.
    pub fn materialized(&self, base: BaseId) -> bool {
        self.handles.contains_key(&base)
    }

    /// Names of every registered extension, in registration order.
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }
}

impl Backend for NullBackend {
    fn init(&mut self, _config: &Config) -> Result<(), BackendError> {
        self.initialized = true;
        Ok(())
    }

    fn execute(&mut self, kernels: &[Kernel]) -> Result<(), BackendError> {
        if !self.initialized {
            return Err(BackendError::new(1, "execute before init"));
        }
        for kernel in kernels {
            self.executed_kernels += 1;
            self.executed_instructions += kernel.instr_list().len() as u64;
            for output in kernel.output_list() {
                let handle = self.next_handle;
                self.next_handle += 1;
                let _ = self.handles.entry(output.base).or_insert(handle);
            }
            for temp in kernel.temp_list() {
                let _ = self.handles.remove(temp);
            }
        }
        Ok(())
    }

    fn register_extension(&mut self, name: &str) -> Result<ExtensionId, BackendError> {
        self.extensions.push(name.to_string());
        Ok(ExtensionId(self.extensions.len() as i64))
    }

    fn shutdown(&mut self) -> Result<(), BackendError> {
        self.initialized = false;
        Ok(())
    }

    fn check_fusible(&self, _a: &Instruction, _b: &Instruction) -> bool {
        true
    }
}

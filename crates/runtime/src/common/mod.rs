//! Common types and constants used throughout the runtime.
//!
//! This module provides fundamental building blocks shared across all components:
//! 1. **Element Types:** The closed set of array element types and their sizes.
//! 2. **Constants:** System-wide constants for ranks and the wire format.
//! 3. **Error Handling:** Contract, backend, init, and decode error types.

/// System-wide constants.
pub mod constants;

/// Error types for contract violations, backend failures, and decoding.
pub mod error;

/// Array element type definitions.
pub mod types;

pub use constants::MAX_RANK;
pub use error::{BackendError, ContractError, DecodeError, InitError, RuntimeError};
pub use types::ElemType;

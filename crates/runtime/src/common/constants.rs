//! Global runtime constants.
//!
//! This module defines system-wide constants used across the runtime. It includes:
//! 1. **Rank Limits:** The maximum number of axes a view may carry.
//! 2. **Wire Format:** Version and field tags of the IR serialization format.

/// Maximum rank (number of axes) of a view.
///
/// Views in instructions carry fixed-width shape and stride arrays of this
/// length on the wire; higher-rank operands are rejected at enqueue time.
pub const MAX_RANK: usize = 16;

/// Version tag written as the first byte of a serialized IR.
pub const IR_VERSION: u8 = 1;

/// Operand kind tag for a strided view operand.
pub const OPERAND_KIND_VIEW: i8 = 0;

/// Operand kind tag for an inline constant operand.
pub const OPERAND_KIND_CONSTANT: i8 = 1;

/// Size in bytes of the inline constant payload.
///
/// Wide enough for the largest element type (complex64).
pub const CONSTANT_BYTES: usize = 16;

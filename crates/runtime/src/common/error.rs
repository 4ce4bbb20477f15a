//! Error definitions for the runtime.
//!
//! This module defines the error surface of the runtime core. It provides:
//! 1. **Contract Errors:** Enqueue-time rejection of malformed instructions.
//! 2. **Backend Errors:** Opaque failures reported by the executing backend.
//! 3. **Init Errors:** Fatal failures during runtime construction.
//! 4. **Decode Errors:** Malformed serialized IR streams.
//!
//! The core recovers nothing by itself: a backend failure fails the whole
//! flushed batch, and `Discard`/`Free` side effects of a failed flush are
//! not performed.

use thiserror::Error;

use crate::array::BaseId;
use crate::ir::Opcode;

/// Contract violation detected while constructing or enqueueing an instruction.
///
/// The offending instruction is rejected and the queue state is unchanged.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ContractError {
    /// Operand count does not match the opcode's arity.
    #[error("opcode {opcode} expects {expected} operands, found {found}")]
    ArityMismatch {
        /// The offending opcode.
        opcode: Opcode,
        /// Arity required by the opcode.
        expected: usize,
        /// Operand count actually supplied.
        found: usize,
    },

    /// The write target (operand 0) was a constant.
    #[error("write target of {0} must be a view, not a constant")]
    ConstantWriteTarget(Opcode),

    /// A view carries more axes than [`crate::common::constants::MAX_RANK`].
    #[error("view rank {rank} exceeds the supported maximum rank")]
    RankOverflow {
        /// Rank of the offending view.
        rank: usize,
    },

    /// A view's shape and stride arrays disagree in length.
    #[error("view has {shape_len} shape axes but {stride_len} stride axes")]
    RaggedView {
        /// Number of shape entries.
        shape_len: usize,
        /// Number of stride entries.
        stride_len: usize,
    },

    /// A read operand's shape does not match the write target's shape.
    #[error("operand shape {found:?} does not match the write target shape {expected:?}")]
    ShapeMismatch {
        /// Shape of the write target.
        expected: Vec<i64>,
        /// Shape of the mismatched read operand.
        found: Vec<i64>,
    },

    /// A reduction axis lies outside the input view's rank.
    #[error("reduction axis {axis} is out of bounds for rank {rank}")]
    AxisOutOfBounds {
        /// The requested axis.
        axis: i64,
        /// Rank of the reduced input.
        rank: usize,
    },

    /// An operand references a base that is not in the registry.
    #[error("{0} is not registered")]
    UnknownBase(BaseId),

    /// A base was discarded twice before the first discard executed.
    #[error("{0} already has a pending discard")]
    DoubleDiscard(BaseId),

    /// A base was requested with zero elements.
    #[error("a base must hold at least one element")]
    EmptyBase,
}

/// Failure reported by the backend.
///
/// Carries the backend's numeric code and a human-readable message. Partial
/// kernel results of the failed batch are undefined.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("backend error {code}: {message}")]
pub struct BackendError {
    /// Backend-defined failure code.
    pub code: i32,
    /// Human-readable description.
    pub message: String,
}

impl BackendError {
    /// Creates a backend error from a code and message.
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Fatal error during runtime construction.
#[derive(Debug, Error)]
pub enum InitError {
    /// The backend failed to initialize.
    #[error("backend initialization failed")]
    Backend(#[source] BackendError),

    /// An extension could not be registered with the backend.
    #[error("registration of extension {name:?} failed")]
    Extension {
        /// Name of the extension that failed to register.
        name: String,
        /// Backend failure that caused the rejection.
        #[source]
        source: BackendError,
    },
}

/// Malformed serialized IR stream.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The stream carries an unsupported version tag.
    #[error("unsupported IR version {0}")]
    BadVersion(u8),

    /// The stream names an opcode the runtime does not know.
    #[error("unknown opcode {0} in serialized IR")]
    UnknownOpcode(i32),

    /// An operand slot carries an unknown kind tag.
    #[error("unknown operand kind {0}")]
    BadOperandKind(i8),

    /// A constant operand carries an unknown element type tag.
    #[error("unknown element type {0}")]
    BadElemType(i8),

    /// The stream ended in the middle of an instruction.
    #[error("serialized IR ended prematurely")]
    UnexpectedEof,

    /// Bytes remained after the final instruction.
    #[error("trailing bytes after the last instruction")]
    TrailingBytes,
}

/// Umbrella error returned by runtime operations.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The caller violated an enqueue-time contract.
    #[error(transparent)]
    Contract(#[from] ContractError),

    /// The backend rejected or failed an execution.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

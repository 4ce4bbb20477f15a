//! Opcode definitions.
//!
//! The opcode set covers elementwise unary and binary operations,
//! axis-parameterized reductions, and the system opcodes that carry no
//! computation (`Sync`, `Discard`, `Free`, `None`, plus the opaque
//! `UserFunc` extension call). The discriminant doubles as the on-wire
//! encoding.

use std::fmt;

/// Operation carried by one instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Opcode {
    /// No-op placeholder.
    None = 0,
    /// Materialize a base's data for host reads.
    Sync = 1,
    /// Retire a base after execution.
    Discard = 2,
    /// Release a base's data buffer, keeping the metadata.
    Free = 3,
    /// Opaque extension call.
    UserFunc = 4,

    /// Copy input to output.
    Identity = 16,
    /// Arithmetic negation.
    Negate = 17,
    /// Absolute value.
    Absolute = 18,
    /// Logical negation.
    LogicalNot = 19,
    /// Bitwise complement.
    BitwiseNot = 20,
    /// Sine.
    Sin = 21,
    /// Cosine.
    Cos = 22,
    /// Tangent.
    Tan = 23,
    /// Hyperbolic sine.
    Sinh = 24,
    /// Hyperbolic cosine.
    Cosh = 25,
    /// Hyperbolic tangent.
    Tanh = 26,
    /// Natural exponential.
    Exp = 27,
    /// Natural logarithm.
    Log = 28,
    /// Base-2 logarithm.
    Log2 = 29,
    /// Base-10 logarithm.
    Log10 = 30,
    /// Square root.
    Sqrt = 31,
    /// Element type conversion.
    Cast = 32,

    /// Addition.
    Add = 64,
    /// Subtraction.
    Subtract = 65,
    /// Multiplication.
    Multiply = 66,
    /// Division.
    Divide = 67,
    /// Modulo.
    Mod = 68,
    /// Exponentiation.
    Power = 69,
    /// Equality comparison.
    Equal = 70,
    /// Inequality comparison.
    NotEqual = 71,
    /// Less-than comparison.
    Less = 72,
    /// Less-or-equal comparison.
    LessEqual = 73,
    /// Greater-than comparison.
    Greater = 74,
    /// Greater-or-equal comparison.
    GreaterEqual = 75,
    /// Logical conjunction.
    LogicalAnd = 76,
    /// Logical disjunction.
    LogicalOr = 77,
    /// Logical exclusive or.
    LogicalXor = 78,
    /// Bitwise conjunction.
    BitwiseAnd = 79,
    /// Bitwise disjunction.
    BitwiseOr = 80,
    /// Bitwise exclusive or.
    BitwiseXor = 81,
    /// Left shift.
    LeftShift = 82,
    /// Right shift.
    RightShift = 83,

    /// Sum over one axis.
    SumReduce = 128,
    /// Product over one axis.
    ProductReduce = 129,
    /// Minimum over one axis.
    MinReduce = 130,
    /// Maximum over one axis.
    MaxReduce = 131,
    /// Logical any over one axis.
    AnyReduce = 132,
    /// Logical all over one axis.
    AllReduce = 133,
}

impl Opcode {
    /// Every opcode, in wire-encoding order.
    pub const ALL: [Self; 48] = [
        Self::None,
        Self::Sync,
        Self::Discard,
        Self::Free,
        Self::UserFunc,
        Self::Identity,
        Self::Negate,
        Self::Absolute,
        Self::LogicalNot,
        Self::BitwiseNot,
        Self::Sin,
        Self::Cos,
        Self::Tan,
        Self::Sinh,
        Self::Cosh,
        Self::Tanh,
        Self::Exp,
        Self::Log,
        Self::Log2,
        Self::Log10,
        Self::Sqrt,
        Self::Cast,
        Self::Add,
        Self::Subtract,
        Self::Multiply,
        Self::Divide,
        Self::Mod,
        Self::Power,
        Self::Equal,
        Self::NotEqual,
        Self::Less,
        Self::LessEqual,
        Self::Greater,
        Self::GreaterEqual,
        Self::LogicalAnd,
        Self::LogicalOr,
        Self::LogicalXor,
        Self::BitwiseAnd,
        Self::BitwiseOr,
        Self::BitwiseXor,
        Self::LeftShift,
        Self::RightShift,
        Self::SumReduce,
        Self::ProductReduce,
        Self::MinReduce,
        Self::MaxReduce,
        Self::AnyReduce,
        Self::AllReduce,
    ];

    /// The wire encoding of this opcode.
    pub const fn to_wire(self) -> i32 {
        self as i32
    }

    /// Decodes a wire tag back into an opcode.
    pub fn from_wire(raw: i32) -> Option<Self> {
        Self::ALL.iter().copied().find(|o| *o as i32 == raw)
    }

    /// Whether this opcode carries no computation.
    ///
    /// System opcodes are always gently fusible with any kernel.
    pub const fn is_system(self) -> bool {
        matches!(self, Self::None | Self::Sync | Self::Discard | Self::Free)
    }

    /// Whether this opcode reduces one axis of its input.
    pub const fn is_reduction(self) -> bool {
        matches!(
            self,
            Self::SumReduce
                | Self::ProductReduce
                | Self::MinReduce
                | Self::MaxReduce
                | Self::AnyReduce
                | Self::AllReduce
        )
    }

    /// Whether this opcode maps elements independently.
    pub const fn is_elementwise(self) -> bool {
        !self.is_system() && !self.is_reduction() && !matches!(self, Self::UserFunc)
    }

    /// Number of operand slots the opcode uses.
    ///
    /// Reductions take an output view, an input view, and a constant axis.
    /// `UserFunc` carries its operands in the opaque extension payload.
    pub const fn arity(self) -> usize {
        match self {
            Self::None | Self::UserFunc => 0,
            Self::Sync | Self::Discard | Self::Free => 1,
            Self::Identity
            | Self::Negate
            | Self::Absolute
            | Self::LogicalNot
            | Self::BitwiseNot
            | Self::Sin
            | Self::Cos
            | Self::Tan
            | Self::Sinh
            | Self::Cosh
            | Self::Tanh
            | Self::Exp
            | Self::Log
            | Self::Log2
            | Self::Log10
            | Self::Sqrt
            | Self::Cast => 2,
            _ => 3,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

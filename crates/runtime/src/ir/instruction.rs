//! Instruction and operand definitions.
//!
//! An instruction is an opcode with a fixed-arity operand array of views or
//! inline constants, plus an optional opaque extension payload. Operand 0 is
//! always the write target; operands 1.. are reads. Instructions are value
//! types: they live in the queue, then in the IR, and are consumed when
//! their kernel executes.

use crate::array::base::{BaseId, BaseRegistry};
use crate::array::view::View;
use crate::backend::ExtensionId;
use crate::common::constants::{CONSTANT_BYTES, MAX_RANK};
use crate::common::error::ContractError;
use crate::common::types::ElemType;
use crate::ir::opcode::Opcode;

/// Inline scalar operand.
///
/// The payload is a little-endian byte image wide enough for the largest
/// element type; unused high bytes stay zero so encoding is canonical.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Constant {
    /// Element type of the scalar.
    pub elem_type: ElemType,
    bits: [u8; CONSTANT_BYTES],
}

impl Constant {
    /// Creates a constant from a raw little-endian byte image.
    pub fn from_bits(elem_type: ElemType, bits: [u8; CONSTANT_BYTES]) -> Self {
        Self { elem_type, bits }
    }

    /// Creates an `f32` constant.
    pub fn from_f32(value: f32) -> Self {
        let mut bits = [0u8; CONSTANT_BYTES];
        bits[..4].copy_from_slice(&value.to_le_bytes());
        Self {
            elem_type: ElemType::Float32,
            bits,
        }
    }

    /// Creates an `f64` constant.
    pub fn from_f64(value: f64) -> Self {
        let mut bits = [0u8; CONSTANT_BYTES];
        bits[..8].copy_from_slice(&value.to_le_bytes());
        Self {
            elem_type: ElemType::Float64,
            bits,
        }
    }

    /// Creates an `i64` constant.
    pub fn from_i64(value: i64) -> Self {
        let mut bits = [0u8; CONSTANT_BYTES];
        bits[..8].copy_from_slice(&value.to_le_bytes());
        Self {
            elem_type: ElemType::Int64,
            bits,
        }
    }

    /// Creates a boolean constant.
    pub fn from_bool(value: bool) -> Self {
        let mut bits = [0u8; CONSTANT_BYTES];
        bits[0] = u8::from(value);
        Self {
            elem_type: ElemType::Bool,
            bits,
        }
    }

    /// Reduction axis helper; identical to [`Constant::from_i64`].
    pub fn axis(axis: i64) -> Self {
        Self::from_i64(axis)
    }

    /// Reads the payload as a little-endian `i64`.
    pub fn as_i64(&self) -> i64 {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&self.bits[..8]);
        i64::from_le_bytes(raw)
    }

    /// Reads the payload as a little-endian `f64`.
    pub fn as_f64(&self) -> f64 {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&self.bits[..8]);
        f64::from_le_bytes(raw)
    }

    /// Raw little-endian byte image of the scalar.
    pub fn bits(&self) -> &[u8; CONSTANT_BYTES] {
        &self.bits
    }
}

/// One operand slot of an instruction.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Operand {
    /// A strided window into a base.
    View(View),
    /// An inline scalar.
    Constant(Constant),
}

impl Operand {
    /// The view inside this operand, if it is one.
    pub fn as_view(&self) -> Option<&View> {
        match self {
            Self::View(v) => Some(v),
            Self::Constant(_) => None,
        }
    }

    /// Mutable access to the view inside this operand, if it is one.
    pub fn as_view_mut(&mut self) -> Option<&mut View> {
        match self {
            Self::View(v) => Some(v),
            Self::Constant(_) => None,
        }
    }

    /// Whether this operand is an inline constant.
    pub fn is_constant(&self) -> bool {
        matches!(self, Self::Constant(_))
    }
}

/// Opaque extension call attached to a `UserFunc` instruction.
///
/// The payload is owned by the IR until the containing kernel executes and
/// is dropped with it, on both the success and failure paths of a flush.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionCall {
    /// Extension id issued by the backend at registration.
    pub id: ExtensionId,
    /// Backend-interpreted payload bytes.
    pub payload: Vec<u8>,
}

/// One recorded array operation.
#[derive(Clone, Debug, PartialEq)]
pub struct Instruction {
    /// Operation to perform.
    pub opcode: Opcode,
    /// Operand slots; length equals `opcode.arity()` in a valid instruction.
    pub operands: Vec<Operand>,
    /// Extension payload; present only on `UserFunc`.
    pub ext: Option<ExtensionCall>,
}

impl Instruction {
    /// Creates an instruction from an opcode and operand list.
    pub fn new(opcode: Opcode, operands: Vec<Operand>) -> Self {
        Self {
            opcode,
            operands,
            ext: None,
        }
    }

    /// Creates a `UserFunc` instruction carrying an extension call.
    pub fn user_func(call: ExtensionCall) -> Self {
        Self {
            opcode: Opcode::UserFunc,
            operands: Vec::new(),
            ext: Some(call),
        }
    }

    /// The write target view (operand 0), when present.
    pub fn write_view(&self) -> Option<&View> {
        self.operands.first().and_then(Operand::as_view)
    }

    /// The base written by this instruction, when it has a write target.
    pub fn written_base(&self) -> Option<BaseId> {
        self.write_view().map(|v| v.base)
    }

    /// Bases of every view operand, write target included.
    pub fn accessed_bases(&self) -> impl Iterator<Item = BaseId> + '_ {
        self.operands
            .iter()
            .filter_map(Operand::as_view)
            .map(|v| v.base)
    }

    /// Read operand views (operands 1..).
    pub fn read_views(&self) -> impl Iterator<Item = &View> {
        self.operands
            .iter()
            .skip(1)
            .filter_map(Operand::as_view)
    }

    /// Raw data-dependency test on base identity.
    ///
    /// True when either instruction writes a base the other reads or
    /// writes (RAW, WAW, or WAR), ignoring stride compatibility.
    pub fn conflicts(&self, other: &Self) -> bool {
        let this_hits = |id: BaseId| self.accessed_bases().any(|b| b == id);
        let other_hits = |id: BaseId| other.accessed_bases().any(|b| b == id);
        self.written_base().is_some_and(other_hits)
            || other.written_base().is_some_and(this_hits)
    }

    /// Extent of the loop sweep this instruction drives.
    ///
    /// Elementwise instructions sweep the write target; reductions sweep
    /// their input. System instructions drive no loop.
    pub fn sweep_extent(&self) -> u64 {
        if self.opcode.is_system() || self.opcode == Opcode::UserFunc {
            return 0;
        }
        if self.opcode.is_reduction() {
            return self
                .operands
                .get(1)
                .and_then(Operand::as_view)
                .map_or(0, View::nelements);
        }
        self.write_view().map_or(0, View::nelements)
    }

    /// Validates the instruction against the contract rules.
    ///
    /// Checks arity, operand well-formedness, base liveness, elementwise
    /// shape agreement, and reduction axis bounds. The caller rejects the
    /// instruction on error and leaves all queue state untouched.
    pub fn validate(&self, registry: &BaseRegistry) -> Result<(), ContractError> {
        let expected = self.opcode.arity();
        if self.operands.len() != expected {
            return Err(ContractError::ArityMismatch {
                opcode: self.opcode,
                expected,
                found: self.operands.len(),
            });
        }

        for operand in &self.operands {
            if let Some(view) = operand.as_view() {
                if view.shape.len() != view.stride.len() {
                    return Err(ContractError::RaggedView {
                        shape_len: view.shape.len(),
                        stride_len: view.stride.len(),
                    });
                }
                if view.rank() > MAX_RANK {
                    return Err(ContractError::RankOverflow { rank: view.rank() });
                }
                if !registry.contains(view.base) {
                    return Err(ContractError::UnknownBase(view.base));
                }
            }
        }

        if expected == 0 {
            return Ok(());
        }
        let Some(target) = self.write_view() else {
            return Err(ContractError::ConstantWriteTarget(self.opcode));
        };

        if self.opcode.is_reduction() {
            return self.validate_reduction(target);
        }
        if self.opcode.is_elementwise() {
            for view in self.read_views() {
                if view.shape != target.shape {
                    return Err(ContractError::ShapeMismatch {
                        expected: target.shape.clone(),
                        found: view.shape.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Reduction-specific checks: input view, constant axis in bounds, and
    /// output shape equal to the input shape with the swept axis removed.
    fn validate_reduction(&self, target: &View) -> Result<(), ContractError> {
        let Some(input) = self.operands.get(1).and_then(Operand::as_view) else {
            return Err(ContractError::ShapeMismatch {
                expected: target.shape.clone(),
                found: Vec::new(),
            });
        };
        let axis = match self.operands.get(2) {
            Some(Operand::Constant(c)) => c.as_i64(),
            _ => -1,
        };
        if axis < 0 || axis as usize >= input.rank() {
            return Err(ContractError::AxisOutOfBounds {
                axis,
                rank: input.rank(),
            });
        }
        let mut expected = input.shape.clone();
        let _ = expected.remove(axis as usize);
        if expected.is_empty() {
            expected.push(1);
        }
        if target.shape != expected {
            return Err(ContractError::ShapeMismatch {
                expected,
                found: target.shape.clone(),
            });
        }
        Ok(())
    }
}

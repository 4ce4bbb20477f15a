//! Wire codec for the IR.
//!
//! Layout (all integers little-endian): a 1-byte version tag, a `u64`
//! instruction count, then each instruction as `opcode:i32` followed by
//! exactly `arity(opcode)` operand slots and an `i64` extension id (0 when
//! absent). A view slot is `kind:i8, base_id:i64, start:i64, rank:i8,
//! shape[MAX_RANK]:i64, stride[MAX_RANK]:i64` with unused axes zero; a
//! constant slot is `kind:i8, elem_type:i8, value:bytes[16]`.
//!
//! Decoding followed by re-encoding yields a byte-identical buffer.
//! Extension payload bytes travel out-of-band; only the id is encoded.

use crate::array::base::BaseId;
use crate::array::view::View;
use crate::backend::ExtensionId;
use crate::common::constants::{
    CONSTANT_BYTES, IR_VERSION, MAX_RANK, OPERAND_KIND_CONSTANT, OPERAND_KIND_VIEW,
};
use crate::common::error::DecodeError;
use crate::common::types::ElemType;
use crate::ir::instruction::{Constant, ExtensionCall, Instruction, Operand};
use crate::ir::opcode::Opcode;

/// Serializes an instruction list into a fresh byte buffer.
pub fn encode(instrs: &[Instruction]) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.push(IR_VERSION);
    buf.extend_from_slice(&(instrs.len() as u64).to_le_bytes());
    for instr in instrs {
        encode_instruction(&mut buf, instr);
    }
    buf
}

fn encode_instruction(buf: &mut Vec<u8>, instr: &Instruction) {
    buf.extend_from_slice(&instr.opcode.to_wire().to_le_bytes());
    for operand in &instr.operands {
        match operand {
            Operand::View(view) => encode_view(buf, view),
            Operand::Constant(constant) => {
                buf.push(OPERAND_KIND_CONSTANT as u8);
                buf.push(constant.elem_type.to_wire() as u8);
                buf.extend_from_slice(constant.bits());
            }
        }
    }
    let ext_id = instr.ext.as_ref().map_or(0, |e| e.id.0);
    buf.extend_from_slice(&ext_id.to_le_bytes());
}

fn encode_view(buf: &mut Vec<u8>, view: &View) {
    buf.push(OPERAND_KIND_VIEW as u8);
    buf.extend_from_slice(&(view.base.0 as i64).to_le_bytes());
    buf.extend_from_slice(&view.start.to_le_bytes());
    buf.push(view.rank() as u8);
    for axis in 0..MAX_RANK {
        let extent = view.shape.get(axis).copied().unwrap_or(0);
        buf.extend_from_slice(&extent.to_le_bytes());
    }
    for axis in 0..MAX_RANK {
        let step = view.stride.get(axis).copied().unwrap_or(0);
        buf.extend_from_slice(&step.to_le_bytes());
    }
}

/// Deserializes an instruction list from a byte buffer.
///
/// Rejects unknown versions, opcodes, operand kinds, and element types,
/// short buffers, and trailing bytes.
pub fn decode(bytes: &[u8]) -> Result<Vec<Instruction>, DecodeError> {
    let mut cursor = Cursor::new(bytes);
    let version = cursor.read_u8()?;
    if version != IR_VERSION {
        return Err(DecodeError::BadVersion(version));
    }
    let count = cursor.read_u64()?;
    let mut instrs = Vec::with_capacity(count.min(1 << 20) as usize);
    for _ in 0..count {
        instrs.push(decode_instruction(&mut cursor)?);
    }
    if !cursor.at_end() {
        return Err(DecodeError::TrailingBytes);
    }
    Ok(instrs)
}

fn decode_instruction(cursor: &mut Cursor<'_>) -> Result<Instruction, DecodeError> {
    let raw_opcode = cursor.read_i32()?;
    let opcode = Opcode::from_wire(raw_opcode).ok_or(DecodeError::UnknownOpcode(raw_opcode))?;
    let mut operands = Vec::with_capacity(opcode.arity());
    for _ in 0..opcode.arity() {
        operands.push(decode_operand(cursor)?);
    }
    let ext_id = cursor.read_i64()?;
    let mut instr = Instruction::new(opcode, operands);
    if ext_id != 0 {
        instr.ext = Some(ExtensionCall {
            id: ExtensionId(ext_id),
            payload: Vec::new(),
        });
    }
    Ok(instr)
}

fn decode_operand(cursor: &mut Cursor<'_>) -> Result<Operand, DecodeError> {
    let kind = cursor.read_u8()? as i8;
    if kind == OPERAND_KIND_VIEW {
        let base = cursor.read_i64()?;
        let start = cursor.read_i64()?;
        let rank = cursor.read_u8()? as usize;
        let mut shape = vec![0i64; MAX_RANK];
        for extent in &mut shape {
            *extent = cursor.read_i64()?;
        }
        let mut stride = vec![0i64; MAX_RANK];
        for step in &mut stride {
            *step = cursor.read_i64()?;
        }
        shape.truncate(rank.min(MAX_RANK));
        stride.truncate(rank.min(MAX_RANK));
        Ok(Operand::View(View::new(
            BaseId(base as u64),
            start,
            shape,
            stride,
        )))
    } else if kind == OPERAND_KIND_CONSTANT {
        let raw_type = cursor.read_u8()? as i8;
        let elem_type = ElemType::from_wire(raw_type).ok_or(DecodeError::BadElemType(raw_type))?;
        let mut bits = [0u8; CONSTANT_BYTES];
        bits.copy_from_slice(cursor.read_bytes(CONSTANT_BYTES)?);
        Ok(Operand::Constant(Constant::from_bits(elem_type, bits)))
    } else {
        Err(DecodeError::BadOperandKind(kind))
    }
}

/// Byte cursor over a serialized IR.
struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn at_end(&self) -> bool {
        self.pos == self.bytes.len()
    }

    fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        let end = self.pos.checked_add(len).ok_or(DecodeError::UnexpectedEof)?;
        if end > self.bytes.len() {
            return Err(DecodeError::UnexpectedEof);
        }
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.read_bytes(1)?[0])
    }

    fn read_i32(&mut self) -> Result<i32, DecodeError> {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(self.read_bytes(4)?);
        Ok(i32::from_le_bytes(raw))
    }

    fn read_i64(&mut self) -> Result<i64, DecodeError> {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(self.read_bytes(8)?);
        Ok(i64::from_le_bytes(raw))
    }

    fn read_u64(&mut self) -> Result<u64, DecodeError> {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(self.read_bytes(8)?);
        Ok(u64::from_le_bytes(raw))
    }
}

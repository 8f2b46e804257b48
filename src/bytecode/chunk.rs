use super::OpCode;
use crate::{fault::RuntimeFault, value::Value};

/// Compiled bytecode plus its constant pool. `lines` runs parallel to
/// `code`, holding the program line number each byte came from, so a
/// traceback can name the line that was executing.
#[derive(Debug, Clone)]
pub struct Chunk {
    filename: String,
    code: Vec<u8>,
    lines: Vec<usize>,
    constants: Vec<Value>,
}

impl Chunk {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            code: Vec::new(),
            lines: Vec::new(),
            constants: Vec::new(),
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    pub fn write(&mut self, byte: u8, line_no: usize) {
        self.code.push(byte);
        self.lines.push(line_no);
    }

    pub fn write_op(&mut self, op: OpCode, line_no: usize) {
        self.write(op.into(), line_no);
    }

    /// Replace an already-written byte, for jump backpatching.
    pub fn patch(&mut self, addr: usize, byte: u8) {
        self.code[addr] = byte;
    }

    pub fn add_constant(&mut self, value: Value) -> Result<u8, RuntimeFault> {
        if self.constants.len() > u8::MAX as usize {
            return Err(RuntimeFault::new("Too many constants in one chunk"));
        }
        self.constants.push(value);
        Ok((self.constants.len() - 1) as u8)
    }

    pub fn constant(&self, index: u8) -> Result<&Value, RuntimeFault> {
        self.constants
            .get(index as usize)
            .ok_or_else(|| RuntimeFault::new(format!("No constant at index {}", index)))
    }

    pub fn byte_at(&self, addr: usize) -> Result<u8, RuntimeFault> {
        self.code
            .get(addr)
            .copied()
            .ok_or_else(|| RuntimeFault::new(format!("Read past the end of the chunk at {}", addr)))
    }

    /// The program line number the byte at `addr` was compiled from.
    pub fn line_at(&self, addr: usize) -> usize {
        self.lines.get(addr).copied().unwrap_or(0)
    }
}

/// Jump operands are two bytes, big-endian.
pub fn addr_to_bytes(addr: usize) -> Result<[u8; 2], RuntimeFault> {
    if addr > u16::MAX as usize {
        return Err(RuntimeFault::new("Jump distance too large"));
    }
    Ok((addr as u16).to_be_bytes())
}

pub fn bytes_to_addr(high: u8, low: u8) -> usize {
    u16::from_be_bytes([high, low]) as usize
}

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// One byte of instruction. Constant, the globals group, and the jumps take
/// operands; everything else works the stack alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum OpCode {
    Constant,
    Nil,
    True,
    False,
    Pop,
    Eq,
    Gt,
    Ge,
    Lt,
    Le,
    Ne,
    Not,
    Add,
    Sub,
    Mul,
    Div,
    Neg,
    GetGlobal,
    DefineGlobal,
    SetGlobal,
    Print,
    Exit,
    Jump,
    JumpIfFalse,
    Loop,
    Return,
}

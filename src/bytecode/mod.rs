mod chunk;
mod opcode;

pub use chunk::{addr_to_bytes, bytes_to_addr, Chunk};
pub use opcode::OpCode;

pub mod ast;
mod bytecode;
mod compiler;
mod exception;
mod exit_code;
mod fault;
mod host;
mod operations;
mod parser;
mod runtime;
mod scanner;
mod source;
mod traceback;
pub mod value;

pub use bytecode::{Chunk, OpCode};
pub use compiler::{compile_command, compile_program, CompileError, CompiledCmd};
pub use exception::{Exception, ExceptionKind, ParseError, ParseWarning, SyntaxDiagnostic};
pub use exit_code::{ErrorCode, ExitCode};
pub use fault::{Interrupt, RuntimeFault, UsageFault};
pub use host::{CapturedHost, ConsoleHost, Host};
pub use operations::{add, div, eq, ge, gt, le, lt, mul, ne, neg, not, sub};
pub use parser::Parser;
pub use runtime::Runtime;
pub use scanner::{Scanner, Token, TokenKind};
pub use source::{SourceOffset, SourceSpan};
pub use traceback::Traceback;
pub use value::{Type, Value};

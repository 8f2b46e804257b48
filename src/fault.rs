use miette::Diagnostic;
use thiserror::Error;

use crate::{exception::Exception, exit_code::ExitCode};

/// A fatal internal error. Unlike exceptions, faults are not values and
/// cannot be caught by the running program; they indicate a bug in the
/// interpreter or an unbridgeable gap in it.
#[derive(Error, Diagnostic, Debug, Clone)]
#[error("fatal: {message}")]
pub struct RuntimeFault {
    pub message: String,
}

impl RuntimeFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// A fault for functionality the interpreter knows about but does not
    /// have yet.
    pub fn not_implemented(what: &str) -> Self {
        Self::new(format!("Not implemented: {}", what))
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::Software
    }
}

/// The command line was used incorrectly.
#[derive(Error, Diagnostic, Debug, Clone)]
#[error("{message}")]
pub struct UsageFault {
    pub message: String,
}

impl UsageFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::Usage
    }
}

/// Any reason bytecode execution stops before falling off the end of the
/// chunk.
#[derive(Debug, Clone)]
pub enum Interrupt {
    /// The program asked to exit with this status.
    Exit(i32),
    Exception(Exception),
    Fault(RuntimeFault),
}

impl Interrupt {
    pub fn exit_code(&self) -> i32 {
        match self {
            Interrupt::Exit(code) => *code,
            Interrupt::Exception(exception) => exception.exit_code().into(),
            Interrupt::Fault(fault) => fault.exit_code().into(),
        }
    }
}

impl From<Exception> for Interrupt {
    fn from(exception: Exception) -> Self {
        Interrupt::Exception(exception)
    }
}
impl From<RuntimeFault> for Interrupt {
    fn from(fault: RuntimeFault) -> Self {
        Interrupt::Fault(fault)
    }
}

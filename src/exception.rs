use miette::Diagnostic;
use thiserror::Error;

use crate::{
    exit_code::{ErrorCode, ExitCode},
    source::SourceSpan,
    traceback::Traceback,
    value::{type_of, Type, Value},
};

/// A recoverable runtime error. Exceptions are values: they can be stored in
/// variables and inspected, and only crash the interpreter when they
/// propagate all the way out.
#[derive(Error, Diagnostic, Debug, Clone)]
#[error("{message}")]
pub struct Exception {
    pub kind: ExceptionKind,
    pub message: String,
    pub traceback: Option<Traceback>,
}

#[derive(Debug, Clone)]
pub enum ExceptionKind {
    Assertion,
    Runtime,
    Name,
    NotImplemented,
    Type {
        value: Value,
        from_type: Type,
        to_type: Type,
    },
    ZeroDivision {
        a: Value,
        type_a: Type,
        b: Value,
        type_b: Type,
    },
    Os {
        code: ErrorCode,
        exit_code: ExitCode,
    },
}

impl Exception {
    fn new(kind: ExceptionKind, message: String) -> Self {
        Self {
            kind,
            message,
            traceback: None,
        }
    }

    pub fn assertion(message: impl Into<String>) -> Self {
        Self::new(ExceptionKind::Assertion, message.into())
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(ExceptionKind::Runtime, message.into())
    }

    pub fn name(variable: &str) -> Self {
        Self::new(
            ExceptionKind::Name,
            format!("Cannot assign to undefined variable {}", variable),
        )
    }

    pub fn undefined_name(variable: &str) -> Self {
        Self::new(
            ExceptionKind::Name,
            format!("Undefined variable {}", variable),
        )
    }

    pub fn not_implemented(what: &str) -> Self {
        Self::new(
            ExceptionKind::NotImplemented,
            format!("Not implemented: {}", what),
        )
    }

    pub fn type_error(message: String, value: Value, to_type: Type) -> Self {
        let from_type = type_of(&value);
        Self::new(
            ExceptionKind::Type {
                value,
                from_type,
                to_type,
            },
            message,
        )
    }

    /// Raised before the division happens, so both operands arrive with
    /// their original values and types.
    pub fn zero_division(a: Value, b: Value) -> Self {
        let type_a = type_of(&a);
        let type_b = type_of(&b);
        let message = format!("Cannot divide {} by {}", a, b);
        Self::new(
            ExceptionKind::ZeroDivision {
                a,
                type_a,
                b,
                type_b,
            },
            message,
        )
    }

    /// A failed read of a user-supplied file. EACCES on a read exits
    /// NoInput, like a missing file would.
    pub fn os_read(error: &std::io::Error, path: &str) -> Self {
        let code = ErrorCode::from_io_error(error);
        Self::new(
            ExceptionKind::Os {
                code,
                exit_code: code.into(),
            },
            format!("{}: {}: {}", code, error, path),
        )
    }

    /// A failed write of a user-supplied file. EACCES on a write exits
    /// CantCreate rather than NoInput.
    pub fn os_write(error: &std::io::Error, path: &str) -> Self {
        let code = ErrorCode::from_io_error(error);
        let exit_code = match code {
            ErrorCode::Access => ExitCode::CantCreate,
            code => code.into(),
        };
        Self::new(
            ExceptionKind::Os { code, exit_code },
            format!("{}: {}: {}", code, error, path),
        )
    }

    pub fn with_traceback(mut self, traceback: Traceback) -> Self {
        self.traceback = Some(traceback);
        self
    }

    pub fn exit_code(&self) -> ExitCode {
        match &self.kind {
            ExceptionKind::Os { exit_code, .. } => *exit_code,
            _ => ExitCode::Software,
        }
    }
}

/// A single syntax problem, pinned to one row of input. The source field
/// holds just that row, so the caret renders against the line the user
/// typed.
#[derive(Error, Diagnostic, Debug, Clone)]
#[error("{message}")]
pub struct SyntaxError {
    pub message: String,
    pub filename: String,
    pub row: usize,
    pub line_no: Option<i64>,
    #[source_code]
    pub src: String,
    #[label("here")]
    pub span: SourceSpan,
}

#[derive(Error, Diagnostic, Debug, Clone)]
#[error("{message}")]
#[diagnostic(severity(Warning))]
pub struct SyntaxWarning {
    pub message: String,
    pub filename: String,
    pub row: usize,
    pub line_no: Option<i64>,
    #[source_code]
    pub src: String,
    #[label("here")]
    pub span: SourceSpan,
}

#[derive(Error, Diagnostic, Debug, Clone)]
pub enum SyntaxDiagnostic {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Error(SyntaxError),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Warning(SyntaxWarning),
}

impl SyntaxDiagnostic {
    pub fn is_error(&self) -> bool {
        matches!(self, SyntaxDiagnostic::Error(_))
    }
    pub fn message(&self) -> &str {
        match self {
            SyntaxDiagnostic::Error(error) => &error.message,
            SyntaxDiagnostic::Warning(warning) => &warning.message,
        }
    }
    pub fn row(&self) -> usize {
        match self {
            SyntaxDiagnostic::Error(error) => error.row,
            SyntaxDiagnostic::Warning(warning) => warning.row,
        }
    }
    pub fn offset_start(&self) -> SourceSpan {
        match self {
            SyntaxDiagnostic::Error(error) => error.span,
            SyntaxDiagnostic::Warning(warning) => warning.span,
        }
    }
    pub fn set_source(&mut self, source: &str) {
        match self {
            SyntaxDiagnostic::Error(error) => error.src = source.to_string(),
            SyntaxDiagnostic::Warning(warning) => warning.src = source.to_string(),
        }
    }
}

/// Every error (and any warnings found along the way) from one parse or
/// compile, sorted by position in the input.
#[derive(Error, Diagnostic, Debug, Clone)]
#[error("Could not parse input")]
pub struct ParseError {
    #[related]
    pub diagnostics: Vec<SyntaxDiagnostic>,
}

/// The warnings from an otherwise successful parse or compile.
#[derive(Error, Diagnostic, Debug, Clone)]
#[error("Input parsed with warnings")]
#[diagnostic(severity(Warning))]
pub struct ParseWarning {
    #[related]
    pub diagnostics: Vec<SyntaxDiagnostic>,
}

/// Order diagnostics the way a reader scans the input: by row, then by
/// column within the row.
pub fn sort_diagnostics(diagnostics: &mut Vec<SyntaxDiagnostic>) {
    diagnostics.sort_by_key(|diagnostic| (diagnostic.row(), diagnostic.offset_start().start()));
}

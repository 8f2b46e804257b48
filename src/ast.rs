//! The parsed form of BASIC input: expressions, instructions, numbered
//! lines and interactive commands.

use crate::source::SourceSpan;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub span: SourceSpan,
    pub kind: ExprKind,
}

impl Expr {
    pub fn new(span: SourceSpan, kind: ExprKind) -> Self {
        Self { span, kind }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    Logical {
        left: Box<Expr>,
        op: LogicalOp,
        right: Box<Expr>,
    },
    Group {
        expr: Box<Expr>,
    },
    Variable {
        name: String,
    },
    IntLiteral(i64),
    RealLiteral(f64),
    BoolLiteral(bool),
    StringLiteral(String),
    /// A string used where a prompt is expected; decoded like a string
    /// literal except `\t` stays literal.
    PromptLiteral(String),
    NilLiteral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Instr {
    pub span: SourceSpan,
    pub kind: InstrKind,
}

impl Instr {
    pub fn new(span: SourceSpan, kind: InstrKind) -> Self {
        Self { span, kind }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InstrKind {
    Rem {
        remark: String,
    },
    Print {
        expression: Expr,
    },
    Expression {
        expression: Expr,
    },
    Let {
        variable: String,
        value: Option<Expr>,
    },
    Assign {
        variable: String,
        value: Expr,
    },
    /// `if ... then ...` with both branches inline on one row.
    ShortIf {
        condition: Expr,
        then_branch: Vec<Instr>,
        else_branch: Vec<Instr>,
    },
    /// The opener of a block `if` spanning multiple rows.
    If {
        condition: Expr,
    },
    ElseIf {
        condition: Expr,
    },
    Else,
    EndIf,
    End,
    Exit {
        expression: Option<Expr>,
    },
    New {
        filename: Option<Expr>,
    },
    Load {
        filename: Expr,
    },
    Save {
        filename: Option<Expr>,
    },
    List,
    Renum,
    Run,
}

impl InstrKind {
    /// Interactive instructions operate on the program editor and may not
    /// appear inside a script.
    pub fn interactive_name(&self) -> Option<&'static str> {
        match self {
            InstrKind::New { .. } => Some("new"),
            InstrKind::Load { .. } => Some("load"),
            InstrKind::Save { .. } => Some("save"),
            InstrKind::List => Some("list"),
            InstrKind::Renum => Some("renum"),
            InstrKind::Run => Some("run"),
            _ => None,
        }
    }
}

/// A numbered program line, together with the source text of its row.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub line_no: i64,
    pub row: usize,
    pub source: String,
    pub instructions: Vec<Instr>,
}

/// An unnumbered interactive command. Commands get a synthetic,
/// monotonically increasing number so diagnostics can refer to them.
#[derive(Debug, Clone, PartialEq)]
pub struct Cmd {
    pub cmd_no: usize,
    pub row: usize,
    pub source: String,
    pub instructions: Vec<Instr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Row {
    Line(Line),
    Cmd(Cmd),
}

/// One round of interactive input: a mix of numbered lines (program edits)
/// and commands to run now.
pub type Input = Vec<Row>;

/// A whole program, lines sorted ascending by line number.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub filename: String,
    pub lines: Vec<Line>,
}

/// The expression kind for a literal value carried on a token.
pub fn literal_kind(value: &Value) -> ExprKind {
    match value {
        Value::Integer(i) => ExprKind::IntLiteral(*i),
        Value::Real(r) => ExprKind::RealLiteral(*r),
        Value::Boolean(b) => ExprKind::BoolLiteral(*b),
        Value::String(s) => ExprKind::StringLiteral(s.to_string()),
        _ => ExprKind::NilLiteral,
    }
}

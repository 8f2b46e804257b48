//! Turns parsed instructions into bytecode. Block structure (`if` /
//! `elseif` / `else` / `endif`) is tracked on an explicit stack, so openers
//! and closers can pair up across program lines.

use miette::Diagnostic;
use thiserror::Error;

use crate::{
    ast::{
        BinaryOp, Cmd, Expr, ExprKind, Instr, InstrKind, Line, LogicalOp, Program, UnaryOp,
    },
    bytecode::{addr_to_bytes, Chunk, OpCode},
    exception::{ParseError, SyntaxDiagnostic, SyntaxError},
    fault::RuntimeFault,
    source::SourceSpan,
    value::Value,
};

#[derive(Error, Diagnostic, Debug)]
pub enum CompileError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Fault(#[from] RuntimeFault),
}

/// An interactive command either compiles to bytecode or names an editor
/// operation for the caller to carry out.
#[derive(Debug)]
pub enum CompiledCmd {
    Runtime { chunk: Chunk },
    Interactive { name: &'static str },
}

/// Compile a whole program into one chunk.
pub fn compile_program(program: &Program) -> Result<Chunk, CompileError> {
    let mut compiler = LineCompiler::new(&program.filename, BlockKind::Program);
    for line in &program.lines {
        compiler.line(line)?;
    }
    compiler.finish()
}

/// Compile one interactive command row. Each instruction becomes its own
/// `CompiledCmd`, so editor operations and runnable code can mix on a row
/// separated by colons. An expression instruction leaves its value on the
/// stack for the caller to show.
pub fn compile_command(cmd: &Cmd) -> Result<Vec<CompiledCmd>, CompileError> {
    cmd.instructions
        .iter()
        .map(|instr| compile_instruction(cmd, instr))
        .collect()
}

fn compile_instruction(cmd: &Cmd, instr: &Instr) -> Result<CompiledCmd, CompileError> {
    if let Some(name) = instr.kind.interactive_name() {
        return Ok(CompiledCmd::Interactive { name });
    }

    let mut compiler = LineCompiler::new("<input>", BlockKind::Command);
    compiler.begin_row(cmd.cmd_no, cmd.row, &cmd.source, None);

    if let InstrKind::Expression { expression } = &instr.kind {
        compiler.expression(expression)?;
        compiler.emit(OpCode::Return);
        return Ok(CompiledCmd::Runtime {
            chunk: compiler.chunk,
        });
    }

    compiler.instruction(instr)?;
    let chunk = compiler.finish()?;
    Ok(CompiledCmd::Runtime { chunk })
}

struct Block {
    kind: BlockKind,
    name: &'static str,
    row: usize,
    span: SourceSpan,
    source: String,
    line_no: Option<i64>,
}

enum BlockKind {
    Program,
    Command,
    If {
        else_jump: usize,
    },
    ElseIf {
        else_jump: usize,
        end_jumps: Vec<usize>,
    },
    Else {
        end_jumps: Vec<usize>,
    },
}

struct LineCompiler {
    chunk: Chunk,
    blocks: Vec<Block>,
    is_command: bool,
    line_no: usize,
    row: usize,
    source: String,
    syntax_line_no: Option<i64>,
    filename: String,
}

impl LineCompiler {
    fn new(filename: &str, root: BlockKind) -> Self {
        let is_command = matches!(root, BlockKind::Command);
        let name = if is_command { "command" } else { "program" };
        Self {
            chunk: Chunk::new(filename),
            blocks: vec![Block {
                kind: root,
                name,
                row: 1,
                span: 0.into(),
                source: String::new(),
                line_no: None,
            }],
            is_command,
            line_no: 0,
            row: 1,
            source: String::new(),
            syntax_line_no: None,
            filename: filename.to_string(),
        }
    }

    fn begin_row(&mut self, line_no: usize, row: usize, source: &str, syntax_line_no: Option<i64>) {
        self.line_no = line_no;
        self.row = row;
        self.source = source.to_string();
        self.syntax_line_no = syntax_line_no;
    }

    fn line(&mut self, line: &Line) -> Result<(), CompileError> {
        self.begin_row(
            line.line_no as usize,
            line.row,
            &line.source,
            Some(line.line_no),
        );
        for instr in &line.instructions {
            self.instruction(instr)?;
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Chunk, CompileError> {
        if let Some(block) = self.blocks.pop() {
            if !matches!(block.kind, BlockKind::Program | BlockKind::Command) {
                return Err(self.block_error(
                    format!("`{}` has not been closed", block.name),
                    &block,
                ));
            }
        }
        self.emit(OpCode::Nil);
        self.emit(OpCode::Return);
        Ok(self.chunk)
    }

    fn instruction(&mut self, instr: &Instr) -> Result<(), CompileError> {
        if let Some(name) = instr.kind.interactive_name() {
            return Err(self.error(
                format!("Cannot run interactive command in scripts: {}", name),
                instr.span,
            ));
        }
        match &instr.kind {
            InstrKind::Rem { .. } => Ok(()),
            InstrKind::Print { expression } => {
                self.expression(expression)?;
                self.emit(OpCode::Print);
                Ok(())
            }
            InstrKind::Expression { expression } => {
                self.expression(expression)?;
                self.emit(OpCode::Pop);
                Ok(())
            }
            InstrKind::Let { variable, value } => {
                let name = self.name_constant(variable)?;
                match value {
                    Some(expression) => self.expression(expression)?,
                    None => self.emit(OpCode::Nil),
                }
                self.emit(OpCode::DefineGlobal);
                self.emit_byte(name);
                Ok(())
            }
            InstrKind::Assign { variable, value } => {
                let name = self.name_constant(variable)?;
                self.expression(value)?;
                self.emit(OpCode::SetGlobal);
                self.emit_byte(name);
                Ok(())
            }
            InstrKind::ShortIf {
                condition,
                then_branch,
                else_branch,
            } => {
                self.expression(condition)?;
                let else_jump = self.emit_jump(OpCode::JumpIfFalse);
                self.emit(OpCode::Pop);
                for instr in then_branch {
                    self.instruction(instr)?;
                }
                let end_jump = self.emit_jump(OpCode::Jump);
                self.patch_jump(else_jump)?;
                self.emit(OpCode::Pop);
                for instr in else_branch {
                    self.instruction(instr)?;
                }
                self.patch_jump(end_jump)?;
                Ok(())
            }
            InstrKind::If { condition } => {
                if self.is_command {
                    return Err(self.error("Invalid command: if", instr.span));
                }
                self.expression(condition)?;
                let else_jump = self.emit_jump(OpCode::JumpIfFalse);
                self.emit(OpCode::Pop);
                self.push_block(BlockKind::If { else_jump }, "if", instr);
                Ok(())
            }
            InstrKind::ElseIf { condition } => {
                if self.is_command {
                    return Err(self.error("Invalid command: elseif", instr.span));
                }
                let block = self.close_branch("elseif", instr)?;
                let (else_jump, mut end_jumps) = match block.kind {
                    BlockKind::If { else_jump } => (else_jump, Vec::new()),
                    BlockKind::ElseIf {
                        else_jump,
                        end_jumps,
                    } => (else_jump, end_jumps),
                    _ => unreachable!("close_branch only returns if and elseif blocks"),
                };
                let end_jump = self.emit_jump(OpCode::Jump);
                self.patch_jump(else_jump)?;
                self.emit(OpCode::Pop);
                end_jumps.push(end_jump);
                self.expression(condition)?;
                let else_jump = self.emit_jump(OpCode::JumpIfFalse);
                self.emit(OpCode::Pop);
                self.push_block(
                    BlockKind::ElseIf {
                        else_jump,
                        end_jumps,
                    },
                    "elseif",
                    instr,
                );
                Ok(())
            }
            InstrKind::Else => {
                if self.is_command {
                    return Err(self.error("Invalid command: else", instr.span));
                }
                let block = self.close_branch("else", instr)?;
                let (else_jump, mut end_jumps) = match block.kind {
                    BlockKind::If { else_jump } => (else_jump, Vec::new()),
                    BlockKind::ElseIf {
                        else_jump,
                        end_jumps,
                    } => (else_jump, end_jumps),
                    _ => unreachable!("close_branch only returns if and elseif blocks"),
                };
                let end_jump = self.emit_jump(OpCode::Jump);
                self.patch_jump(else_jump)?;
                self.emit(OpCode::Pop);
                end_jumps.push(end_jump);
                self.push_block(BlockKind::Else { end_jumps }, "else", instr);
                Ok(())
            }
            InstrKind::EndIf => {
                if self.is_command {
                    return Err(self.error("Invalid command: endif", instr.span));
                }
                let block = self.pop_block("endif")?;
                match block.kind {
                    BlockKind::If { else_jump } => {
                        let end_jump = self.emit_jump(OpCode::Jump);
                        self.patch_jump(else_jump)?;
                        self.emit(OpCode::Pop);
                        self.patch_jump(end_jump)?;
                    }
                    BlockKind::ElseIf {
                        else_jump,
                        end_jumps,
                    } => {
                        let end_jump = self.emit_jump(OpCode::Jump);
                        self.patch_jump(else_jump)?;
                        self.emit(OpCode::Pop);
                        self.patch_jump(end_jump)?;
                        for jump in end_jumps {
                            self.patch_jump(jump)?;
                        }
                    }
                    BlockKind::Else { end_jumps } => {
                        for jump in end_jumps {
                            self.patch_jump(jump)?;
                        }
                    }
                    _ => unreachable!("pop_block rejects the root block"),
                }
                Ok(())
            }
            InstrKind::End => {
                self.emit(OpCode::Nil);
                self.emit(OpCode::Return);
                Ok(())
            }
            InstrKind::Exit { expression } => {
                match expression {
                    Some(expression) => self.expression(expression)?,
                    None => self.emit(OpCode::Nil),
                }
                self.emit(OpCode::Exit);
                Ok(())
            }
            InstrKind::New { .. }
            | InstrKind::Load { .. }
            | InstrKind::Save { .. }
            | InstrKind::List
            | InstrKind::Renum
            | InstrKind::Run => {
                unreachable!("interactive instructions are rejected above")
            }
        }
    }

    fn expression(&mut self, expr: &Expr) -> Result<(), CompileError> {
        match &expr.kind {
            ExprKind::IntLiteral(value) => self.constant(Value::Integer(*value)),
            ExprKind::RealLiteral(value) => self.constant(Value::Real(*value)),
            ExprKind::StringLiteral(value) | ExprKind::PromptLiteral(value) => {
                self.constant(Value::from(value.as_str()))
            }
            ExprKind::BoolLiteral(value) => {
                self.emit(if *value { OpCode::True } else { OpCode::False });
                Ok(())
            }
            ExprKind::NilLiteral => {
                self.emit(OpCode::Nil);
                Ok(())
            }
            ExprKind::Variable { name } => {
                let name = self.name_constant(name)?;
                self.emit(OpCode::GetGlobal);
                self.emit_byte(name);
                Ok(())
            }
            ExprKind::Group { expr } => self.expression(expr),
            ExprKind::Unary { op, expr } => {
                self.expression(expr)?;
                self.emit(match op {
                    UnaryOp::Neg => OpCode::Neg,
                    UnaryOp::Not => OpCode::Not,
                });
                Ok(())
            }
            ExprKind::Binary { left, op, right } => {
                self.expression(left)?;
                self.expression(right)?;
                self.emit(match op {
                    BinaryOp::Add => OpCode::Add,
                    BinaryOp::Sub => OpCode::Sub,
                    BinaryOp::Mul => OpCode::Mul,
                    BinaryOp::Div => OpCode::Div,
                    BinaryOp::Eq => OpCode::Eq,
                    BinaryOp::Ne => OpCode::Ne,
                    BinaryOp::Gt => OpCode::Gt,
                    BinaryOp::Ge => OpCode::Ge,
                    BinaryOp::Lt => OpCode::Lt,
                    BinaryOp::Le => OpCode::Le,
                });
                Ok(())
            }
            ExprKind::Logical { left, op, right } => match op {
                LogicalOp::And => {
                    self.expression(left)?;
                    let end_jump = self.emit_jump(OpCode::JumpIfFalse);
                    self.emit(OpCode::Pop);
                    self.expression(right)?;
                    self.patch_jump(end_jump)?;
                    Ok(())
                }
                LogicalOp::Or => {
                    self.expression(left)?;
                    let else_jump = self.emit_jump(OpCode::JumpIfFalse);
                    let end_jump = self.emit_jump(OpCode::Jump);
                    self.patch_jump(else_jump)?;
                    self.emit(OpCode::Pop);
                    self.expression(right)?;
                    self.patch_jump(end_jump)?;
                    Ok(())
                }
            },
        }
    }

    fn push_block(&mut self, kind: BlockKind, name: &'static str, instr: &Instr) {
        self.blocks.push(Block {
            kind,
            name,
            row: self.row,
            span: instr.span,
            source: self.source.clone(),
            line_no: self.syntax_line_no,
        });
    }

    /// Pop the innermost block for a closer. Closing the root is a mismatch
    /// and faults.
    fn pop_block(&mut self, closer: &str) -> Result<Block, CompileError> {
        let block = match self.blocks.pop() {
            Some(block) => block,
            None => return Err(RuntimeFault::new("Block stack underflow").into()),
        };
        if matches!(block.kind, BlockKind::Program | BlockKind::Command) {
            let name = block.name;
            self.blocks.push(block);
            return Err(
                RuntimeFault::new(format!("`{}` can not end `{}`", closer, name)).into(),
            );
        }
        Ok(block)
    }

    /// Like `pop_block`, but `elseif` and `else` may only continue an open
    /// branch, never an `else`.
    fn close_branch(&mut self, closer: &str, instr: &Instr) -> Result<Block, CompileError> {
        let block = self.pop_block(closer)?;
        if matches!(block.kind, BlockKind::Else { .. }) {
            return Err(self.error(
                format!("`{}` can not follow `else`", closer),
                instr.span,
            ));
        }
        Ok(block)
    }

    fn constant(&mut self, value: Value) -> Result<(), CompileError> {
        let index = self.chunk.add_constant(value)?;
        self.emit(OpCode::Constant);
        self.emit_byte(index);
        Ok(())
    }

    fn name_constant(&mut self, name: &str) -> Result<u8, CompileError> {
        Ok(self.chunk.add_constant(Value::from(name))?)
    }

    fn emit(&mut self, op: OpCode) {
        self.chunk.write_op(op, self.line_no);
    }

    fn emit_byte(&mut self, byte: u8) {
        self.chunk.write(byte, self.line_no);
    }

    /// Emit a jump with a placeholder operand, returning the operand's
    /// address for later patching.
    fn emit_jump(&mut self, op: OpCode) -> usize {
        self.emit(op);
        self.emit_byte(0xff);
        self.emit_byte(0xff);
        self.chunk.len() - 2
    }

    /// Point the jump operand at `addr` to the current end of the chunk.
    fn patch_jump(&mut self, addr: usize) -> Result<(), CompileError> {
        let distance = self.chunk.len() - addr - 2;
        let [high, low] = addr_to_bytes(distance)?;
        self.chunk.patch(addr, high);
        self.chunk.patch(addr + 1, low);
        Ok(())
    }

    fn error(&self, message: impl Into<String>, span: SourceSpan) -> CompileError {
        ParseError {
            diagnostics: vec![SyntaxDiagnostic::Error(SyntaxError {
                message: message.into(),
                filename: self.filename.clone(),
                row: self.row,
                line_no: self.syntax_line_no,
                src: self.source.clone(),
                span,
            })],
        }
        .into()
    }

    fn block_error(&self, message: impl Into<String>, block: &Block) -> CompileError {
        ParseError {
            diagnostics: vec![SyntaxDiagnostic::Error(SyntaxError {
                message: message.into(),
                filename: self.filename.clone(),
                row: block.row,
                line_no: block.line_no,
                src: block.source.clone(),
                span: block.span,
            })],
        }
        .into()
    }
}

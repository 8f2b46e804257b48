use crate::{
    ast::*,
    exception::{
        sort_diagnostics, ParseError, ParseWarning, SyntaxDiagnostic, SyntaxError, SyntaxWarning,
    },
    scanner::{Scanner, Token, TokenKind},
    source::SourceSpan,
};

/// Panic-mode signal: the current instruction is beyond repair, unwind to
/// the next `:` or row boundary and keep parsing from there.
#[derive(Debug)]
pub struct Synchronize;

pub struct Parser<'a> {
    filename: String,
    rows: Vec<&'a str>,
    scanner: Scanner<'a>,
    current: Token,
    next: Token,
    is_program: bool,
    is_short_if: bool,
    prev_line_no: Option<i64>,
    current_line_no: Option<i64>,
    cmd_no: usize,
    previous_span: SourceSpan,
    diagnostics: Vec<SyntaxDiagnostic>,
    line_diagnostics: Vec<SyntaxDiagnostic>,
}

impl<'a> Parser<'a> {
    /// Parse a whole script. Every row must start with a line number; the
    /// resulting program is sorted by it.
    pub fn parse_program(
        filename: &str,
        source: &'a str,
    ) -> Result<(Program, Option<ParseWarning>), ParseError> {
        let mut parser = Self::new(filename, source, true);
        let mut lines = parser.parse_lines();
        lines.sort_by_key(|line| line.line_no);
        let program = Program {
            filename: filename.to_string(),
            lines,
        };
        parser.finish().map(|warning| (program, warning))
    }

    /// Parse one round of interactive input: numbered rows are program
    /// edits, unnumbered rows are commands.
    pub fn parse_input(source: &'a str) -> Result<(Input, Option<ParseWarning>), ParseError> {
        let mut parser = Self::new("<input>", source, false);
        let input = parser.parse_rows();
        parser.finish().map(|warning| (input, warning))
    }

    fn new(filename: &str, source: &'a str, is_program: bool) -> Self {
        let mut parser = Self {
            filename: filename.to_string(),
            rows: source.split('\n').collect(),
            scanner: Scanner::new(source),
            current: Token::new(TokenKind::Eof, 0, 1, 0.into(), String::new(), None, vec![]),
            next: Token::new(TokenKind::Eof, 0, 1, 0.into(), String::new(), None, vec![]),
            is_program,
            is_short_if: false,
            prev_line_no: None,
            current_line_no: None,
            cmd_no: 0,
            previous_span: 0.into(),
            diagnostics: Vec::new(),
            line_diagnostics: Vec::new(),
        };
        parser.current = parser.pull();
        parser.next = parser.pull();
        parser
    }

    fn finish(mut self) -> Result<Option<ParseWarning>, ParseError> {
        self.flush_row(self.current.row);
        sort_diagnostics(&mut self.diagnostics);
        if self.diagnostics.iter().any(SyntaxDiagnostic::is_error) {
            Err(ParseError {
                diagnostics: self.diagnostics,
            })
        } else if self.diagnostics.is_empty() {
            Ok(None)
        } else {
            Ok(Some(ParseWarning {
                diagnostics: self.diagnostics,
            }))
        }
    }

    fn parse_lines(&mut self) -> Vec<Line> {
        let mut lines = Vec::new();
        while !self.at_eof() {
            if self.current.kind == TokenKind::LineEnding {
                self.row_ending(self.current.row);
                continue;
            }
            let row = self.current.row;
            match self.line() {
                Ok(line) => lines.push(line),
                Err(Synchronize) => self.synchronize_to_row_end(),
            }
            self.row_ending(row);
        }
        lines
    }

    fn parse_rows(&mut self) -> Input {
        let mut rows = Vec::new();
        while !self.at_eof() {
            if self.current.kind == TokenKind::LineEnding {
                self.row_ending(self.current.row);
                continue;
            }
            let row = self.current.row;
            if self.current.kind == TokenKind::DecimalLiteral {
                match self.line() {
                    Ok(line) => rows.push(Row::Line(line)),
                    Err(Synchronize) => self.synchronize_to_row_end(),
                }
            } else {
                self.cmd_no += 1;
                let cmd_no = self.cmd_no;
                let instructions = self.instructions();
                rows.push(Row::Cmd(Cmd {
                    cmd_no,
                    row,
                    source: self.row_source(row).to_string(),
                    instructions,
                }));
            }
            self.row_ending(row);
        }
        rows
    }

    fn line(&mut self) -> Result<Line, Synchronize> {
        let row = self.current.row;
        let line_no = self.line_number()?;
        self.current_line_no = Some(line_no);
        let instructions = self.instructions();
        self.current_line_no = None;
        Ok(Line {
            line_no,
            row,
            source: self.row_source(row).to_string(),
            instructions,
        })
    }

    fn line_number(&mut self) -> Result<i64, Synchronize> {
        if self.current.kind != TokenKind::DecimalLiteral {
            return Err(self.syntax_error("Expected line number", self.current.offset));
        }
        let line_no = match &self.current.value {
            Some(crate::value::Value::Integer(i)) => *i,
            _ => 0,
        };
        if line_no % 10 != 0 {
            self.syntax_warning("Line numbers should be in factors of 10", self.current.offset);
        }
        if let Some(prev) = self.prev_line_no {
            if line_no <= prev {
                self.syntax_warning("Line numbers should be in order", self.current.offset);
            }
        }
        self.prev_line_no = Some(line_no);
        self.forward();
        Ok(line_no)
    }

    fn instructions(&mut self) -> Vec<Instr> {
        let mut instructions = Vec::new();
        loop {
            if self.at_row_end() {
                break;
            }
            match self.instruction() {
                Ok(instr) => instructions.push(instr),
                Err(Synchronize) => self.synchronize(),
            }
            match self.current.kind {
                TokenKind::Colon => {
                    self.forward();
                }
                TokenKind::LineEnding | TokenKind::Eof => break,
                // a remark does not need a separating colon
                TokenKind::Rem => continue,
                _ => {
                    let message = format!("Unexpected token `{}`", self.current.text);
                    let span = self.current.offset;
                    let Synchronize = self.syntax_error(message, span);
                    self.synchronize();
                    if self.current.kind == TokenKind::Colon {
                        self.forward();
                    }
                }
            }
        }
        instructions
    }

    fn instruction(&mut self) -> Result<Instr, Synchronize> {
        let start = self.current.offset;
        match self.current.kind {
            TokenKind::Rem => {
                let token = self.forward();
                let remark = match token.value {
                    Some(crate::value::Value::String(s)) => s.to_string(),
                    _ => String::new(),
                };
                Ok(Instr::new(start, InstrKind::Rem { remark }))
            }
            TokenKind::Print => {
                self.forward();
                let expression = self.expression()?;
                Ok(self.instr_from(start, InstrKind::Print { expression }))
            }
            TokenKind::Let => {
                self.forward();
                if !self.current.kind.is_ident() {
                    return Err(self.syntax_error("Expected variable name", self.current.offset));
                }
                let variable = self.forward().text;
                let value = if self.current.kind == TokenKind::Eq {
                    self.forward();
                    Some(self.expression()?)
                } else {
                    None
                };
                Ok(self.instr_from(start, InstrKind::Let { variable, value }))
            }
            TokenKind::If => self.if_(),
            TokenKind::ElseIf => {
                self.forward();
                let condition = self.if_condition()?;
                Ok(self.instr_from(start, InstrKind::ElseIf { condition }))
            }
            TokenKind::Else => {
                self.forward();
                // `else if` is an elseif
                if self.current.kind == TokenKind::If {
                    self.forward();
                    let condition = self.if_condition()?;
                    Ok(self.instr_from(start, InstrKind::ElseIf { condition }))
                } else {
                    Ok(Instr::new(start, InstrKind::Else))
                }
            }
            TokenKind::EndIf => {
                self.forward();
                Ok(Instr::new(start, InstrKind::EndIf))
            }
            TokenKind::End => {
                self.forward();
                Ok(Instr::new(start, InstrKind::End))
            }
            TokenKind::Exit => {
                self.forward();
                let expression = if self.at_instruction_end() {
                    None
                } else {
                    Some(self.expression()?)
                };
                Ok(self.instr_from(start, InstrKind::Exit { expression }))
            }
            TokenKind::New => {
                self.forward();
                let filename = if self.at_instruction_end() {
                    None
                } else {
                    Some(self.filename_expr()?)
                };
                Ok(self.instr_from(start, InstrKind::New { filename }))
            }
            TokenKind::Load => {
                self.forward();
                if self.at_instruction_end() {
                    return Err(self.syntax_error("Expected filename", self.current.offset));
                }
                let filename = self.filename_expr()?;
                Ok(self.instr_from(start, InstrKind::Load { filename }))
            }
            TokenKind::Save => {
                self.forward();
                let filename = if self.at_instruction_end() {
                    None
                } else {
                    Some(self.filename_expr()?)
                };
                Ok(self.instr_from(start, InstrKind::Save { filename }))
            }
            TokenKind::List => {
                self.forward();
                Ok(Instr::new(start, InstrKind::List))
            }
            TokenKind::Renum => {
                self.forward();
                Ok(Instr::new(start, InstrKind::Renum))
            }
            TokenKind::Run => {
                self.forward();
                Ok(Instr::new(start, InstrKind::Run))
            }
            kind if kind.is_ident() && self.next.kind == TokenKind::Eq => {
                let variable = self.forward().text;
                self.forward(); // `=`
                let value = self.expression()?;
                Ok(self.instr_from(start, InstrKind::Assign { variable, value }))
            }
            _ => {
                let expression = self.expression()?;
                Ok(self.instr_from(start, InstrKind::Expression { expression }))
            }
        }
    }

    fn if_condition(&mut self) -> Result<Expr, Synchronize> {
        let condition = self.expression()?;
        self.consume(TokenKind::Then, "Expected `then` after condition")?;
        Ok(condition)
    }

    fn if_(&mut self) -> Result<Instr, Synchronize> {
        let start = self.current.offset;
        self.forward(); // `if`
        let condition = self.if_condition()?;

        if !self.is_short_if && self.at_row_end() {
            return Ok(self.instr_from(start, InstrKind::If { condition }));
        }

        let then_branch = self.short_branch()?;
        let else_branch = if self.current.kind == TokenKind::Else {
            self.forward();
            self.short_branch()?
        } else {
            Vec::new()
        };
        self.consume(TokenKind::EndIf, "Expected `endif` after inline `if`")?;
        Ok(self.instr_from(
            start,
            InstrKind::ShortIf {
                condition,
                then_branch,
                else_branch,
            },
        ))
    }

    fn short_branch(&mut self) -> Result<Vec<Instr>, Synchronize> {
        let was_short_if = self.is_short_if;
        self.is_short_if = true;
        let result = self.short_branch_instructions();
        self.is_short_if = was_short_if;
        result
    }

    fn short_branch_instructions(&mut self) -> Result<Vec<Instr>, Synchronize> {
        let mut instructions = Vec::new();
        loop {
            if matches!(
                self.current.kind,
                TokenKind::Else | TokenKind::EndIf | TokenKind::LineEnding | TokenKind::Eof
            ) {
                break;
            }
            instructions.push(self.instruction()?);
            if self.current.kind == TokenKind::Colon {
                self.forward();
            }
        }
        Ok(instructions)
    }

    fn filename_expr(&mut self) -> Result<Expr, Synchronize> {
        let expr = if self.current.kind == TokenKind::ShellToken {
            let token = self.forward();
            Expr::new(token.offset, ExprKind::StringLiteral(token.text))
        } else {
            self.expression()?
        };
        while self.current.kind == TokenKind::LongFlag {
            let message = format!("Unsupported flag `{}`", self.current.text);
            let span = self.current.offset;
            self.syntax_warning(message, span);
            self.forward();
        }
        Ok(expr)
    }

    fn expression(&mut self) -> Result<Expr, Synchronize> {
        self.or_expr()
    }

    fn or_expr(&mut self) -> Result<Expr, Synchronize> {
        let mut expr = self.and_expr()?;
        while self.current.kind == TokenKind::Or {
            self.forward();
            let right = self.and_expr()?;
            expr = binary_like(expr, right, |left, right| ExprKind::Logical {
                left,
                op: LogicalOp::Or,
                right,
            });
        }
        Ok(expr)
    }

    fn and_expr(&mut self) -> Result<Expr, Synchronize> {
        let mut expr = self.equality()?;
        while self.current.kind == TokenKind::And {
            self.forward();
            let right = self.equality()?;
            expr = binary_like(expr, right, |left, right| ExprKind::Logical {
                left,
                op: LogicalOp::And,
                right,
            });
        }
        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr, Synchronize> {
        let mut expr = self.comparison()?;
        loop {
            let op = match self.current.kind {
                TokenKind::EqEq => BinaryOp::Eq,
                TokenKind::Ne => BinaryOp::Ne,
                TokenKind::Eq => {
                    self.syntax_warning(
                        "Use `==` instead of `=` to test for equality",
                        self.current.offset,
                    );
                    BinaryOp::Eq
                }
                TokenKind::BangEq => {
                    self.syntax_warning(
                        "Use `<>` instead of `!=` to test for inequality",
                        self.current.offset,
                    );
                    BinaryOp::Ne
                }
                _ => break,
            };
            self.forward();
            let right = self.comparison()?;
            expr = binary_like(expr, right, |left, right| ExprKind::Binary {
                left,
                op,
                right,
            });
        }
        Ok(expr)
    }

    fn comparison(&mut self) -> Result<Expr, Synchronize> {
        let mut expr = self.term()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::Ge => BinaryOp::Ge,
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::Le => BinaryOp::Le,
                _ => break,
            };
            self.forward();
            let right = self.term()?;
            expr = binary_like(expr, right, |left, right| ExprKind::Binary {
                left,
                op,
                right,
            });
        }
        Ok(expr)
    }

    fn term(&mut self) -> Result<Expr, Synchronize> {
        let mut expr = self.factor()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.forward();
            let right = self.factor()?;
            expr = binary_like(expr, right, |left, right| ExprKind::Binary {
                left,
                op,
                right,
            });
        }
        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expr, Synchronize> {
        let mut expr = self.unary()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                _ => break,
            };
            self.forward();
            let right = self.unary()?;
            expr = binary_like(expr, right, |left, right| ExprKind::Binary {
                left,
                op,
                right,
            });
        }
        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr, Synchronize> {
        let op = match self.current.kind {
            TokenKind::Not => Some(UnaryOp::Not),
            TokenKind::Minus => Some(UnaryOp::Neg),
            _ => None,
        };
        if let Some(op) = op {
            let start = self.current.offset;
            self.forward();
            let expr = self.unary()?;
            let span = start.union(&expr.span);
            return Ok(Expr::new(
                span,
                ExprKind::Unary {
                    op,
                    expr: Box::new(expr),
                },
            ));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, Synchronize> {
        match self.current.kind {
            TokenKind::DecimalLiteral
            | TokenKind::HexLiteral
            | TokenKind::OctalLiteral
            | TokenKind::BinaryLiteral
            | TokenKind::RealLiteral
            | TokenKind::True
            | TokenKind::False
            | TokenKind::NilLiteral
            | TokenKind::StringLiteral => {
                let token = self.forward();
                let kind = match &token.value {
                    Some(value) => literal_kind(value),
                    None => ExprKind::NilLiteral,
                };
                Ok(Expr::new(token.offset, kind))
            }
            TokenKind::UnterminatedStringLiteral => {
                let span = self.current.offset;
                Err(self.syntax_error("Unterminated string", span))
            }
            kind if kind.is_ident() => {
                let token = self.forward();
                Ok(Expr::new(
                    token.offset,
                    ExprKind::Variable { name: token.text },
                ))
            }
            TokenKind::LParen => {
                let start = self.current.offset;
                self.forward();
                let expr = self.expression()?;
                let end = self.current.offset;
                self.consume(TokenKind::RParen, "Expected closing parenthesis")?;
                Ok(Expr::new(
                    start.union(&end),
                    ExprKind::Group {
                        expr: Box::new(expr),
                    },
                ))
            }
            _ => {
                let message = format!("Unexpected token `{}`", self.current.text);
                let span = self.current.offset;
                Err(self.syntax_error(message, span))
            }
        }
    }

    fn instr_from(&self, start: SourceSpan, kind: InstrKind) -> Instr {
        Instr::new(start.union(&self.previous_span), kind)
    }

    fn consume(
        &mut self,
        kind: TokenKind,
        message: impl Into<String>,
    ) -> Result<Token, Synchronize> {
        if self.current.kind == kind {
            Ok(self.forward())
        } else {
            Err(self.syntax_error(message, self.current.offset))
        }
    }

    fn at_eof(&self) -> bool {
        self.current.kind == TokenKind::Eof
    }

    fn at_row_end(&self) -> bool {
        matches!(self.current.kind, TokenKind::LineEnding | TokenKind::Eof)
    }

    fn at_instruction_end(&self) -> bool {
        self.at_row_end() || matches!(self.current.kind, TokenKind::Colon | TokenKind::Rem)
    }

    fn row_ending(&mut self, row: usize) {
        if self.current.kind == TokenKind::LineEnding {
            self.forward();
        }
        self.flush_row(row);
    }

    /// Skip to the next place parsing can restart: a `:`, a row boundary,
    /// or the end of input.
    fn synchronize(&mut self) {
        while !matches!(
            self.current.kind,
            TokenKind::Colon | TokenKind::LineEnding | TokenKind::Eof
        ) {
            self.forward();
        }
    }

    fn synchronize_to_row_end(&mut self) {
        while !self.at_row_end() {
            self.forward();
        }
    }

    fn pull(&mut self) -> Token {
        loop {
            let token = self.scanner.next_token();
            if token.kind != TokenKind::Whitespace {
                return token;
            }
        }
    }

    fn forward(&mut self) -> Token {
        let new_next = self.pull();
        let new_current = std::mem::replace(&mut self.next, new_next);
        let consumed = std::mem::replace(&mut self.current, new_current);
        self.previous_span = consumed.offset;
        for warning in &consumed.warnings {
            self.line_diagnostics
                .push(SyntaxDiagnostic::Warning(SyntaxWarning {
                    message: warning.message.clone(),
                    filename: self.filename.clone(),
                    row: consumed.row,
                    line_no: self.current_line_no,
                    src: String::new(),
                    span: warning.span,
                }));
        }
        consumed
    }

    fn syntax_error(&mut self, message: impl Into<String>, span: SourceSpan) -> Synchronize {
        self.line_diagnostics
            .push(SyntaxDiagnostic::Error(SyntaxError {
                message: message.into(),
                filename: self.filename.clone(),
                row: self.current.row,
                line_no: self.current_line_no,
                src: String::new(),
                span,
            }));
        Synchronize
    }

    fn syntax_warning(&mut self, message: impl Into<String>, span: SourceSpan) {
        self.line_diagnostics
            .push(SyntaxDiagnostic::Warning(SyntaxWarning {
                message: message.into(),
                filename: self.filename.clone(),
                row: self.current.row,
                line_no: self.current_line_no,
                src: String::new(),
                span,
            }));
    }

    fn row_source(&self, row: usize) -> &str {
        self.rows.get(row - 1).copied().unwrap_or("")
    }

    fn flush_row(&mut self, row: usize) {
        let source = self.row_source(row).to_string();
        for mut diagnostic in self.line_diagnostics.drain(..) {
            diagnostic.set_source(&source);
            self.diagnostics.push(diagnostic);
        }
    }
}

fn binary_like<F: FnOnce(Box<Expr>, Box<Expr>) -> ExprKind>(
    left: Expr,
    right: Expr,
    build: F,
) -> Expr {
    let span = left.span.union(&right.span);
    Expr::new(span, build(Box::new(left), Box::new(right)))
}

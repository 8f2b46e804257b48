use std::{collections::HashMap, collections::VecDeque, str::CharIndices};

use derive_new::new;
use lazy_static::lazy_static;

use crate::{
    source::{SourceOffset, SourceSpan},
    value::Value,
};

/// A problem noticed while scanning a single token. These ride along on the
/// token itself; the parser turns them into located syntax warnings once it
/// knows what line the token belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenWarning {
    pub message: String,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    LParen,
    RParen,
    Comma,
    Colon,
    Eq,
    EqEq,
    BangEq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Plus,
    Minus,
    Star,
    Slash,
    And,
    Or,
    Not,
    DecimalLiteral,
    HexLiteral,
    OctalLiteral,
    BinaryLiteral,
    RealLiteral,
    True,
    False,
    NilLiteral,
    StringLiteral,
    UnterminatedStringLiteral,
    Ident,
    IntIdent,
    RealIdent,
    BoolIdent,
    StringIdent,
    Print,
    Let,
    If,
    Then,
    Else,
    ElseIf,
    EndIf,
    End,
    Exit,
    New,
    Load,
    Save,
    List,
    Run,
    Renum,
    Rem,
    LongFlag,
    ShellToken,
    LineEnding,
    Whitespace,
    Eof,
    Illegal,
}

impl TokenKind {
    pub fn is_ident(self) -> bool {
        matches!(
            self,
            TokenKind::Ident
                | TokenKind::IntIdent
                | TokenKind::RealIdent
                | TokenKind::BoolIdent
                | TokenKind::StringIdent
        )
    }
}

lazy_static! {
    static ref KEYWORDS: HashMap<&'static str, TokenKind> = {
        let mut keywords = HashMap::new();
        keywords.insert("and", TokenKind::And);
        keywords.insert("or", TokenKind::Or);
        keywords.insert("not", TokenKind::Not);
        keywords.insert("true", TokenKind::True);
        keywords.insert("false", TokenKind::False);
        keywords.insert("nil", TokenKind::NilLiteral);
        keywords.insert("print", TokenKind::Print);
        keywords.insert("let", TokenKind::Let);
        keywords.insert("if", TokenKind::If);
        keywords.insert("then", TokenKind::Then);
        keywords.insert("else", TokenKind::Else);
        keywords.insert("elseif", TokenKind::ElseIf);
        keywords.insert("endif", TokenKind::EndIf);
        keywords.insert("end", TokenKind::End);
        keywords.insert("exit", TokenKind::Exit);
        keywords.insert("new", TokenKind::New);
        keywords.insert("load", TokenKind::Load);
        keywords.insert("save", TokenKind::Save);
        keywords.insert("list", TokenKind::List);
        keywords.insert("run", TokenKind::Run);
        keywords.insert("renum", TokenKind::Renum);
        keywords
    };
}

/// One scanned token. `index` is the byte offset of the token's start
/// within the whole source; `row` is 1-based; `offset` is the column span
/// within that row, so diagnostics can point into a single line of input.
#[derive(Debug, Clone, PartialEq, new)]
pub struct Token {
    pub kind: TokenKind,
    pub index: usize,
    pub row: usize,
    pub offset: SourceSpan,
    pub text: String,
    pub value: Option<Value>,
    pub warnings: Vec<TokenWarning>,
}

pub struct Scanner<'a> {
    source: &'a str,
    iterator: CharIndices<'a>,
    buffered: VecDeque<(usize, char)>,
    at_end: bool,
    emitted_eof: bool,
    current_offset: usize,
    current_len: usize,
    token_start: usize,
    row: usize,
    row_start: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            iterator: source.char_indices(),
            buffered: VecDeque::new(),
            at_end: false,
            emitted_eof: false,
            current_offset: 0,
            current_len: 0,
            token_start: 0,
            row: 1,
            row_start: 0,
        }
    }

    fn advance(&mut self) -> Option<char> {
        if let Some((offset, ch)) = self.buffered.pop_front().or_else(|| self.iterator.next()) {
            self.current_offset = offset;
            self.current_len = ch.len_utf8();
            Some(ch)
        } else {
            self.at_end = true;
            None
        }
    }

    fn advance_while<F: Fn(char) -> bool>(&mut self, check: F) {
        loop {
            match self.peek(1) {
                Some(ch) if check(ch) => {
                    self.advance();
                }
                _ => return,
            }
        }
    }

    fn peek(&mut self, offset: usize) -> Option<char> {
        assert!(offset > 0);
        for _ in self.buffered.len()..offset {
            if let Some(entry) = self.iterator.next() {
                self.buffered.push_back(entry);
            } else {
                return None;
            }
        }
        self.buffered.get(offset - 1).map(|entry| entry.1)
    }

    fn next_offset(&self) -> usize {
        self.current_offset + self.current_len
    }

    fn begin_token(&mut self) {
        self.token_start = self.current_offset;
    }

    fn column_of(&self, byte_offset: usize) -> usize {
        byte_offset - self.row_start
    }

    fn yield_token(&mut self, kind: TokenKind) -> Token {
        self.yield_token_with(kind, None, vec![])
    }

    fn yield_token_with(
        &mut self,
        kind: TokenKind,
        value: Option<Value>,
        warnings: Vec<TokenWarning>,
    ) -> Token {
        let text = self.source[self.token_start..self.next_offset()].to_string();
        let offset = SourceSpan::range(
            SourceOffset::from(self.column_of(self.token_start)),
            SourceOffset::from(self.column_of(self.next_offset())),
        );
        Token::new(kind, self.token_start, self.row, offset, text, value, warnings)
    }

    fn yield_conditional_token(
        &mut self,
        target_ch: char,
        kind_if_found: TokenKind,
        kind_if_not_found: TokenKind,
    ) -> Token {
        let kind = match self.peek(1) {
            Some(ch) if ch == target_ch => {
                self.advance();
                kind_if_found
            }
            _ => kind_if_not_found,
        };
        self.yield_token(kind)
    }

    /// The next token in the input. After the source runs out, yields Eof
    /// forever.
    pub fn next_token(&mut self) -> Token {
        let next = self.advance();
        match next {
            None => {
                self.token_start = self.next_offset();
                self.yield_token(TokenKind::Eof)
            }
            Some(ch) => {
                self.begin_token();
                self.scan_token(ch)
            }
        }
    }

    fn scan_token(&mut self, ch: char) -> Token {
        match ch {
            '\n' => {
                let token = self.yield_token(TokenKind::LineEnding);
                self.row += 1;
                self.row_start = self.next_offset();
                token
            }
            ' ' | '\t' | '\r' => {
                self.advance_while(|ch| matches!(ch, ' ' | '\t' | '\r'));
                self.yield_token(TokenKind::Whitespace)
            }
            '(' => self.yield_token(TokenKind::LParen),
            ')' => self.yield_token(TokenKind::RParen),
            ',' => self.yield_token(TokenKind::Comma),
            ':' => self.yield_token(TokenKind::Colon),
            '+' => self.yield_token(TokenKind::Plus),
            '*' => self.yield_token(TokenKind::Star),
            '/' => self.yield_token(TokenKind::Slash),
            '-' => {
                if self.peek(1) == Some('-') && matches!(self.peek(2), Some(c) if c.is_ascii_alphabetic()) {
                    self.advance();
                    self.advance_while(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');
                    self.yield_token(TokenKind::LongFlag)
                } else {
                    self.yield_token(TokenKind::Minus)
                }
            }
            '=' => self.yield_conditional_token('=', TokenKind::EqEq, TokenKind::Eq),
            '>' => self.yield_conditional_token('=', TokenKind::Ge, TokenKind::Gt),
            '<' => match self.peek(1) {
                Some('=') => {
                    self.advance();
                    self.yield_token(TokenKind::Le)
                }
                Some('>') => {
                    self.advance();
                    self.yield_token(TokenKind::Ne)
                }
                _ => self.yield_token(TokenKind::Lt),
            },
            '!' => {
                if self.peek(1) == Some('=') {
                    self.advance();
                    self.yield_token(TokenKind::BangEq)
                } else {
                    self.yield_token(TokenKind::Illegal)
                }
            }
            ';' => self.scan_remark(1),
            '\'' | '"' => self.scan_string(ch),
            '0'..='9' => self.scan_number(ch),
            'a'..='z' | 'A'..='Z' | '_' => self.scan_word(),
            '.' | '~' | '@' => {
                self.advance_while(is_shell_char);
                self.yield_token(TokenKind::ShellToken)
            }
            _ => self.yield_token(TokenKind::Illegal),
        }
    }

    /// Both `rem` and a bare `;` swallow everything up to the end of the
    /// row; the remark text (without the marker) becomes the token's value.
    fn scan_remark(&mut self, marker_len: usize) -> Token {
        self.advance_while(|ch| ch != '\n');
        let text = &self.source[self.token_start..self.next_offset()];
        let remark = text[marker_len..].strip_prefix(' ').unwrap_or(&text[marker_len..]);
        let value = Some(Value::from(remark));
        self.yield_token_with(TokenKind::Rem, value, vec![])
    }

    fn scan_string(&mut self, quote: char) -> Token {
        let mut decoded = String::new();
        let mut warnings = Vec::new();
        loop {
            match self.peek(1) {
                None | Some('\n') => {
                    return self.yield_token(TokenKind::UnterminatedStringLiteral);
                }
                Some(ch) if ch == quote => {
                    self.advance();
                    return self.yield_token_with(
                        TokenKind::StringLiteral,
                        Some(Value::from(decoded)),
                        warnings,
                    );
                }
                Some('\\') => {
                    self.advance();
                    let escape_start = self.column_of(self.current_offset);
                    match self.advance() {
                        None => {
                            return self.yield_token(TokenKind::UnterminatedStringLiteral);
                        }
                        Some('a') => decoded.push('\x07'),
                        Some('b') => decoded.push('\x08'),
                        Some('e') => decoded.push('\x1b'),
                        Some('f') => decoded.push('\x0c'),
                        Some('n') => decoded.push('\n'),
                        Some('r') => decoded.push('\r'),
                        Some('t') => decoded.push('\t'),
                        Some('v') => decoded.push('\x0b'),
                        Some('\'') => decoded.push('\''),
                        Some('"') => decoded.push('"'),
                        Some('\\') => decoded.push('\\'),
                        Some(ch) => {
                            decoded.push('\\');
                            decoded.push(ch);
                            warnings.push(TokenWarning {
                                message: format!("Invalid escape sequence `\\{}` in string", ch),
                                span: (escape_start..self.column_of(self.next_offset())).into(),
                            });
                        }
                    }
                }
                Some(_) => {
                    if let Some(ch) = self.advance() {
                        decoded.push(ch);
                    }
                }
            }
        }
    }

    fn scan_number(&mut self, first: char) -> Token {
        if first == '0' {
            if let Some(kind) = match self.peek(1) {
                Some('x') | Some('X') => Some(TokenKind::HexLiteral),
                Some('o') | Some('O') => Some(TokenKind::OctalLiteral),
                Some('b') | Some('B') => Some(TokenKind::BinaryLiteral),
                _ => None,
            } {
                let radix = match kind {
                    TokenKind::HexLiteral => 16,
                    TokenKind::OctalLiteral => 8,
                    _ => 2,
                };
                self.advance();
                self.advance_while(|ch| ch.is_digit(radix) || ch == '_');
                let digits: String = self.source[self.token_start + 2..self.next_offset()]
                    .chars()
                    .filter(|ch| *ch != '_')
                    .collect();
                return match i64::from_str_radix(&digits, radix) {
                    Ok(value) => self.yield_token_with(kind, Some(Value::Integer(value)), vec![]),
                    Err(_) => self.yield_token(TokenKind::Illegal),
                };
            }
        }

        self.advance_while(|ch| ch.is_ascii_digit() || ch == '_');
        let mut is_real = false;
        if self.peek(1) == Some('.')
            && matches!(self.peek(2), Some(ch) if ch.is_ascii_digit())
        {
            is_real = true;
            self.advance();
            self.advance_while(|ch| ch.is_ascii_digit() || ch == '_');
        }
        if matches!(self.peek(1), Some('e') | Some('E')) {
            let exponent_ok = match self.peek(2) {
                Some(ch) if ch.is_ascii_digit() => true,
                Some('+') | Some('-') => {
                    matches!(self.peek(3), Some(ch) if ch.is_ascii_digit())
                }
                _ => false,
            };
            if exponent_ok {
                is_real = true;
                self.advance();
                if matches!(self.peek(1), Some('+') | Some('-')) {
                    self.advance();
                }
                self.advance_while(|ch| ch.is_ascii_digit() || ch == '_');
            }
        }

        let digits: String = self.source[self.token_start..self.next_offset()]
            .chars()
            .filter(|ch| *ch != '_')
            .collect();
        if is_real {
            match digits.parse::<f64>() {
                Ok(value) => {
                    self.yield_token_with(TokenKind::RealLiteral, Some(Value::Real(value)), vec![])
                }
                Err(_) => self.yield_token(TokenKind::Illegal),
            }
        } else {
            match digits.parse::<i64>() {
                Ok(value) => self.yield_token_with(
                    TokenKind::DecimalLiteral,
                    Some(Value::Integer(value)),
                    vec![],
                ),
                Err(_) => self.yield_token(TokenKind::Illegal),
            }
        }
    }

    fn scan_word(&mut self) -> Token {
        self.advance_while(|ch| matches!(ch, 'a'..='z' | 'A'..='Z' | '_' | '0'..='9'));

        // a trailing sigil types the identifier, but `a != b` must keep its
        // bang-equals
        let sigil = match self.peek(1) {
            Some('%') => Some(TokenKind::IntIdent),
            Some('!') if self.peek(2) != Some('=') => Some(TokenKind::RealIdent),
            Some('?') => Some(TokenKind::BoolIdent),
            Some('$') => Some(TokenKind::StringIdent),
            _ => None,
        };
        if let Some(kind) = sigil {
            self.advance();
            return self.yield_token(kind);
        }

        let word = self.source[self.token_start..self.next_offset()].to_ascii_lowercase();
        if word == "rem" {
            return self.scan_remark(3);
        }
        match KEYWORDS.get(word.as_str()).copied() {
            Some(TokenKind::True) => {
                self.yield_token_with(TokenKind::True, Some(Value::Boolean(true)), vec![])
            }
            Some(TokenKind::False) => {
                self.yield_token_with(TokenKind::False, Some(Value::Boolean(false)), vec![])
            }
            Some(TokenKind::NilLiteral) => {
                self.yield_token_with(TokenKind::NilLiteral, Some(Value::Nil), vec![])
            }
            Some(kind) => self.yield_token(kind),
            None => self.yield_token(TokenKind::Ident),
        }
    }
}

fn is_shell_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '.' | '/' | '~' | '@' | '_' | '-' | '+')
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        if self.emitted_eof {
            return None;
        }
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            self.emitted_eof = true;
        }
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn scan(source: &str) -> Vec<Token> {
        Scanner::new(source).collect()
    }

    fn kinds(source: &str) -> Vec<TokenKind> {
        scan(source)
            .into_iter()
            .filter(|token| token.kind != TokenKind::Whitespace)
            .map(|token| token.kind)
            .collect()
    }

    #[test]
    fn scans_a_print_line() {
        let tokens = scan("100 print \"hello world\"\n");
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::DecimalLiteral,
                TokenKind::Whitespace,
                TokenKind::Print,
                TokenKind::Whitespace,
                TokenKind::StringLiteral,
                TokenKind::LineEnding,
                TokenKind::Eof,
            ]
        );
        assert_eq!(tokens[0].value, Some(Value::Integer(100)));
        assert_eq!(tokens[4].value, Some(Value::from("hello world")));
        assert_eq!(tokens[4].text, "\"hello world\"");
    }

    #[test]
    fn tracks_rows_and_columns() {
        let tokens = scan("10 end\n20 end\n");
        let ends: Vec<_> = tokens
            .iter()
            .filter(|token| token.kind == TokenKind::End)
            .collect();
        assert_eq!(ends.len(), 2);
        assert_eq!(ends[0].row, 1);
        assert_eq!(ends[1].row, 2);
        // columns reset at each line ending
        assert_eq!(ends[0].offset, ends[1].offset);
        assert_eq!(ends[0].offset.start(), 3.into());
    }

    #[test]
    fn tokens_carry_their_byte_position() {
        let tokens = scan("10 end\n20 end\n");
        let ends: Vec<_> = tokens
            .iter()
            .filter(|token| token.kind == TokenKind::End)
            .collect();
        assert_eq!(ends[0].index, 3);
        assert_eq!(ends[1].index, 10);
    }

    #[test]
    fn scans_every_integer_radix() {
        let tokens = scan("255 0xff 0o377 0b1111_1111");
        let values: Vec<_> = tokens
            .iter()
            .filter(|token| token.value.is_some())
            .map(|token| (token.kind, token.value.clone()))
            .collect();
        assert_eq!(
            values,
            vec![
                (TokenKind::DecimalLiteral, Some(Value::Integer(255))),
                (TokenKind::HexLiteral, Some(Value::Integer(255))),
                (TokenKind::OctalLiteral, Some(Value::Integer(255))),
                (TokenKind::BinaryLiteral, Some(Value::Integer(255))),
            ]
        );
    }

    #[test]
    fn scans_reals_with_exponents() {
        let tokens = scan("1.5 1_000.5 2e3 1.5e-2");
        let values: Vec<_> = tokens
            .iter()
            .filter(|token| token.kind == TokenKind::RealLiteral)
            .map(|token| token.value.clone())
            .collect();
        assert_eq!(
            values,
            vec![
                Some(Value::Real(1.5)),
                Some(Value::Real(1000.5)),
                Some(Value::Real(2000.0)),
                Some(Value::Real(0.015)),
            ]
        );
    }

    #[test]
    fn decodes_string_escapes() {
        let tokens = scan(r#""a\tb\nc\\d""#);
        assert_eq!(tokens[0].kind, TokenKind::StringLiteral);
        assert_eq!(tokens[0].value, Some(Value::from("a\tb\nc\\d")));
        assert!(tokens[0].warnings.is_empty());
    }

    #[test]
    fn single_quoted_strings_work_too() {
        let tokens = scan("'it''s fine'");
        assert_eq!(tokens[0].kind, TokenKind::StringLiteral);
        assert_eq!(tokens[0].value, Some(Value::from("it")));
    }

    #[test]
    fn invalid_escapes_warn_but_keep_the_text() {
        let tokens = scan(r#""a\qb""#);
        assert_eq!(tokens[0].kind, TokenKind::StringLiteral);
        assert_eq!(tokens[0].value, Some(Value::from("a\\qb")));
        assert_eq!(tokens[0].warnings.len(), 1);
        assert_eq!(
            tokens[0].warnings[0].message,
            "Invalid escape sequence `\\q` in string"
        );
    }

    #[test]
    fn unterminated_strings_stop_at_the_line_ending() {
        let tokens = scan("\"oops\nprint");
        assert_eq!(tokens[0].kind, TokenKind::UnterminatedStringLiteral);
        assert_eq!(tokens[1].kind, TokenKind::LineEnding);
        assert_eq!(tokens[2].kind, TokenKind::Print);
    }

    #[test]
    fn remarks_swallow_the_rest_of_the_row() {
        let tokens = scan("rem hello : print 1\n; also a remark");
        assert_eq!(tokens[0].kind, TokenKind::Rem);
        assert_eq!(tokens[0].value, Some(Value::from("hello : print 1")));
        assert_eq!(tokens[1].kind, TokenKind::LineEnding);
        assert_eq!(tokens[2].kind, TokenKind::Rem);
        assert_eq!(tokens[2].value, Some(Value::from("also a remark")));
    }

    #[test]
    fn sigils_type_identifiers() {
        assert_eq!(
            kinds("count% ratio! done? name$ plain"),
            vec![
                TokenKind::IntIdent,
                TokenKind::RealIdent,
                TokenKind::BoolIdent,
                TokenKind::StringIdent,
                TokenKind::Ident,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn bang_equals_beats_the_real_sigil() {
        assert_eq!(
            kinds("a != b"),
            vec![
                TokenKind::Ident,
                TokenKind::BangEq,
                TokenKind::Ident,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn operators_and_comparisons() {
        assert_eq!(
            kinds("= == <> != < <= > >= + - * / ( ) : ,"),
            vec![
                TokenKind::Eq,
                TokenKind::EqEq,
                TokenKind::Ne,
                TokenKind::BangEq,
                TokenKind::Lt,
                TokenKind::Le,
                TokenKind::Gt,
                TokenKind::Ge,
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::Colon,
                TokenKind::Comma,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn keywords_are_case_insensitive() {
        assert_eq!(
            kinds("PRINT Let IF then"),
            vec![
                TokenKind::Print,
                TokenKind::Let,
                TokenKind::If,
                TokenKind::Then,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn paths_scan_as_shell_tokens() {
        let tokens = scan("./scripts/hello.bas");
        assert_eq!(tokens[0].kind, TokenKind::ShellToken);
        assert_eq!(tokens[0].text, "./scripts/hello.bas");
    }

    #[test]
    fn long_flags() {
        let tokens = scan("--run");
        assert_eq!(tokens[0].kind, TokenKind::LongFlag);
        assert_eq!(tokens[0].text, "--run");
    }

    #[test]
    fn eof_repeats_forever() {
        let mut scanner = Scanner::new("");
        assert_eq!(scanner.next_token().kind, TokenKind::Eof);
        assert_eq!(scanner.next_token().kind, TokenKind::Eof);
    }
}

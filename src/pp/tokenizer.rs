//! Character-level tokenizer.
//!
//! Reading characters (`Input`) and classifying them (`Tokenizer`) are kept
//! apart: the tokenizer pulls raw characters into a lookahead buffer, and the
//! reported location only advances when a character is consumed by the
//! classifier, so buffered-but-unread text never shifts token locations.

use std::collections::VecDeque;

use symbol_table::GlobalSymbol as Symbol;

use crate::diagnostic::{DiagnosticEngine, DiagnosticId};
use crate::pp::token::{Token, TokenFlags, TokenKind, TokenValue};
use crate::source_manager::{Input, SourceId, SourceLocation};

/// Number of raw characters pulled from the input whenever the lookahead runs dry
const READ_CHUNK: usize = 16;

/// Logical read position
#[derive(Debug, Clone, Copy)]
struct ScanLocation {
    source: SourceId,
    line: u32,
    column: u32,
}

pub struct Tokenizer {
    input: Input,
    lookahead: VecDeque<(char, SourceId)>,
    input_done: bool,
    scan_loc: ScanLocation,
    /// Offset applied to reported source indices after `#line N S`
    source_delta: i64,
    line_start: bool,
    leading_space: bool,
}

impl Tokenizer {
    pub fn new(input: Input) -> Self {
        let source = input.first_source().unwrap_or(SourceId::new(0));
        Tokenizer {
            input,
            lookahead: VecDeque::new(),
            input_done: false,
            scan_loc: ScanLocation {
                source,
                line: 1,
                column: 1,
            },
            source_delta: 0,
            line_start: true,
            leading_space: false,
        }
    }

    /// The line number the next line will report
    pub fn set_line_number(&mut self, line: u32) {
        self.scan_loc.line = line;
    }

    /// Rebase the reported source index of the current string
    pub fn set_source_index(&mut self, index: u32) {
        self.source_delta = index as i64 - self.scan_loc.source.index() as i64;
    }

    pub fn source_id(&self) -> SourceId {
        self.scan_loc.source
    }

    fn fill(&mut self, n: usize) {
        while self.lookahead.len() < n && !self.input_done {
            for _ in 0..READ_CHUNK {
                match self.input.read() {
                    Some(c) => self.lookahead.push_back(c),
                    None => {
                        self.input_done = true;
                        break;
                    }
                }
            }
        }
    }

    fn peek(&mut self, k: usize) -> Option<char> {
        self.fill(k + 1);
        self.lookahead.get(k).map(|(c, _)| *c)
    }

    fn bump(&mut self) -> Option<char> {
        self.fill(1);
        let (c, source) = self.lookahead.pop_front()?;
        if source != self.scan_loc.source {
            // every string starts counting lines again
            self.scan_loc = ScanLocation {
                source,
                line: 1,
                column: 1,
            };
        }
        if c == '\n' || (c == '\r' && !self.at_crlf_tail(source)) {
            self.scan_loc.line += 1;
            self.scan_loc.column = 1;
        } else {
            self.scan_loc.column += 1;
        }
        Some(c)
    }

    /// True when the next character is the `\n` of a `\r\n` pair in the same string
    fn at_crlf_tail(&mut self, source: SourceId) -> bool {
        self.fill(1);
        matches!(self.lookahead.front(), Some(('\n', next)) if *next == source)
    }

    /// Consume one line terminator: `\n`, `\r` or `\r\n`
    fn bump_newline(&mut self) {
        self.fill(2);
        let crlf = matches!(
            (self.lookahead.front(), self.lookahead.get(1)),
            (Some(('\r', first)), Some(('\n', second))) if first == second
        );
        self.bump();
        if crlf {
            self.bump();
        }
    }

    /// Location of the next character to be consumed
    fn location(&mut self) -> SourceLocation {
        self.fill(1);
        let mut loc = self.scan_loc;
        if let Some((_, source)) = self.lookahead.front()
            && *source != loc.source
        {
            loc = ScanLocation {
                source: *source,
                line: 1,
                column: 1,
            };
        }
        let index = (loc.source.index() as i64 + self.source_delta).max(0) as u32;
        SourceLocation::new(index, loc.line, loc.column)
    }

    fn take_flags(&mut self) -> TokenFlags {
        let mut flags = TokenFlags::empty();
        flags.set(TokenFlags::AT_START_OF_LINE, self.line_start);
        flags.set(TokenFlags::HAS_LEADING_SPACE, self.leading_space);
        self.line_start = false;
        self.leading_space = false;
        flags
    }

    /// Return the next classified token; `Eof` once input is exhausted
    pub fn lex(&mut self, diag: &mut DiagnosticEngine) -> Token {
        loop {
            let Some(c) = self.peek(0) else {
                let mut token = Token::eof(self.location());
                token.set_has_leading_space(self.leading_space);
                return token;
            };
            match c {
                ' ' | '\t' | '\x0b' | '\x0c' => {
                    self.bump();
                    self.leading_space = true;
                }
                '\n' | '\r' => {
                    let location = self.location();
                    let flags = self.take_flags();
                    self.bump_newline();
                    self.line_start = true;
                    return Token::new(TokenKind::Newline, flags, location);
                }
                '/' if self.peek(1) == Some('/') => {
                    while let Some(c) = self.peek(0) {
                        if c == '\n' || c == '\r' {
                            break;
                        }
                        self.bump();
                    }
                    self.leading_space = true;
                }
                '/' if self.peek(1) == Some('*') => {
                    let location = self.location();
                    self.bump();
                    self.bump();
                    if !self.skip_block_comment() {
                        diag.report(DiagnosticId::EofInComment, location, "");
                    }
                    self.leading_space = true;
                }
                _ => return self.lex_token(c),
            }
        }
    }

    /// Skip to the end of a block comment; false when input ends first
    fn skip_block_comment(&mut self) -> bool {
        while let Some(c) = self.bump() {
            if c == '*' && self.peek(0) == Some('/') {
                self.bump();
                return true;
            }
        }
        false
    }

    fn lex_token(&mut self, c: char) -> Token {
        let location = self.location();
        let flags = self.take_flags();

        if c.is_ascii_alphabetic() || c == '_' {
            let text = self.take_while(|c| c.is_ascii_alphanumeric() || c == '_');
            return Token::new(TokenKind::Identifier(Symbol::new(&text)), flags, location);
        }

        if c.is_ascii_digit() || (c == '.' && self.peek(1).is_some_and(|d| d.is_ascii_digit())) {
            return self.lex_number(flags, location);
        }

        if c == '"' {
            return self.lex_string(flags, location);
        }

        // maximal munch over the punctuator table
        for len in (1..=3).rev() {
            let candidate: Option<String> = (0..len).map(|k| self.peek(k)).collect();
            if let Some(candidate) = candidate
                && let Some(kind) = TokenKind::from_punctuator(&candidate)
            {
                for _ in 0..len {
                    self.bump();
                }
                return Token::new(kind, flags, location);
            }
        }

        self.bump();
        Token::new(TokenKind::Invalid(c), flags, location)
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut text = String::new();
        while let Some(c) = self.peek(0) {
            if !pred(c) {
                break;
            }
            text.push(c);
            self.bump();
        }
        text
    }

    fn lex_number(&mut self, flags: TokenFlags, location: SourceLocation) -> Token {
        let mut text = String::new();
        while let Some(c) = self.peek(0) {
            let is_hex = text.starts_with("0x") || text.starts_with("0X");
            let exponent_sign = (c == '+' || c == '-')
                && !is_hex
                && text.ends_with(['e', 'E'])
                && self.peek(1).is_some_and(|d| d.is_ascii_digit());
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' || exponent_sign {
                text.push(c);
                self.bump();
            } else {
                break;
            }
        }

        let symbol = Symbol::new(&text);
        if is_int_literal(&text) {
            let mut token = Token::new(TokenKind::IntConstant(symbol), flags, location);
            if let Some(value) = parse_int_literal(&text) {
                token.value = TokenValue::Int(value);
            }
            token
        } else if is_float_literal(&text) {
            let mut token = Token::new(TokenKind::FloatConstant(symbol), flags, location);
            if let Some(value) = parse_float_literal(&text) {
                token.value = TokenValue::Float(value);
            }
            token
        } else {
            Token::new(TokenKind::PPNumber(symbol), flags, location)
        }
    }

    fn lex_string(&mut self, flags: TokenFlags, location: SourceLocation) -> Token {
        let mut text = String::new();
        text.push('"');
        self.bump();
        loop {
            match self.peek(0) {
                Some('"') => {
                    text.push('"');
                    self.bump();
                    return Token::new(TokenKind::StringLiteral(Symbol::new(&text)), flags, location);
                }
                Some('\n' | '\r') | None => {
                    return Token::new(TokenKind::UnterminatedString(Symbol::new(&text)), flags, location);
                }
                Some(c) => {
                    text.push(c);
                    self.bump();
                }
            }
        }
    }
}

fn strip_suffix_ci<'a>(text: &'a str, suffix: char) -> (&'a str, bool) {
    match text.strip_suffix(suffix).or_else(|| text.strip_suffix(suffix.to_ascii_uppercase())) {
        Some(body) => (body, true),
        None => (text, false),
    }
}

/// decimal `[1-9][0-9]*`, octal `0[0-7]*`, hex `0[xX][0-9a-fA-F]+`, each with an optional `u`
fn is_int_literal(text: &str) -> bool {
    let (body, _) = strip_suffix_ci(text, 'u');
    if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        return !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit());
    }
    if body.starts_with('0') {
        return body.chars().all(|c| ('0'..='7').contains(&c));
    }
    !body.is_empty() && body.chars().all(|c| c.is_ascii_digit())
}

/// Value of an integer literal, or `None` when it does not fit its type
fn parse_int_literal(text: &str) -> Option<i64> {
    let (body, unsigned) = strip_suffix_ci(text, 'u');
    let value = if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()?
    } else if body.len() > 1 && body.starts_with('0') {
        u64::from_str_radix(&body[1..], 8).ok()?
    } else {
        body.parse::<u64>().ok()?
    };
    let limit = if unsigned { u32::MAX as u64 } else { i32::MAX as u64 };
    (value <= limit).then_some(value as i64)
}

/// `digits exponent` or `fraction exponent?`, with an optional `f`
fn is_float_literal(text: &str) -> bool {
    let (body, _) = strip_suffix_ci(text, 'f');
    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(pos) => (&body[..pos], Some(&body[pos + 1..])),
        None => (body, None),
    };
    if let Some(exponent) = exponent {
        let digits = exponent.strip_prefix(['+', '-']).unwrap_or(exponent);
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }
    }
    match mantissa.split_once('.') {
        Some((whole, fraction)) => {
            (!whole.is_empty() || !fraction.is_empty())
                && whole.chars().all(|c| c.is_ascii_digit())
                && fraction.chars().all(|c| c.is_ascii_digit())
        }
        None => exponent.is_some() && !mantissa.is_empty() && mantissa.chars().all(|c| c.is_ascii_digit()),
    }
}

/// Value of a float literal, or `None` when it overflows single precision
fn parse_float_literal(text: &str) -> Option<f64> {
    let (body, _) = strip_suffix_ci(text, 'f');
    let value: f64 = body.parse().ok()?;
    (value as f32).is_finite().then_some(value)
}

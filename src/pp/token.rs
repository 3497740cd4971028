//! Token definitions shared by the tokenizer, the preprocessor and the parser.

use std::fmt;

use symbol_table::GlobalSymbol as Symbol;

pub use crate::source_manager::SourceLocation;

bitflags::bitflags! {
    /// Whitespace and expansion state attached to each token
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct TokenFlags: u8 {
        /// First token on a logical line; `#` is only a directive here
        const AT_START_OF_LINE = 1 << 0;
        /// Preceded by whitespace or a comment
        const HAS_LEADING_SPACE = 1 << 1;
        /// Names a macro that was being expanded when the token was produced; never expanded again
        const EXPANSION_DISABLED = 1 << 2;
        /// Produced by a macro expansion; `Token::spelling` holds the definition site
        const MACRO_EXPANDED = 1 << 3;
    }
}

/// Token kinds produced by the tokenizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Identifier(Symbol),
    IntConstant(Symbol),
    FloatConstant(Symbol),
    /// Anything that starts like a number but is not a valid literal
    PPNumber(Symbol),
    /// Quoted string including its quotes; only meaningful to `#include` and `#line`
    StringLiteral(Symbol),
    UnterminatedString(Symbol),

    // multi-character operators
    Increment,
    Decrement,
    LeftShift,
    RightShift,
    LessEqual,
    GreaterEqual,
    Equal,
    NotEqual,
    LogicAnd,
    LogicXor,
    LogicOr,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    PercentAssign,
    LeftShiftAssign,
    RightShiftAssign,
    AndAssign,
    XorAssign,
    OrAssign,

    // single-character punctuation
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    Dot,
    Comma,
    Colon,
    Semicolon,
    Question,
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Less,
    Greater,
    And,
    Or,
    Xor,
    Not,
    Tilde,
    Hash,

    Newline,
    Invalid(char),
    Eof,
}

impl TokenKind {
    /// Spelling of the token
    pub fn text(&self) -> &'static str {
        match self {
            TokenKind::Identifier(s)
            | TokenKind::IntConstant(s)
            | TokenKind::FloatConstant(s)
            | TokenKind::PPNumber(s)
            | TokenKind::StringLiteral(s)
            | TokenKind::UnterminatedString(s) => s.as_str(),
            TokenKind::Increment => "++",
            TokenKind::Decrement => "--",
            TokenKind::LeftShift => "<<",
            TokenKind::RightShift => ">>",
            TokenKind::LessEqual => "<=",
            TokenKind::GreaterEqual => ">=",
            TokenKind::Equal => "==",
            TokenKind::NotEqual => "!=",
            TokenKind::LogicAnd => "&&",
            TokenKind::LogicXor => "^^",
            TokenKind::LogicOr => "||",
            TokenKind::PlusAssign => "+=",
            TokenKind::MinusAssign => "-=",
            TokenKind::StarAssign => "*=",
            TokenKind::SlashAssign => "/=",
            TokenKind::PercentAssign => "%=",
            TokenKind::LeftShiftAssign => "<<=",
            TokenKind::RightShiftAssign => ">>=",
            TokenKind::AndAssign => "&=",
            TokenKind::XorAssign => "^=",
            TokenKind::OrAssign => "|=",
            TokenKind::LeftParen => "(",
            TokenKind::RightParen => ")",
            TokenKind::LeftBracket => "[",
            TokenKind::RightBracket => "]",
            TokenKind::LeftBrace => "{",
            TokenKind::RightBrace => "}",
            TokenKind::Dot => ".",
            TokenKind::Comma => ",",
            TokenKind::Colon => ":",
            TokenKind::Semicolon => ";",
            TokenKind::Question => "?",
            TokenKind::Assign => "=",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Less => "<",
            TokenKind::Greater => ">",
            TokenKind::And => "&",
            TokenKind::Or => "|",
            TokenKind::Xor => "^",
            TokenKind::Not => "!",
            TokenKind::Tilde => "~",
            TokenKind::Hash => "#",
            TokenKind::Newline => "\n",
            TokenKind::Invalid(_) => "<invalid>",
            TokenKind::Eof => "",
        }
    }

    /// Map a punctuator spelling back to its kind
    pub fn from_punctuator(text: &str) -> Option<TokenKind> {
        let kind = match text {
            "++" => TokenKind::Increment,
            "--" => TokenKind::Decrement,
            "<<" => TokenKind::LeftShift,
            ">>" => TokenKind::RightShift,
            "<=" => TokenKind::LessEqual,
            ">=" => TokenKind::GreaterEqual,
            "==" => TokenKind::Equal,
            "!=" => TokenKind::NotEqual,
            "&&" => TokenKind::LogicAnd,
            "^^" => TokenKind::LogicXor,
            "||" => TokenKind::LogicOr,
            "+=" => TokenKind::PlusAssign,
            "-=" => TokenKind::MinusAssign,
            "*=" => TokenKind::StarAssign,
            "/=" => TokenKind::SlashAssign,
            "%=" => TokenKind::PercentAssign,
            "<<=" => TokenKind::LeftShiftAssign,
            ">>=" => TokenKind::RightShiftAssign,
            "&=" => TokenKind::AndAssign,
            "^=" => TokenKind::XorAssign,
            "|=" => TokenKind::OrAssign,
            "(" => TokenKind::LeftParen,
            ")" => TokenKind::RightParen,
            "[" => TokenKind::LeftBracket,
            "]" => TokenKind::RightBracket,
            "{" => TokenKind::LeftBrace,
            "}" => TokenKind::RightBrace,
            "." => TokenKind::Dot,
            "," => TokenKind::Comma,
            ":" => TokenKind::Colon,
            ";" => TokenKind::Semicolon,
            "?" => TokenKind::Question,
            "=" => TokenKind::Assign,
            "+" => TokenKind::Plus,
            "-" => TokenKind::Minus,
            "*" => TokenKind::Star,
            "/" => TokenKind::Slash,
            "%" => TokenKind::Percent,
            "<" => TokenKind::Less,
            ">" => TokenKind::Greater,
            "&" => TokenKind::And,
            "|" => TokenKind::Or,
            "^" => TokenKind::Xor,
            "!" => TokenKind::Not,
            "~" => TokenKind::Tilde,
            "#" => TokenKind::Hash,
            _ => return None,
        };
        Some(kind)
    }

    pub fn is_identifier(&self) -> bool {
        matches!(self, TokenKind::Identifier(_))
    }

    pub fn identifier(&self) -> Option<Symbol> {
        match self {
            TokenKind::Identifier(s) => Some(*s),
            _ => None,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Invalid(c) => write!(f, "{}", c),
            TokenKind::Eof => write!(f, "<eof>"),
            TokenKind::Newline => write!(f, "<newline>"),
            _ => write!(f, "{}", self.text()),
        }
    }
}

/// Literal value parsed while tokenizing
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum TokenValue {
    #[default]
    None,
    Int(i64),
    Float(f64),
}

/// One classified lexical unit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub flags: TokenFlags,
    /// Point of use: for macro-expanded tokens, the location of the macro invocation
    pub location: SourceLocation,
    /// Where the token was spelled when it came out of a macro definition
    pub spelling: Option<SourceLocation>,
    pub value: TokenValue,
}

impl Token {
    pub fn new(kind: TokenKind, flags: TokenFlags, location: SourceLocation) -> Self {
        Token {
            kind,
            flags,
            location,
            spelling: None,
            value: TokenValue::None,
        }
    }

    pub fn eof(location: SourceLocation) -> Self {
        Token::new(TokenKind::Eof, TokenFlags::AT_START_OF_LINE, location)
    }

    pub fn text(&self) -> &'static str {
        self.kind.text()
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }

    pub fn at_start_of_line(&self) -> bool {
        self.flags.contains(TokenFlags::AT_START_OF_LINE)
    }

    pub fn has_leading_space(&self) -> bool {
        self.flags.contains(TokenFlags::HAS_LEADING_SPACE)
    }

    pub fn expansion_disabled(&self) -> bool {
        self.flags.contains(TokenFlags::EXPANSION_DISABLED)
    }

    pub fn set_has_leading_space(&mut self, value: bool) {
        self.flags.set(TokenFlags::HAS_LEADING_SPACE, value);
    }

    pub fn set_at_start_of_line(&mut self, value: bool) {
        self.flags.set(TokenFlags::AT_START_OF_LINE, value);
    }

    /// Same spelling and same separation from the previous token; used to compare macro bodies
    pub fn same_spelling(&self, other: &Token) -> bool {
        self.kind == other.kind && self.has_leading_space() == other.has_leading_space()
    }

    pub fn int_value(&self) -> Option<i64> {
        match self.value {
            TokenValue::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn float_value(&self) -> Option<f64> {
        match self.value {
            TokenValue::Float(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

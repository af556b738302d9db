//! Lexeme types.

use std::borrow::Cow;
use std::fmt;

/// The longest lexeme that can be scanned, in bytes.
pub const MAX_LEXEME_LENGTH: usize = 1000 + 5;

/// Length of the longest multi-byte special token (`<=>`, `-->`).
pub const LENGTH_OF_LONGEST_SPECIAL_LEXEME: usize = 3;

/// The kind of a lexeme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LexemeKind {
    Eof,
    Identifier,
    Variable,
    StrConstant,
    IntConstant,
    FloatConstant,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Plus,
    Minus,
    RightArrow,
    Greater,
    Less,
    Equal,
    LessEqual,
    GreaterEqual,
    NotEqual,
    LessEqualGreater,
    LessLess,
    GreaterGreater,
    Ampersand,
    At,
    Tilde,
    UpArrow,
    ExclamationPoint,
    Comma,
    Period,
    QuotedString,
}

impl LexemeKind {
    /// Kinds that name a symbol rather than a piece of punctuation.
    pub fn is_symbolic(self) -> bool {
        matches!(
            self,
            LexemeKind::Identifier
                | LexemeKind::Variable
                | LexemeKind::StrConstant
                | LexemeKind::IntConstant
                | LexemeKind::FloatConstant
        )
    }
}

/// Numeric or identifier payload of a lexeme.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LexemeValue {
    Integer(i64),
    Float(f64),
    Identifier { letter: char, number: u64 },
}

/// One classified unit of source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Lexeme {
    pub kind: LexemeKind,
    pub(super) text: Vec<u8>,
    pub value: Option<LexemeValue>,
    /// Whether printing `text` and lexing it again yields this same lexeme.
    pub rereadable: bool,
    pub line: usize,
    pub column: usize,
}

impl Default for Lexeme {
    fn default() -> Self {
        Lexeme {
            kind: LexemeKind::Eof,
            text: Vec::with_capacity(MAX_LEXEME_LENGTH),
            value: None,
            rereadable: false,
            line: 1,
            column: 1,
        }
    }
}

impl Lexeme {
    /// Raw bytes of the lexeme. Quoted lexemes exclude their delimiters and escapes.
    pub fn text(&self) -> &[u8] {
        &self.text
    }

    pub fn text_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.text)
    }

    pub fn int_value(&self) -> Option<i64> {
        match self.value {
            Some(LexemeValue::Integer(v)) => Some(v),
            _ => None,
        }
    }

    pub fn float_value(&self) -> Option<f64> {
        match self.value {
            Some(LexemeValue::Float(v)) => Some(v),
            _ => None,
        }
    }

    /// The (letter, number) pair of an identifier lexeme.
    pub fn identifier(&self) -> Option<(char, u64)> {
        match self.value {
            Some(LexemeValue::Identifier { letter, number }) => Some((letter, number)),
            _ => None,
        }
    }

    pub(super) fn reset(&mut self, line: usize, column: usize) {
        self.kind = LexemeKind::Eof;
        self.text.clear();
        self.value = None;
        self.rereadable = false;
        self.line = line;
        self.column = column;
    }
}

impl fmt::Display for Lexeme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Some(LexemeValue::Integer(v)) => write!(f, "{:?} {}", self.kind, v),
            Some(LexemeValue::Float(v)) => write!(f, "{:?} {}", self.kind, v),
            Some(LexemeValue::Identifier { letter, number }) => {
                write!(f, "{:?} {}{}", self.kind, letter, number)
            }
            None if self.kind == LexemeKind::Eof => write!(f, "{:?}", self.kind),
            None => write!(f, "{:?} {:?}", self.kind, self.text_lossy()),
        }
    }
}

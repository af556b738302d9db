//! Byte classification tables for the lexer.
//!
//! The tables are computed once per process and never change afterwards.
//! Every `Lexer` goes through [init] before it reads its first byte,
//! so concurrent first use from independent lexers is safe.

use std::sync::OnceLock;

use super::token::LexemeKind;

/// Bytes, beyond ASCII alphanumerics, that may appear inside a symbol.
const EXTRA_CONSTITUENTS: &[u8] = b"$%&*+-/:<=>?_@";

/// How the lexer proceeds when a lexeme starts with a given byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LexRule {
    /// A token that is always exactly one byte long.
    Single(LexemeKind),
    LParen,
    RParen,
    /// `@`: a token of its own, or the start of an identifier.
    At,
    Equal,
    Ampersand,
    Greater,
    Less,
    Period,
    Plus,
    Minus,
    Digit,
    VBar,
    Quote,
    Constituent,
    /// Not the start of any lexeme; skipped silently.
    Unknown,
}

pub(crate) struct Tables {
    constituent: [bool; 256],
    whitespace: [bool; 256],
    number_starter: [bool; 256],
    rules: [LexRule; 256],
}

impl Tables {
    fn build() -> Self {
        let mut tables = Tables {
            constituent: [false; 256],
            whitespace: [false; 256],
            number_starter: [false; 256],
            rules: [LexRule::Unknown; 256],
        };
        for b in 0..=u8::MAX {
            let i = b as usize;
            tables.constituent[i] = b.is_ascii_alphanumeric() || EXTRA_CONSTITUENTS.contains(&b);
            // C's isspace() includes vertical tab, which is_ascii_whitespace() does not.
            tables.whitespace[i] = b.is_ascii_whitespace() || b == 0x0b;
            tables.number_starter[i] = b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.');
        }
        for b in 0..=u8::MAX {
            tables.rules[b as usize] = tables.rule_for(b);
        }
        tables
    }

    fn rule_for(&self, b: u8) -> LexRule {
        match b {
            b'~' => LexRule::Single(LexemeKind::Tilde),
            b'^' => LexRule::Single(LexemeKind::UpArrow),
            b'{' => LexRule::Single(LexemeKind::LBrace),
            b'}' => LexRule::Single(LexemeKind::RBrace),
            b'!' => LexRule::Single(LexemeKind::ExclamationPoint),
            b',' => LexRule::Single(LexemeKind::Comma),
            b'(' => LexRule::LParen,
            b')' => LexRule::RParen,
            b'@' => LexRule::At,
            b'=' => LexRule::Equal,
            b'&' => LexRule::Ampersand,
            b'>' => LexRule::Greater,
            b'<' => LexRule::Less,
            b'.' => LexRule::Period,
            b'+' => LexRule::Plus,
            b'-' => LexRule::Minus,
            b'|' => LexRule::VBar,
            b'"' => LexRule::Quote,
            b'0'..=b'9' => LexRule::Digit,
            _ if self.constituent[b as usize] => LexRule::Constituent,
            _ => LexRule::Unknown,
        }
    }

    #[inline]
    pub fn is_constituent(&self, b: u8) -> bool {
        self.constituent[b as usize]
    }

    #[inline]
    pub fn is_whitespace(&self, b: u8) -> bool {
        self.whitespace[b as usize]
    }

    #[inline]
    pub fn is_number_starter(&self, b: u8) -> bool {
        self.number_starter[b as usize]
    }

    #[inline]
    pub fn rule(&self, b: u8) -> LexRule {
        self.rules[b as usize]
    }
}

static TABLES: OnceLock<Tables> = OnceLock::new();

/// Build the classification tables, if that has not happened yet.
///
/// Safe to call any number of times, from any thread.
pub fn init() {
    tables();
}

pub(crate) fn tables() -> &'static Tables {
    TABLES.get_or_init(Tables::build)
}

/// Is the byte allowed inside a multi-byte symbol?
pub fn is_constituent(b: u8) -> bool {
    tables().is_constituent(b)
}

pub fn is_whitespace(b: u8) -> bool {
    tables().is_whitespace(b)
}

/// Could the byte begin a number?
pub fn is_number_starter(b: u8) -> bool {
    tables().is_number_starter(b)
}

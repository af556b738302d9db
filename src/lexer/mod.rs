//! Lexer for production-rule source text.
//!
//! The lexer is pull-based: each call to [Lexer::next_lexeme] scans exactly one
//! lexeme and overwrites the previous one. There is no token history.
//!
//! Whitespace, `;` and `#` line comments separate lexemes.
//! Bytes that cannot start any lexeme are skipped without complaint.
//!
//! Problems found while scanning are reported as [Diagnostic]s.
//! Most are advisory: a number that overflows still produces a number lexeme,
//! with value zero. The exception is a quoted literal with no closing
//! delimiter (or a lexeme longer than [MAX_LEXEME_LENGTH]): the lexer reports
//! it, detaches from the input and produces end-of-input from then on.

mod classify;
pub mod tables;
mod token;


pub use classify::{possible_symbol_types, PossibleTypes};
pub use token::{
    Lexeme, LexemeKind, LexemeValue, LENGTH_OF_LONGEST_SPECIAL_LEXEME, MAX_LEXEME_LENGTH,
};

use std::fmt;

use tables::{tables, LexRule};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// A message about the input, with the position of the lexeme it concerns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(
            f,
            "{} at line {} column {}: {}",
            severity, self.line, self.column, self.message
        )
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LexerOptions {
    /// Warn about string constants that look like malformed variables.
    pub print_warnings: bool,
}

impl Default for LexerOptions {
    fn default() -> Self {
        LexerOptions {
            print_warnings: true,
        }
    }
}

/// A scan that cannot continue; the lexer substitutes end-of-input.
#[derive(Debug)]
enum Fatal {
    TooLong,
    Unterminated(u8),
}

impl fmt::Display for Fatal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fatal::TooLong => write!(f, "lexeme longer than {} bytes", MAX_LEXEME_LENGTH),
            Fatal::Unterminated(d) => {
                write!(f, "opening '{}' without closing '{}'", *d as char, *d as char)
            }
        }
    }
}

type Scan = Result<(), Fatal>;

pub struct Lexer {
    input: Vec<u8>,
    /// Offset of the byte after `current`.
    pos: usize,
    current: Option<u8>,
    line: usize,
    column: usize,

    lexeme: Lexeme,
    paren_depth: u32,
    allow_ids: bool,

    options: LexerOptions,
    diagnostics: Vec<Diagnostic>,
}

impl Default for Lexer {
    fn default() -> Self {
        Lexer::new()
    }
}

impl Lexer {
    pub fn new() -> Self {
        Self::with_options(LexerOptions::default())
    }

    pub fn with_options(options: LexerOptions) -> Self {
        tables::init();
        Lexer {
            input: Vec::new(),
            pos: 0,
            current: None,
            line: 1,
            column: 1,
            lexeme: Lexeme::default(),
            paren_depth: 0,
            allow_ids: true,
            options,
            diagnostics: Vec::new(),
        }
    }

    /// Start scanning `text`, discarding everything about the previous input.
    ///
    /// The identifier mode and options are kept.
    pub fn attach(&mut self, text: impl Into<Vec<u8>>) {
        self.input = text.into();
        self.pos = 0;
        self.current = None;
        self.line = 1;
        self.column = 1;
        self.paren_depth = 0;
        self.lexeme.reset(1, 1);
        self.diagnostics.clear();
        self.current = self.input.first().copied();
        if self.current.is_some() {
            self.pos = 1;
        }
    }

    /// Drop the input buffer. Every following lexeme is end-of-input.
    pub fn detach(&mut self) {
        self.input = Vec::new();
        self.pos = 0;
        self.current = None;
    }

    pub fn set_allow_identifiers(&mut self, allow: bool) {
        self.allow_ids = allow;
    }

    pub fn allow_identifiers(&self) -> bool {
        self.allow_ids
    }

    pub fn options(&self) -> &LexerOptions {
        &self.options
    }

    /// The most recently scanned lexeme.
    pub fn lexeme(&self) -> &Lexeme {
        &self.lexeme
    }

    /// Levels of parentheses open at this point in the input.
    pub fn current_paren_depth(&self) -> u32 {
        self.paren_depth
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Scan the next lexeme from the input.
    pub fn next_lexeme(&mut self) -> &Lexeme {
        if let Err(fatal) = self.lex() {
            let (line, column) = (self.lexeme.line, self.lexeme.column);
            self.diagnose(Severity::Error, fatal.to_string());
            self.lexeme.reset(line, column);
            self.detach();
        }
        tracing::trace!("read lexeme {}", self.lexeme);
        &self.lexeme
    }

    /// Consume lexemes until end-of-input, or until the current lexeme is a
    /// right parenthesis that closes back to `depth`.
    ///
    /// A depth of 0 skips to the end of the current top-level form.
    pub fn skip_to_balanced_paren(&mut self, depth: u32) {
        loop {
            match self.lexeme.kind {
                LexemeKind::Eof => return,
                LexemeKind::RParen if self.paren_depth == depth => return,
                _ => {}
            }
            self.next_lexeme();
        }
    }

    fn advance(&mut self) {
        match self.current {
            None => return,
            Some(b'\n') => {
                self.line += 1;
                self.column = 1;
            }
            Some(_) => self.column += 1,
        }
        self.current = self.input.get(self.pos).copied();
        if self.current.is_some() {
            self.pos += 1;
        }
    }

    fn store_and_advance(&mut self) -> Scan {
        let Some(b) = self.current else {
            return Ok(());
        };
        if self.lexeme.text.len() >= MAX_LEXEME_LENGTH {
            return Err(Fatal::TooLong);
        }
        self.lexeme.text.push(b);
        self.advance();
        Ok(())
    }

    fn diagnose(&mut self, severity: Severity, message: String) {
        let diagnostic = Diagnostic {
            severity,
            message,
            line: self.lexeme.line,
            column: self.lexeme.column,
        };
        match severity {
            Severity::Warning => tracing::warn!("{}", diagnostic),
            Severity::Error => tracing::error!("{}", diagnostic),
        }
        self.diagnostics.push(diagnostic);
    }

    fn skip_whitespace_and_comments(&mut self) {
        let t = tables();
        while let Some(b) = self.current {
            if t.is_whitespace(b) || b == b';' {
                self.advance();
            } else if b == b'#' {
                while !matches!(self.current, None | Some(b'\n')) {
                    self.advance();
                }
                self.advance();
            } else {
                break;
            }
        }
    }

    fn lex(&mut self) -> Scan {
        loop {
            self.skip_whitespace_and_comments();
            self.lexeme.reset(self.line, self.column);
            let Some(b) = self.current else {
                return Ok(());
            };

            return match tables().rule(b) {
                LexRule::Unknown => {
                    self.advance();
                    continue;
                }
                LexRule::Single(kind) => {
                    self.store_and_advance()?;
                    self.lexeme.kind = kind;
                    Ok(())
                }
                LexRule::LParen => {
                    self.store_and_advance()?;
                    self.lexeme.kind = LexemeKind::LParen;
                    self.paren_depth += 1;
                    Ok(())
                }
                LexRule::RParen => {
                    self.store_and_advance()?;
                    self.lexeme.kind = LexemeKind::RParen;
                    self.paren_depth = self.paren_depth.saturating_sub(1);
                    Ok(())
                }
                LexRule::At => self.lex_at(),
                LexRule::Equal => self.lex_operator_or_symbol(LexemeKind::Equal),
                LexRule::Ampersand => self.lex_operator_or_symbol(LexemeKind::Ampersand),
                LexRule::Greater => self.lex_greater(),
                LexRule::Less => self.lex_less(),
                LexRule::Period => self.lex_period(),
                LexRule::Plus => self.lex_sign(LexemeKind::Plus),
                LexRule::Minus => self.lex_sign(LexemeKind::Minus),
                LexRule::Digit => {
                    self.read_constituent_run()?;
                    self.read_float_tail_if_numeric()?;
                    self.classify_run();
                    Ok(())
                }
                LexRule::VBar => self.lex_quoted(b'|', LexemeKind::StrConstant),
                LexRule::Quote => self.lex_quoted(b'"', LexemeKind::QuotedString),
                LexRule::Constituent => {
                    self.read_constituent_run()?;
                    self.classify_run();
                    Ok(())
                }
            };
        }
    }

    fn read_constituent_run(&mut self) -> Scan {
        let t = tables();
        while let Some(b) = self.current {
            if !t.is_constituent(b) {
                break;
            }
            self.store_and_advance()?;
        }
        Ok(())
    }

    fn read_digits(&mut self) -> Scan {
        while matches!(self.current, Some(b) if b.is_ascii_digit()) {
            self.store_and_advance()?;
        }
        Ok(())
    }

    /// Read the digits after a decimal point, and an optional exponent.
    fn read_fraction_and_exponent(&mut self) -> Scan {
        self.read_digits()?;
        if matches!(self.current, Some(b'e' | b'E')) {
            self.store_and_advance()?;
            if matches!(self.current, Some(b'+' | b'-')) {
                self.store_and_advance()?;
            }
            self.read_digits()?;
        }
        Ok(())
    }

    /// A run that stopped at '.' may be the integer part of a float.
    fn read_float_tail_if_numeric(&mut self) -> Scan {
        let integer_part = self.lexeme.text.iter().skip(1).all(u8::is_ascii_digit);
        if self.current == Some(b'.') && integer_part {
            self.store_and_advance()?;
            self.read_fraction_and_exponent()?;
        }
        Ok(())
    }

    fn classify_run(&mut self) {
        let c = classify::classify(
            &self.lexeme.text,
            self.allow_ids,
            self.options.print_warnings,
        );
        self.lexeme.kind = c.kind;
        self.lexeme.value = c.value;
        self.lexeme.rereadable = c.rereadable;
        if let Some((severity, message)) = c.complaint {
            self.diagnose(severity, message);
        }
    }

    /// `=` and `&` alone are operators; longer runs are symbols.
    fn lex_operator_or_symbol(&mut self, operator: LexemeKind) -> Scan {
        self.read_constituent_run()?;
        if self.lexeme.text.len() == 1 {
            self.lexeme.kind = operator;
        } else {
            self.classify_run();
        }
        Ok(())
    }

    /// `@` starts an identifier when identifiers are enabled and the run has
    /// that shape. Anything else leaves `@` as a token of its own.
    fn lex_at(&mut self) -> Scan {
        if self.allow_ids {
            let t = tables();
            let start = self.pos - 1;
            let run = self.input[start..]
                .iter()
                .take_while(|&&b| t.is_constituent(b))
                .count();
            if classify::is_identifier(&self.input[start..start + run]) {
                self.read_constituent_run()?;
                self.classify_run();
                return Ok(());
            }
        }
        self.store_and_advance()?;
        self.lexeme.kind = LexemeKind::At;
        Ok(())
    }

    fn lex_greater(&mut self) -> Scan {
        self.read_constituent_run()?;
        self.lexeme.kind = match self.lexeme.text.as_slice() {
            b">" => LexemeKind::Greater,
            b">>" => LexemeKind::GreaterGreater,
            b">=" => LexemeKind::GreaterEqual,
            _ => {
                self.classify_run();
                return Ok(());
            }
        };
        Ok(())
    }

    fn lex_less(&mut self) -> Scan {
        self.read_constituent_run()?;
        self.lexeme.kind = match self.lexeme.text.as_slice() {
            b"<" => LexemeKind::Less,
            b"<>" => LexemeKind::NotEqual,
            b"<=" => LexemeKind::LessEqual,
            b"<<" => LexemeKind::LessLess,
            b"<=>" => LexemeKind::LessEqualGreater,
            _ => {
                self.classify_run();
                return Ok(());
            }
        };
        Ok(())
    }

    fn lex_period(&mut self) -> Scan {
        self.store_and_advance()?;
        if matches!(self.current, Some(b) if b.is_ascii_digit()) {
            self.read_fraction_and_exponent()?;
        }
        if self.lexeme.text.len() == 1 {
            self.lexeme.kind = LexemeKind::Period;
        } else {
            self.classify_run();
        }
        Ok(())
    }

    /// `+` or `-`: an operator, a signed number, `-->`, or a symbol.
    fn lex_sign(&mut self, operator: LexemeKind) -> Scan {
        self.read_constituent_run()?;
        self.read_float_tail_if_numeric()?;
        match self.lexeme.text.as_slice() {
            [_] => self.lexeme.kind = operator,
            b"-->" => self.lexeme.kind = LexemeKind::RightArrow,
            _ => self.classify_run(),
        }
        Ok(())
    }

    /// Bytes up to the closing `delimiter`; a backslash escapes the next byte.
    fn lex_quoted(&mut self, delimiter: u8, kind: LexemeKind) -> Scan {
        self.lexeme.kind = kind;
        self.advance();
        loop {
            let Some(b) = self.current else {
                return Err(Fatal::Unterminated(delimiter));
            };
            if self.lexeme.text.len() == MAX_LEXEME_LENGTH {
                return Err(Fatal::Unterminated(delimiter));
            }
            if b == delimiter {
                self.advance();
                return Ok(());
            }
            if b == b'\\' {
                self.advance();
                let Some(escaped) = self.current else {
                    return Err(Fatal::Unterminated(delimiter));
                };
                self.lexeme.text.push(escaped);
            } else {
                self.lexeme.text.push(b);
            }
            self.advance();
        }
    }
}

impl Iterator for Lexer {
    type Item = Lexeme;

    /// Lexemes up to, not including, end-of-input.
    fn next(&mut self) -> Option<Self::Item> {
        let lexeme = self.next_lexeme();
        if lexeme.kind == LexemeKind::Eof {
            None
        } else {
            Some(lexeme.clone())
        }
    }
}

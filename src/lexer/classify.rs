//! Deciding what kind of symbol a string of bytes could name.

use super::tables;
use super::token::{LexemeKind, LexemeValue, LENGTH_OF_LONGEST_SPECIAL_LEXEME};
use super::Severity;

mod patterns {
    use regex::bytes::Regex;
    use std::sync::OnceLock;

    pub(super) fn integer() -> &'static Regex {
        static MATCH: OnceLock<Regex> = OnceLock::new();
        MATCH.get_or_init(|| {
            Regex::new(r"\A[+-]?[0-9]+\z").expect("could not compile regex for integer")
        })
    }

    pub(super) fn float() -> &'static Regex {
        static MATCH: OnceLock<Regex> = OnceLock::new();
        MATCH.get_or_init(|| {
            // After a sign the mantissa may have no digits at all ("+.",
            // "-.e5"), and reads as zero. The exponent may be left dangling
            // ("1.5e"), in which case it is ignored.
            Regex::new(r"\A(?:[+-][0-9]*\.[0-9]*|[0-9]+\.[0-9]*|\.[0-9]+)(?:[eE][+-]?[0-9]*)?\z")
                .expect("could not compile regex for float")
        })
    }

    pub(super) fn identifier() -> &'static Regex {
        static MATCH: OnceLock<Regex> = OnceLock::new();
        MATCH.get_or_init(|| {
            // A leading '@' marks a long-term identifier.
            Regex::new(r"\A@?[A-Za-z][0-9]+\z").expect("could not compile regex for identifier")
        })
    }
}

/// The kinds of symbol a string could be read as.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PossibleTypes {
    pub identifier: bool,
    pub variable: bool,
    pub str_constant: bool,
    pub int_constant: bool,
    pub float_constant: bool,
    /// Lexing the string back yields a symbol with exactly the same name,
    /// rather than a special token or a case-normalized identifier.
    pub rereadable: bool,
}

/// Work out which kinds of symbol `text` could represent.
pub fn possible_symbol_types(text: &[u8]) -> PossibleTypes {
    let mut possible = PossibleTypes::default();
    let (Some(&first), Some(&last)) = (text.first(), text.last()) else {
        return possible;
    };

    possible.int_constant = patterns::integer().is_match(text);
    possible.float_constant = patterns::float().is_match(text);

    if !text.iter().all(|&b| tables::is_constituent(b)) {
        return possible;
    }

    // A leading '@' lexes as its own token unless it starts an identifier.
    possible.rereadable = first != b'@'
        && (text.iter().all(u8::is_ascii_alphanumeric)
            || text.len() > LENGTH_OF_LONGEST_SPECIAL_LEXEME
            || text == b"*");
    possible.str_constant = true;
    possible.variable = first == b'<' && last == b'>';
    possible.identifier = patterns::identifier().is_match(text);
    possible
}

/// Does `text` have the shape of an identifier, with or without a leading '@'?
pub(super) fn is_identifier(text: &[u8]) -> bool {
    patterns::identifier().is_match(text)
}

/// Result of classifying a scanned run.
#[derive(Debug, PartialEq)]
pub(super) struct Classified {
    pub kind: LexemeKind,
    pub value: Option<LexemeValue>,
    pub rereadable: bool,
    /// Advisory problem found while classifying; never changes `kind`.
    pub complaint: Option<(Severity, String)>,
}

impl Classified {
    fn new(kind: LexemeKind, possible: &PossibleTypes) -> Self {
        Classified {
            kind,
            value: None,
            rereadable: possible.rereadable,
            complaint: None,
        }
    }

    fn with_value(mut self, value: LexemeValue) -> Self {
        self.value = Some(value);
        self
    }

    fn complain(mut self, severity: Severity, message: impl Into<String>) -> Self {
        self.complaint = Some((severity, message.into()));
        self
    }
}

/// Classify an already-scanned run of bytes.
pub(super) fn classify(text: &[u8], allow_ids: bool, print_warnings: bool) -> Classified {
    let possible = possible_symbol_types(text);

    if possible.variable {
        return Classified::new(LexemeKind::Variable, &possible);
    }

    if possible.int_constant {
        let c = Classified::new(LexemeKind::IntConstant, &possible);
        return match parse_integer(text) {
            Some(v) => c.with_value(LexemeValue::Integer(v)),
            None => c
                .with_value(LexemeValue::Integer(0))
                .complain(Severity::Error, "bad integer (probably too large)"),
        };
    }

    if possible.float_constant {
        let c = Classified::new(LexemeKind::FloatConstant, &possible);
        return match parse_float(text) {
            Some(v) => c.with_value(LexemeValue::Float(v)),
            None => c
                .with_value(LexemeValue::Float(0.0))
                .complain(Severity::Error, "bad floating point number"),
        };
    }

    if allow_ids && possible.identifier {
        let digits = if text[0] == b'@' { &text[2..] } else { &text[1..] };
        let letter = (text[text.len() - digits.len() - 1] as char).to_ascii_uppercase();
        let c = Classified::new(LexemeKind::Identifier, &possible);
        return match parse_ascii::<u64>(digits) {
            Some(number) => c.with_value(LexemeValue::Identifier { letter, number }),
            None => c
                .with_value(LexemeValue::Identifier { letter, number: 0 })
                .complain(
                    Severity::Error,
                    "bad number for identifier (probably too large)",
                ),
        };
    }

    if possible.str_constant {
        let c = Classified::new(LexemeKind::StrConstant, &possible);
        let suspicious = text.first() == Some(&b'<') || text.last() == Some(&b'>');
        if print_warnings && suspicious {
            let message = format!(
                "suspicious string constant \"{}\"",
                String::from_utf8_lossy(text)
            );
            return c.complain(Severity::Warning, message);
        }
        return c;
    }

    Classified::new(LexemeKind::QuotedString, &possible)
}

fn parse_ascii<T: std::str::FromStr>(text: &[u8]) -> Option<T> {
    std::str::from_utf8(text).ok()?.parse().ok()
}

fn parse_integer(text: &[u8]) -> Option<i64> {
    parse_ascii(text)
}

fn parse_float(text: &[u8]) -> Option<f64> {
    let s = std::str::from_utf8(text).ok()?;
    let exponent = s.find(['e', 'E']);
    let mantissa = &s[..exponent.unwrap_or(s.len())];
    if !mantissa.bytes().any(|b| b.is_ascii_digit()) {
        return Some(0.0);
    }
    // A dangling exponent marker ("2.5e", "2.5e-") contributes nothing.
    let s = match exponent {
        Some(i) if !s[i + 1..].bytes().any(|b| b.is_ascii_digit()) => mantissa,
        _ => s,
    };
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

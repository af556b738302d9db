use std::fmt;

/// The kind of thing a symbol names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SymbolType {
    Variable,
    Identifier,
    StrConstant,
    IntConstant,
    FloatConstant,
}

/// A handle to an entry in a [super::SymbolTable]: slot index plus type tag.
///
/// Handles are plain values. Holding one says nothing about ownership;
/// reference counts are adjusted explicitly through the table.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol {
    pub(super) idx: u32,
    pub(super) tag: SymbolType,
}

impl Symbol {
    pub fn symbol_type(&self) -> SymbolType {
        self.tag
    }

    #[inline]
    pub fn is_variable(&self) -> bool {
        self.tag == SymbolType::Variable
    }

    #[inline]
    pub fn is_identifier(&self) -> bool {
        self.tag == SymbolType::Identifier
    }

    #[inline]
    pub fn is_constant(&self) -> bool {
        matches!(
            self.tag,
            SymbolType::StrConstant | SymbolType::IntConstant | SymbolType::FloatConstant
        )
    }

    #[inline]
    pub(super) fn idx(&self) -> usize {
        self.idx as usize
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.tag {
            SymbolType::Variable => "var",
            SymbolType::Identifier => "id",
            SymbolType::StrConstant => "str",
            SymbolType::IntConstant => "i64",
            SymbolType::FloatConstant => "f64",
        };
        write!(f, "{}#{}", tag, self.idx)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Symbol")
            .field("idx", &self.idx)
            .field("tag", &self.tag)
            .finish()
    }
}

/// The contents of a symbol, borrowed from the table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SymbolValue<'a> {
    Variable(&'a str),
    Identifier { letter: char, number: u64 },
    StrConstant(&'a str),
    Integer(i64),
    Float(f64),
}

impl SymbolValue<'_> {
    pub fn symbol_type(&self) -> SymbolType {
        match self {
            SymbolValue::Variable(_) => SymbolType::Variable,
            SymbolValue::Identifier { .. } => SymbolType::Identifier,
            SymbolValue::StrConstant(_) => SymbolType::StrConstant,
            SymbolValue::Integer(_) => SymbolType::IntConstant,
            SymbolValue::Float(_) => SymbolType::FloatConstant,
        }
    }
}

impl fmt::Display for SymbolValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolValue::Variable(name) | SymbolValue::StrConstant(name) => f.write_str(name),
            SymbolValue::Identifier { letter, number } => write!(f, "{}{}", letter, number),
            SymbolValue::Integer(v) => write!(f, "{}", v),
            // Debug keeps the decimal point, so "3.0" does not read back as an integer.
            SymbolValue::Float(v) => write!(f, "{:?}", v),
        }
    }
}

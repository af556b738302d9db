//! Symbol storage for productions.
//!
//! Every symbol a production mentions lives in one [SymbolTable] slot:
//! - variables and string constants, whose names are interned
//! - integer and float constants
//! - identifiers, named by a letter and a number
//!
//! Lookup is find-or-create, so equal symbols share a slot and a handle.
//! Each slot carries an explicit reference count. Callers that keep a
//! [Symbol] must hold a counted reference for it, and give it back with
//! [SymbolTable::remove_ref]. When a count reaches zero the slot is freed
//! and becomes available to the next new symbol; a handle kept past that
//! point is stale, and may name whatever symbol reuses the slot.
//!
//! Slots also carry a transitive-closure mark, so a traversal can visit each
//! symbol at most once without a separate visited set.

mod bitset;

use std::collections::HashMap;
mod objects;
pub use objects::*;

use string_interner::{DefaultStringInterner, DefaultSymbol};

use self::bitset::BitSet;
use crate::lexer::possible_symbol_types;

/// Identifies one transitive-closure traversal.
pub type TcNumber = u64;

/// Hashable contents of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Key {
    Variable(DefaultSymbol),
    StrConstant(DefaultSymbol),
    Integer(i64),
    /// Bit pattern of the value, so the key can be hashed.
    Float(u64),
    Identifier(char, u64),
}

impl Key {
    fn tag(&self) -> SymbolType {
        match self {
            Key::Variable(_) => SymbolType::Variable,
            Key::StrConstant(_) => SymbolType::StrConstant,
            Key::Integer(_) => SymbolType::IntConstant,
            Key::Float(_) => SymbolType::FloatConstant,
            Key::Identifier(..) => SymbolType::Identifier,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    key: Key,
    refcount: u32,
    tc_num: TcNumber,
}

#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub struct SymbolTableStats {
    /// Live symbols.
    pub symbols: usize,
    /// Slots allocated, live or free.
    pub slots: usize,
    /// Distinct names ever interned.
    pub names: usize,
}

/// Reference-counted, find-or-create storage for symbols.
#[derive(Default)]
pub struct SymbolTable {
    entries: Vec<Option<Entry>>,
    occupied: BitSet,
    index: HashMap<Key, u32>,

    names: DefaultStringInterner,

    last_tc: TcNumber,
    high_water: SymbolTableStats,
}

impl SymbolTable {
    pub fn new() -> Self {
        Default::default()
    }

    /// Find or create a variable. The name includes its angle brackets.
    pub fn make_variable(&mut self, name: &str) -> Symbol {
        let key = Key::Variable(self.names.get_or_intern(name));
        self.find_or_make(key)
    }

    pub fn make_str_constant(&mut self, name: &str) -> Symbol {
        let key = Key::StrConstant(self.names.get_or_intern(name));
        self.find_or_make(key)
    }

    pub fn make_int_constant(&mut self, value: i64) -> Symbol {
        self.find_or_make(Key::Integer(value))
    }

    pub fn make_float_constant(&mut self, value: f64) -> Symbol {
        self.find_or_make(Key::Float(value.to_bits()))
    }

    /// Find or create an identifier. The letter is stored upper-cased.
    pub fn make_identifier(&mut self, letter: char, number: u64) -> Symbol {
        self.find_or_make(Key::Identifier(letter.to_ascii_uppercase(), number))
    }

    /// Returns a handle with one new reference on it.
    fn find_or_make(&mut self, key: Key) -> Symbol {
        if let Some(&idx) = self.index.get(&key) {
            let sym = Symbol { idx, tag: key.tag() };
            self.add_ref(sym);
            return sym;
        }

        let idx = self.occupied.claim();
        if idx >= self.entries.len() {
            self.entries.resize(idx + 1, None);
        }
        self.entries[idx] = Some(Entry {
            key,
            refcount: 1,
            tc_num: 0,
        });
        let idx = idx as u32;
        self.index.insert(key, idx);

        let sym = Symbol { idx, tag: key.tag() };
        tracing::trace!("new symbol {} for {:?}", sym, key);
        self.update_high_water();
        sym
    }

    fn update_high_water(&mut self) {
        let current = self.stats();
        self.high_water.symbols = self.high_water.symbols.max(current.symbols);
        self.high_water.slots = self.high_water.slots.max(current.slots);
        self.high_water.names = self.high_water.names.max(current.names);
    }

    fn entry(&self, sym: Symbol) -> Option<&Entry> {
        self.entries
            .get(sym.idx())
            .and_then(Option::as_ref)
            .filter(|e| e.key.tag() == sym.tag)
    }

    fn entry_mut(&mut self, sym: Symbol) -> Option<&mut Entry> {
        self.entries
            .get_mut(sym.idx())
            .and_then(Option::as_mut)
            .filter(|e| e.key.tag() == sym.tag)
    }

    /// Take another reference to a live symbol.
    pub fn add_ref(&mut self, sym: Symbol) {
        match self.entry_mut(sym) {
            Some(entry) => {
                entry.refcount += 1;
                tracing::trace!("add_ref {} -> {}", sym, entry.refcount);
            }
            None => tracing::error!("add_ref on dead symbol {}", sym),
        }
    }

    /// Give back a reference. Returns true if this freed the symbol.
    pub fn remove_ref(&mut self, sym: Symbol) -> bool {
        let Some(entry) = self.entry_mut(sym) else {
            tracing::error!("remove_ref on dead symbol {}", sym);
            return false;
        };
        entry.refcount -= 1;
        tracing::trace!("remove_ref {} -> {}", sym, entry.refcount);
        if entry.refcount > 0 {
            return false;
        }

        let key = entry.key;
        self.index.remove(&key);
        self.entries[sym.idx()] = None;
        self.occupied.release(sym.idx());
        tracing::trace!("freed symbol {}", sym);
        true
    }

    /// Current reference count; zero for a dead handle.
    pub fn ref_count(&self, sym: Symbol) -> u32 {
        self.entry(sym).map(|e| e.refcount).unwrap_or(0)
    }

    pub fn is_live(&self, sym: Symbol) -> bool {
        self.entry(sym).is_some()
    }

    /// Number of live symbols.
    pub fn len(&self) -> usize {
        self.occupied.count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> SymbolTableStats {
        SymbolTableStats {
            symbols: self.len(),
            slots: self.entries.len(),
            names: self.names.len(),
        }
    }

    pub fn max_stats(&self) -> SymbolTableStats {
        self.high_water
    }

    /// Start a new transitive-closure traversal.
    ///
    /// No symbol is marked with the returned number until the traversal marks it.
    pub fn new_tc_number(&mut self) -> TcNumber {
        self.last_tc += 1;
        self.last_tc
    }

    /// Mark a symbol as visited in traversal `tc`.
    /// Returns false if it was already marked, or is dead.
    pub fn mark_if_unmarked(&mut self, sym: Symbol, tc: TcNumber) -> bool {
        match self.entry_mut(sym) {
            Some(entry) if entry.tc_num != tc => {
                entry.tc_num = tc;
                true
            }
            Some(_) => false,
            None => {
                tracing::error!("marking dead symbol {}", sym);
                false
            }
        }
    }

    /// Contents of a live symbol.
    pub fn value(&self, sym: Symbol) -> Option<SymbolValue<'_>> {
        let entry = self.entry(sym)?;
        Some(match entry.key {
            Key::Variable(name) => SymbolValue::Variable(self.names.resolve(name)?),
            Key::StrConstant(name) => SymbolValue::StrConstant(self.names.resolve(name)?),
            Key::Integer(v) => SymbolValue::Integer(v),
            Key::Float(bits) => SymbolValue::Float(f64::from_bits(bits)),
            Key::Identifier(letter, number) => SymbolValue::Identifier { letter, number },
        })
    }

    /// Name of a variable or string constant.
    pub fn name(&self, sym: Symbol) -> Option<&str> {
        match self.value(sym)? {
            SymbolValue::Variable(name) | SymbolValue::StrConstant(name) => Some(name),
            _ => None,
        }
    }

    /// Print form of a symbol; dead handles print as their handle.
    pub fn to_string(&self, sym: Symbol) -> String {
        match self.value(sym) {
            Some(v) => v.to_string(),
            None => format!("<dead {}>", sym),
        }
    }

    /// Print form that lexes back to the same symbol.
    ///
    /// String constants that would read back as something else (a number,
    /// a variable, an identifier, or a special token) are wrapped in
    /// vertical bars.
    pub fn to_rereadable_string(&self, sym: Symbol) -> String {
        let Some(SymbolValue::StrConstant(name)) = self.value(sym) else {
            return self.to_string(sym);
        };
        let possible = possible_symbol_types(name.as_bytes());
        let plain = possible.str_constant
            && possible.rereadable
            && !possible.variable
            && !possible.int_constant
            && !possible.float_constant
            && !possible.identifier;
        if plain {
            return name.to_owned();
        }

        let mut out = String::with_capacity(name.len() + 2);
        out.push('|');
        for c in name.chars() {
            if c == '|' || c == '\\' {
                out.push('\\');
            }
            out.push(c);
        }
        out.push('|');
        out
    }

    /// First letter of a symbol's name, for generating names that resemble it.
    /// Numbers have no letter, and give '*'.
    pub fn first_letter(&self, sym: Symbol) -> char {
        let letter = match self.value(sym) {
            Some(SymbolValue::Variable(name)) => name.chars().nth(1),
            Some(SymbolValue::StrConstant(name)) => name.chars().next(),
            Some(SymbolValue::Identifier { letter, .. }) => Some(letter),
            _ => None,
        };
        match letter {
            Some(c) if c.is_ascii_alphabetic() => c.to_ascii_lowercase(),
            _ => '*',
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{SymbolTable, SymbolType, SymbolValue};

    #[test]
    fn find_or_create() {
        let mut table = SymbolTable::new();
        let a = table.make_str_constant("red");
        let b = table.make_str_constant("red");
        let v = table.make_variable("red");
        assert_eq!(a, b);
        assert_ne!(a, v);
        assert_eq!(table.ref_count(a), 2);
        assert_eq!(table.ref_count(v), 1);
        assert_eq!(table.len(), 2);
        assert_eq!(a.symbol_type(), SymbolType::StrConstant);
        assert!(v.is_variable());
        assert!(a.is_constant() && !a.is_variable());
        assert!(!v.is_constant());

        let i = table.make_identifier('s', 3);
        assert_eq!(table.make_identifier('S', 3), i);
        assert!(i.is_identifier() && !i.is_constant());
        assert!(!a.is_identifier());
        assert_eq!(
            table.value(i),
            Some(SymbolValue::Identifier {
                letter: 'S',
                number: 3
            })
        );

        let n = table.make_int_constant(3);
        let f = table.make_float_constant(3.0);
        assert_ne!(n, f);
        assert!(n.is_constant() && f.is_constant());
        assert_eq!(table.value(f), Some(SymbolValue::Float(3.0)));
        assert_eq!(table.to_string(f), "3.0");
        assert_eq!(table.to_string(n), "3");
    }

    #[test]
    fn freed_slots_are_reused() {
        let mut table = SymbolTable::new();
        let a = table.make_str_constant("a");
        let b = table.make_str_constant("b");
        table.add_ref(a);
        assert!(!table.remove_ref(a));
        assert!(table.is_live(a));
        assert!(table.remove_ref(a));
        assert!(!table.is_live(a));
        assert_eq!(table.ref_count(a), 0);
        assert_eq!(table.len(), 1);

        // Dead handles are reported, not panicked on.
        assert!(!table.remove_ref(a));
        table.add_ref(a);
        assert!(!table.is_live(a));

        let c = table.make_int_constant(12);
        assert!(table.is_live(c));
        assert!(table.is_live(b));
        assert_eq!(table.len(), 2);
        assert_eq!(table.stats().slots, 2);
        assert_eq!(table.max_stats().symbols, 2);

        // The name survives in the interner, but a fresh handle is counted from one.
        let a2 = table.make_str_constant("a");
        assert_eq!(table.ref_count(a2), 1);
        assert_eq!(table.stats().names, 2);
    }

    #[test]
    fn tc_marks() {
        let mut table = SymbolTable::new();
        let x = table.make_variable("<x>");
        let tc = table.new_tc_number();
        assert!(table.mark_if_unmarked(x, tc));
        assert!(!table.mark_if_unmarked(x, tc));
        let tc2 = table.new_tc_number();
        assert_ne!(tc, tc2);
        assert!(table.mark_if_unmarked(x, tc2));
    }

    #[test]
    fn rereadable_strings() {
        let mut table = SymbolTable::new();
        let cases = [
            ("state", "state"),
            ("12", "|12|"),
            ("<x>", "|<x>|"),
            ("S1", "|S1|"),
            ("<=", "|<=|"),
            ("two words", "|two words|"),
            ("a|b\\c", "|a\\|b\\\\c|"),
            ("*", "*"),
            ("@foo", "|@foo|"),
        ];
        for (name, want) in cases {
            let sym = table.make_str_constant(name);
            assert_eq!(table.to_rereadable_string(sym), want, "for {:?}", name);
            assert_eq!(table.name(sym), Some(name));
        }

        let v = table.make_variable("<x>");
        assert_eq!(table.to_rereadable_string(v), "<x>");
        let n = table.make_int_constant(-4);
        assert_eq!(table.to_rereadable_string(n), "-4");
        assert_eq!(table.name(n), None);
    }

    #[test]
    fn first_letters() {
        let mut table = SymbolTable::new();
        let v = table.make_variable("<Goal>");
        let s = table.make_str_constant("Operator");
        let i = table.make_identifier('o', 7);
        let n = table.make_int_constant(7);
        let odd = table.make_str_constant("*");
        assert_eq!(table.first_letter(v), 'g');
        assert_eq!(table.first_letter(s), 'o');
        assert_eq!(table.first_letter(i), 'o');
        assert_eq!(table.first_letter(n), '*');
        assert_eq!(table.first_letter(odd), '*');
    }
}

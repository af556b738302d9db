//! Right-hand-side values: what a production's actions are built from.
//!
//! An [RhsValue] is a small expression tree. Leaves are symbol references
//! or opaque placeholders left by the matcher; interior nodes are function
//! calls. Symbol references hold counted references in a [SymbolTable],
//! so values are neither `Clone` nor `Drop`: duplicate one with
//! [RhsValue::copy] and release it with [RhsValue::deallocate]. A value
//! dropped any other way leaks its counts.
//!
//! Every traversal here uses an explicit stack, so arbitrarily deep
//! function-call nesting cannot overflow the call stack.

mod action;

pub use action::*;

use crate::data::{Symbol, SymbolTable, TcNumber};

/// Reference to a symbol, with the variable it was bound from.
///
/// Each present handle holds exactly one counted reference.
#[derive(Debug, PartialEq, Eq)]
pub struct RhsSymbol {
    pub referent: Symbol,
    pub original_variable: Option<Symbol>,
}

/// A call to a right-hand-side function.
///
/// The operator is shared with the function registry and is not counted
/// by this node.
#[derive(Debug, PartialEq, Eq)]
pub struct FunctionCall {
    pub operator: Symbol,
    pub args: Vec<RhsValue>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum RhsValue {
    Symbol(RhsSymbol),
    FunctionCall(FunctionCall),
    /// A slot in the match network. Owns nothing.
    ReteLocation { slot: u32 },
    /// A variable not bound on the left-hand side. Owns nothing.
    UnboundVar { index: u32 },
}

/// Build a symbol reference.
///
/// If `pre_incremented` is set, the caller has already taken the
/// reference on `referent` that the new value will own; otherwise one is
/// taken here. A reference on `original_variable` is always taken here.
pub fn make_symbol_ref(
    table: &mut SymbolTable,
    referent: Symbol,
    original_variable: Option<Symbol>,
    pre_incremented: bool,
) -> RhsValue {
    if !pre_incremented {
        table.add_ref(referent);
    }
    if let Some(orig) = original_variable {
        table.add_ref(orig);
    }
    tracing::trace!(
        "rhs symbol {} (original {:?}), pre_incremented={}",
        referent,
        original_variable,
        pre_incremented
    );
    RhsValue::Symbol(RhsSymbol {
        referent,
        original_variable,
    })
}

impl RhsValue {
    /// Reference `referent`, taking new references on it and on
    /// `original_variable`.
    pub fn symbol(
        table: &mut SymbolTable,
        referent: Symbol,
        original_variable: Option<Symbol>,
    ) -> RhsValue {
        make_symbol_ref(table, referent, original_variable, false)
    }

    /// Reference `referent`, adopting a reference the caller already holds
    /// on it (as returned by the table's `make_*` functions).
    /// A new reference is still taken on `original_variable`.
    pub fn symbol_pre_incremented(
        table: &mut SymbolTable,
        referent: Symbol,
        original_variable: Option<Symbol>,
    ) -> RhsValue {
        make_symbol_ref(table, referent, original_variable, true)
    }

    pub fn function_call(operator: Symbol, args: Vec<RhsValue>) -> RhsValue {
        RhsValue::FunctionCall(FunctionCall { operator, args })
    }

    pub fn is_symbol(&self) -> bool {
        matches!(self, RhsValue::Symbol(_))
    }

    pub fn is_function_call(&self) -> bool {
        matches!(self, RhsValue::FunctionCall(_))
    }

    /// The referenced symbol, if this is a symbol reference.
    pub fn as_symbol(&self) -> Option<Symbol> {
        match self {
            RhsValue::Symbol(s) => Some(s.referent),
            _ => None,
        }
    }

    /// Counted copy.
    ///
    /// Symbol references take new references; function calls copy their
    /// arguments and share the operator; placeholders are reproduced as-is.
    pub fn copy(&self, table: &mut SymbolTable) -> RhsValue {
        let root = match self.copy_leaf(table) {
            Ok(v) => return v,
            Err(call) => call,
        };
        let mut current = CopyFrame::new(root);
        let mut parents = Vec::new();
        loop {
            match current.args.next() {
                Some(arg) => match arg.copy_leaf(table) {
                    Ok(v) => current.built.push(v),
                    Err(call) => {
                        let parent = std::mem::replace(&mut current, CopyFrame::new(call));
                        parents.push(parent);
                    }
                },
                None => {
                    let value = RhsValue::function_call(current.operator, current.built);
                    match parents.pop() {
                        Some(mut parent) => {
                            parent.built.push(value);
                            current = parent;
                        }
                        None => return value,
                    }
                }
            }
        }
    }

    /// Copy a value with no children, or hand back the call to descend into.
    fn copy_leaf(&self, table: &mut SymbolTable) -> Result<RhsValue, &FunctionCall> {
        match self {
            RhsValue::Symbol(s) => Ok(RhsValue::symbol(table, s.referent, s.original_variable)),
            RhsValue::ReteLocation { slot } => Ok(RhsValue::ReteLocation { slot: *slot }),
            RhsValue::UnboundVar { index } => Ok(RhsValue::UnboundVar { index: *index }),
            RhsValue::FunctionCall(call) => Err(call),
        }
    }

    /// Release every reference this value holds.
    ///
    /// Function call operators are not released; they were never owned.
    pub fn deallocate(self, table: &mut SymbolTable) {
        let mut stack = vec![self];
        while let Some(value) = stack.pop() {
            match value {
                RhsValue::Symbol(RhsSymbol {
                    referent,
                    original_variable,
                }) => {
                    tracing::trace!("deallocating rhs symbol {}", referent);
                    table.remove_ref(referent);
                    if let Some(orig) = original_variable {
                        table.remove_ref(orig);
                    }
                }
                RhsValue::FunctionCall(call) => stack.extend(call.args),
                RhsValue::ReteLocation { .. } | RhsValue::UnboundVar { .. } => (),
            }
        }
    }

    /// Add every variable referenced by this value to `vars`.
    pub fn collect_variables(&self, table: &mut SymbolTable, vars: &mut VariableSet) {
        let mut stack = vec![self];
        while let Some(value) = stack.pop() {
            match value {
                RhsValue::Symbol(s) => vars.visit(table, s.referent),
                RhsValue::FunctionCall(call) => stack.extend(call.args.iter().rev()),
                RhsValue::ReteLocation { .. } | RhsValue::UnboundVar { .. } => (),
            }
        }
    }

    /// First letter of the referenced symbol; '*' for anything else.
    pub fn first_letter(&self, table: &SymbolTable) -> char {
        match self {
            RhsValue::Symbol(s) => table.first_letter(s.referent),
            _ => '*',
        }
    }

    /// Print form, e.g. `(+ <x> 1)`.
    pub fn to_string(&self, table: &SymbolTable) -> String {
        enum Step<'a> {
            Visit(&'a RhsValue),
            Text(&'static str),
        }

        let mut out = String::new();
        let mut stack = vec![Step::Visit(self)];
        while let Some(step) = stack.pop() {
            match step {
                Step::Text(s) => out.push_str(s),
                Step::Visit(RhsValue::Symbol(s)) => {
                    out.push_str(&table.to_rereadable_string(s.referent))
                }
                Step::Visit(RhsValue::ReteLocation { slot }) => {
                    out.push_str(&format!("[rete {}]", slot))
                }
                Step::Visit(RhsValue::UnboundVar { index }) => {
                    out.push_str(&format!("[unbound {}]", index))
                }
                Step::Visit(RhsValue::FunctionCall(call)) => {
                    out.push('(');
                    out.push_str(&table.to_string(call.operator));
                    stack.push(Step::Text(")"));
                    for arg in call.args.iter().rev() {
                        stack.push(Step::Visit(arg));
                        stack.push(Step::Text(" "));
                    }
                }
            }
        }
        out
    }
}

/// A function call partway through being copied.
struct CopyFrame<'a> {
    operator: Symbol,
    args: std::slice::Iter<'a, RhsValue>,
    built: Vec<RhsValue>,
}

impl<'a> CopyFrame<'a> {
    fn new(call: &'a FunctionCall) -> Self {
        CopyFrame {
            operator: call.operator,
            args: call.args.iter(),
            built: Vec::with_capacity(call.args.len()),
        }
    }
}

/// Variables found in one transitive-closure traversal.
///
/// The set does not hold counted references.
#[derive(Debug)]
pub struct VariableSet {
    tc: TcNumber,
    vars: Vec<Symbol>,
}

impl VariableSet {
    /// Start a new traversal; nothing is marked yet.
    pub fn new(table: &mut SymbolTable) -> Self {
        VariableSet {
            tc: table.new_tc_number(),
            vars: Vec::new(),
        }
    }

    pub fn tc(&self) -> TcNumber {
        self.tc
    }

    /// Variables in the order they were first seen.
    pub fn vars(&self) -> &[Symbol] {
        &self.vars
    }

    pub fn into_vars(self) -> Vec<Symbol> {
        self.vars
    }

    fn visit(&mut self, table: &mut SymbolTable, sym: Symbol) {
        if sym.is_variable() && table.mark_if_unmarked(sym, self.tc) {
            self.vars.push(sym);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// (+ <x> (* <y> 2) |r|) with <x> bound from <orig>.
    fn sample(table: &mut SymbolTable) -> (RhsValue, [Symbol; 6]) {
        let plus = table.make_str_constant("+");
        let times = table.make_str_constant("*");
        let x = table.make_variable("<x>");
        let orig = table.make_variable("<orig>");
        let y = table.make_variable("<y>");
        let two = table.make_int_constant(2);

        let xv = RhsValue::symbol_pre_incremented(table, x, Some(orig));
        let yv = RhsValue::symbol_pre_incremented(table, y, None);
        let twov = RhsValue::symbol_pre_incremented(table, two, None);
        let r = table.make_str_constant("r");
        let rv = RhsValue::symbol_pre_incremented(table, r, None);
        let inner = RhsValue::function_call(times, vec![yv, twov]);
        let value = RhsValue::function_call(
            plus,
            vec![xv, inner, RhsValue::ReteLocation { slot: 4 }, rv],
        );
        (value, [plus, times, x, orig, y, two])
    }

    #[test]
    fn constructors_count_references() {
        let mut table = SymbolTable::new();
        let s = table.make_str_constant("blue");
        let v = table.make_variable("<v>");
        assert_eq!(table.ref_count(s), 1);

        let a = RhsValue::symbol(&mut table, s, Some(v));
        assert!(a.is_symbol() && !a.is_function_call());
        assert_eq!(table.ref_count(s), 2);
        assert_eq!(table.ref_count(v), 2);

        let b = RhsValue::symbol_pre_incremented(&mut table, s, Some(v));
        assert_eq!(table.ref_count(s), 2);
        assert_eq!(table.ref_count(v), 3);

        a.deallocate(&mut table);
        b.deallocate(&mut table);
        assert_eq!(table.ref_count(s), 0);
        assert_eq!(table.ref_count(v), 1);
    }

    #[test]
    fn copy_then_deallocate_is_neutral() {
        let mut table = SymbolTable::new();
        let (value, syms) = sample(&mut table);
        let before: Vec<u32> = syms.iter().map(|s| table.ref_count(*s)).collect();

        let copied = value.copy(&mut table);
        assert_eq!(copied, value);
        assert!(copied.is_function_call() && !copied.is_symbol());
        assert_eq!(table.ref_count(syms[2]), before[2] + 1);
        assert_eq!(table.ref_count(syms[3]), before[3] + 1);
        // Operators are shared, not counted.
        assert_eq!(table.ref_count(syms[0]), before[0]);

        copied.deallocate(&mut table);
        let after: Vec<u32> = syms.iter().map(|s| table.ref_count(*s)).collect();
        assert_eq!(before, after);

        value.deallocate(&mut table);
        let [plus, _, x, orig, y, two] = syms;
        for s in [x, y, two] {
            assert!(!table.is_live(s), "{} still live", s);
        }
        assert_eq!(table.ref_count(orig), 1);
        assert!(table.is_live(plus));
    }

    #[test]
    fn placeholders_copy_as_themselves() {
        let mut table = SymbolTable::new();
        let r = RhsValue::ReteLocation { slot: 9 };
        let u = RhsValue::UnboundVar { index: 1 };
        assert!(!r.is_symbol() && !r.is_function_call());
        assert!(!u.is_symbol() && !u.is_function_call());
        assert_eq!(r.copy(&mut table), r);
        assert_eq!(u.copy(&mut table), u);
        r.deallocate(&mut table);
        u.deallocate(&mut table);
        assert!(table.is_empty());
    }

    #[test]
    fn deep_nesting() {
        let mut table = SymbolTable::new();
        let f = table.make_str_constant("f");
        let x = table.make_variable("<x>");
        let mut value = RhsValue::symbol_pre_incremented(&mut table, x, None);
        for _ in 0..100_000 {
            value = RhsValue::function_call(f, vec![value]);
        }

        let copied = value.copy(&mut table);
        assert_eq!(table.ref_count(x), 2);
        let mut vars = VariableSet::new(&mut table);
        copied.collect_variables(&mut table, &mut vars);
        assert_eq!(vars.vars(), &[x]);

        copied.deallocate(&mut table);
        value.deallocate(&mut table);
        assert!(!table.is_live(x));
    }

    #[test]
    fn collect_variables_once_per_traversal() {
        let mut table = SymbolTable::new();
        let (value, syms) = sample(&mut table);
        let [_, _, x, _, y, _] = syms;

        let mut vars = VariableSet::new(&mut table);
        value.collect_variables(&mut table, &mut vars);
        value.collect_variables(&mut table, &mut vars);
        // <orig> only appears as an original_variable, so it is not collected.
        assert_eq!(vars.vars(), &[x, y]);

        let mut again = VariableSet::new(&mut table);
        assert_ne!(again.tc(), vars.tc());
        value.collect_variables(&mut table, &mut again);
        assert_eq!(again.into_vars(), vec![x, y]);

        value.deallocate(&mut table);
    }

    #[test]
    fn print_form() {
        let mut table = SymbolTable::new();
        let (value, _) = sample(&mut table);
        assert_eq!(value.to_string(&table), "(+ <x> (* <y> 2) [rete 4] r)");
        assert_eq!(value.first_letter(&table), '*');
        value.deallocate(&mut table);

        let g = table.make_variable("<goal>");
        let gv = RhsValue::symbol_pre_incremented(&mut table, g, None);
        assert_eq!(gv.first_letter(&table), 'g');
        assert_eq!(gv.as_symbol(), Some(g));
        gv.deallocate(&mut table);
    }
}

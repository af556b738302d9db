use std::collections::HashMap;
use std::fmt;

use super::{RhsValue, VariableSet};
use crate::data::{Symbol, SymbolTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreferenceType {
    Acceptable,
    Require,
    Reject,
    Prohibit,
    Reconsider,
    UnaryIndifferent,
    UnaryParallel,
    Best,
    Worst,
    BinaryIndifferent,
    BinaryParallel,
    Better,
    Worse,
    NumericIndifferent,
}

impl PreferenceType {
    /// Binary preferences relate the value to a second, referent value.
    pub fn is_binary(self) -> bool {
        matches!(
            self,
            PreferenceType::BinaryIndifferent
                | PreferenceType::BinaryParallel
                | PreferenceType::Better
                | PreferenceType::Worse
                | PreferenceType::NumericIndifferent
        )
    }

    /// The character a preference is written with.
    pub fn as_char(self) -> char {
        use PreferenceType::*;
        match self {
            Acceptable => '+',
            Require => '!',
            Reject => '-',
            Prohibit => '~',
            Reconsider => '@',
            UnaryIndifferent | BinaryIndifferent | NumericIndifferent => '=',
            UnaryParallel | BinaryParallel => '&',
            Best | Better => '>',
            Worst | Worse => '<',
        }
    }
}

impl fmt::Display for PreferenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Create a working memory element or preference.
#[derive(Debug, PartialEq, Eq)]
pub struct MakeAction {
    pub id: RhsValue,
    pub attr: RhsValue,
    pub value: RhsValue,
    /// Present exactly when the preference is binary.
    pub referent: Option<RhsValue>,
    pub preference: PreferenceType,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Action {
    Make(MakeAction),
    /// Call a function for its side effects.
    FunctionCall(RhsValue),
}

impl Action {
    pub fn make(
        id: RhsValue,
        attr: RhsValue,
        value: RhsValue,
        preference: PreferenceType,
        referent: Option<RhsValue>,
    ) -> Action {
        debug_assert_eq!(
            referent.is_some(),
            preference.is_binary(),
            "referent must be given exactly for binary preferences"
        );
        Action::Make(MakeAction {
            id,
            attr,
            value,
            referent,
            preference,
        })
    }

    /// Counted copy; see [RhsValue::copy].
    pub fn copy(&self, table: &mut SymbolTable) -> Action {
        match self {
            Action::Make(m) => Action::Make(MakeAction {
                id: m.id.copy(table),
                attr: m.attr.copy(table),
                value: m.value.copy(table),
                referent: m.referent.as_ref().map(|r| r.copy(table)),
                preference: m.preference,
            }),
            Action::FunctionCall(v) => Action::FunctionCall(v.copy(table)),
        }
    }

    /// Release every value in the action, including a present referent.
    pub fn deallocate(self, table: &mut SymbolTable) {
        match self {
            Action::Make(m) => {
                m.id.deallocate(table);
                m.attr.deallocate(table);
                m.value.deallocate(table);
                if let Some(r) = m.referent {
                    r.deallocate(table);
                }
            }
            Action::FunctionCall(v) => v.deallocate(table),
        }
    }

    /// Add every variable referenced by this action to `vars`.
    pub fn collect_variables(&self, table: &mut SymbolTable, vars: &mut VariableSet) {
        match self {
            Action::Make(m) => {
                m.id.collect_variables(table, vars);
                m.attr.collect_variables(table, vars);
                m.value.collect_variables(table, vars);
                if let Some(r) = &m.referent {
                    r.collect_variables(table, vars);
                }
            }
            Action::FunctionCall(v) => v.collect_variables(table, vars),
        }
    }

    /// Print form, e.g. `(<s> ^name foo +)`.
    pub fn to_string(&self, table: &SymbolTable) -> String {
        match self {
            Action::Make(m) => {
                let mut out = format!(
                    "({} ^{} {} {}",
                    m.id.to_string(table),
                    m.attr.to_string(table),
                    m.value.to_string(table),
                    m.preference
                );
                if let Some(r) = &m.referent {
                    out.push(' ');
                    out.push_str(&r.to_string(table));
                }
                out.push(')');
                out
            }
            Action::FunctionCall(v) => v.to_string(table),
        }
    }
}

/// Release every action in a list.
pub fn deallocate_action_list(actions: Vec<Action>, table: &mut SymbolTable) {
    for action in actions {
        action.deallocate(table);
    }
}

/// Add every variable referenced by a list of actions to `vars`.
pub fn collect_variables_in_actions(
    actions: &[Action],
    table: &mut SymbolTable,
    vars: &mut VariableSet,
) {
    for action in actions {
        action.collect_variables(table, vars);
    }
}

/// Correspondence between the variables of two productions being compared.
///
/// Holds no counted references.
#[derive(Debug, Default)]
pub struct Bindings {
    map: HashMap<Symbol, Symbol>,
}

impl Bindings {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn get(&self, var: Symbol) -> Option<Symbol> {
        self.map.get(&var).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Equality of two symbols under a variable correspondence.
///
/// Identical non-variables are equal. Two variables are equal if `s1` is
/// already bound to `s2`, or if `s1` is unbound, in which case the binding
/// `s1 -> s2` is recorded.
pub fn symbols_equal_with_bindings(s1: Symbol, s2: Symbol, bindings: &mut Bindings) -> bool {
    if s1 == s2 && !s1.is_variable() {
        return true;
    }
    if !s1.is_variable() || !s2.is_variable() {
        return false;
    }
    match bindings.get(s1) {
        None => {
            bindings.map.insert(s1, s2);
            true
        }
        Some(bound) => bound == s2,
    }
}

/// Structural equality of two actions under a variable correspondence.
///
/// Function calls are never equal to anything, not even to themselves:
/// a function-call action never matches, and neither does a make action
/// whose value is a function call.
pub fn actions_equal_with_bindings(a1: &Action, a2: &Action, bindings: &mut Bindings) -> bool {
    let (Action::Make(m1), Action::Make(m2)) = (a1, a2) else {
        return false;
    };

    if m1.preference != m2.preference {
        return false;
    }

    let (Some(id1), Some(id2)) = (m1.id.as_symbol(), m2.id.as_symbol()) else {
        return false;
    };
    if !symbols_equal_with_bindings(id1, id2, bindings) {
        return false;
    }

    match (m1.attr.as_symbol(), m2.attr.as_symbol()) {
        (Some(at1), Some(at2)) => {
            if !symbols_equal_with_bindings(at1, at2, bindings) {
                return false;
            }
        }
        (None, None) => (),
        _ => return false,
    }

    match (m1.value.as_symbol(), m2.value.as_symbol()) {
        (Some(v1), Some(v2)) => symbols_equal_with_bindings(v1, v2, bindings),
        _ => false,
    }
}

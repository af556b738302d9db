use std::collections::VecDeque;

use dot_writer::Attributes;
use dot_writer::DotWriter;

use crate::data::SymbolTable;
use crate::rhs::{Action, RhsValue};

/// Escape text for use inside a record label.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '{' | '}' | '|' | '<' | '>' | '"' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Render a list of actions into a Graphviz graph.
///
/// Each action is a root; its values hang below it in argument order.
pub fn render_actions(table: &SymbolTable, actions: &[Action]) -> Vec<u8> {
    let mut outbuf = Vec::new();
    {
        let mut writer = DotWriter::from(&mut outbuf);
        let mut graph = writer.digraph();
        let mut next_id = 0usize;
        let mut fresh = || {
            let id = format!("n{next_id}");
            next_id += 1;
            id
        };
        // (parent node, value to render below it)
        let mut queue: VecDeque<(String, &RhsValue)> = VecDeque::new();

        for action in actions {
            let id = fresh();
            let mut node = graph.node_named(&id);
            node.set_shape(dot_writer::Shape::Record);
            match action {
                Action::Make(m) => {
                    node.set_label(&format!("{{make|{}}}", escape(&m.preference.to_string())));
                    queue.push_back((id.clone(), &m.id));
                    queue.push_back((id.clone(), &m.attr));
                    queue.push_back((id.clone(), &m.value));
                    if let Some(r) = &m.referent {
                        queue.push_back((id.clone(), r));
                    }
                }
                Action::FunctionCall(v) => {
                    node.set_label("call");
                    queue.push_back((id.clone(), v));
                }
            }
        }

        while let Some((parent, value)) = queue.pop_front() {
            let id = fresh();
            let mut node = graph.node_named(&id);
            node.set_shape(dot_writer::Shape::Record);
            match value {
                RhsValue::Symbol(s) => {
                    let name = escape(&table.to_string(s.referent));
                    node.set_label(&format!("{{{}|{name}}}", s.referent));
                }
                RhsValue::FunctionCall(call) => {
                    let name = escape(&table.to_string(call.operator));
                    node.set_label(&format!("{{function|{name}}}"));
                    for arg in &call.args {
                        queue.push_back((id.clone(), arg));
                    }
                }
                RhsValue::ReteLocation { slot } => {
                    node.set_label(&format!("{{rete|{slot}}}"));
                }
                RhsValue::UnboundVar { index } => {
                    node.set_label(&format!("{{unbound|{index}}}"));
                }
            }
            std::mem::drop(node);
            graph.edge(parent, id);
        }
    }
    outbuf
}

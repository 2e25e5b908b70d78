use crate::tree::types::JavaType;
use crate::tree::{Node, NodeRef};
use std::collections::HashMap;
use std::sync::Arc;

/// What a parameter captured.
#[derive(Debug, Clone)]
pub enum Captured {
    Single(NodeRef),
    /// A run of sibling arguments, possibly empty.
    Repeated(Vec<NodeRef>),
}

impl Captured {
    fn same_as(&self, other: &Captured) -> bool {
        match (self, other) {
            (Captured::Single(a), Captured::Single(b)) => same_node(a, b),
            (Captured::Repeated(a), Captured::Repeated(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| same_node(x, y))
            }
            _ => false,
        }
    }
}

fn same_node(a: &NodeRef, b: &NodeRef) -> bool {
    Arc::ptr_eq(a, b) || a.same_structure(b)
}

/// Result of one successful match: parameter captures plus the type each
/// type variable was bound to.
#[derive(Debug, Clone, Default)]
pub struct BindingSet {
    captures: HashMap<String, Captured>,
    types: HashMap<String, JavaType>,
}

impl BindingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a single capture. A parameter seen before must capture a
    /// structurally equal subtree; returns false otherwise.
    pub fn bind(&mut self, name: &str, node: &NodeRef) -> bool {
        self.bind_captured(name, Captured::Single(node.clone()))
    }

    /// Records a repeated capture under the same consistency rule.
    pub fn bind_repeated(&mut self, name: &str, nodes: Vec<NodeRef>) -> bool {
        self.bind_captured(name, Captured::Repeated(nodes))
    }

    fn bind_captured(&mut self, name: &str, captured: Captured) -> bool {
        match self.captures.get(name) {
            Some(existing) => existing.same_as(&captured),
            None => {
                self.captures.insert(name.to_string(), captured);
                true
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Captured> {
        self.captures.get(name)
    }

    /// The single subtree bound to `name`.
    pub fn node(&self, name: &str) -> Option<&Node> {
        match self.captures.get(name) {
            Some(Captured::Single(node)) => Some(node),
            _ => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.captures.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.captures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.captures.is_empty()
    }

    pub(crate) fn set_types(&mut self, types: HashMap<String, JavaType>) {
        self.types = types;
    }

    pub fn types(&self) -> &HashMap<String, JavaType> {
        &self.types
    }

    /// The type a rule type variable was bound to.
    pub fn type_of(&self, var: &str) -> Option<&JavaType> {
        self.types.get(var)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{NodeKind, Symbol};

    fn ident(name: &str) -> NodeRef {
        Node::new(NodeKind::Identifier)
            .with_text(name)
            .with_symbol(Symbol::Local(name.into()))
            .into_ref()
    }

    #[test]
    fn test_rebinding_requires_equal_structure() {
        let mut bindings = BindingSet::new();
        assert!(bindings.bind("o", &ident("x")));
        assert!(bindings.bind("o", &ident("x")));
        assert!(!bindings.bind("o", &ident("y")));
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings.node("o").map(|n| n.text()), Some("x"));
    }

    #[test]
    fn test_repeated_and_single_never_agree() {
        let mut bindings = BindingSet::new();
        assert!(bindings.bind_repeated("args", vec![ident("a"), ident("b")]));
        assert!(!bindings.bind("args", &ident("a")));
        assert!(bindings.bind_repeated("args", vec![ident("a"), ident("b")]));
        assert!(bindings.node("args").is_none());
    }
}

use crate::tree::{NodeKind, NodeRef, Symbol};

/// Compiled shape of a template body.
#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    /// A leaf that must match exactly.
    Literal(NodeRef),
    /// A node kind with ordered child patterns.
    Structural {
        kind: NodeKind,
        text: Option<String>,
        symbol: Option<Symbol>,
        children: Vec<Pattern>,
    },
    /// A capture point for the named parameter.
    MetaRef(String),
}

impl Pattern {
    /// Builds a pattern from a resolved template body. Identifiers resolving
    /// to a template parameter become capture points.
    pub fn from_tree(node: &NodeRef) -> Pattern {
        if node.kind == NodeKind::Identifier {
            if let Some(Symbol::Parameter(name)) = &node.symbol {
                return Pattern::MetaRef(name.clone());
            }
        }
        if node.children.is_empty() && node.kind != NodeKind::Arguments && node.kind != NodeKind::LambdaParams {
            return Pattern::Literal(node.clone());
        }
        Pattern::Structural {
            kind: node.kind.clone(),
            text: node.text.clone(),
            symbol: node.symbol.clone(),
            children: node.children.iter().map(Pattern::from_tree).collect(),
        }
    }

    /// Parameter names in order of first occurrence.
    pub fn meta_refs(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_meta_refs(&mut names);
        names
    }

    fn collect_meta_refs<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Pattern::MetaRef(name) => {
                if !out.contains(&name.as_str()) {
                    out.push(name);
                }
            }
            Pattern::Structural { children, .. } => {
                for child in children {
                    child.collect_meta_refs(out);
                }
            }
            Pattern::Literal(_) => {}
        }
    }

    /// Visits every pattern node with its parent.
    pub fn visit<'a>(&'a self, parent: Option<&'a Pattern>, visit: &mut dyn FnMut(&'a Pattern, Option<&'a Pattern>)) {
        visit(self, parent);
        if let Pattern::Structural { children, .. } = self {
            for child in children {
                child.visit(Some(self), visit);
            }
        }
    }
}

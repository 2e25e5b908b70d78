//! A symbol-usage index over one compilation unit.

use crate::precondition::ApplicabilityIndex;
use crate::tree::catalog::TypeCatalog;
use crate::tree::types::JavaType;
use crate::tree::{Node, NodeKind, Symbol};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Answers [`ApplicabilityIndex`] queries for a single unit.
///
/// Type usage covers every class referenced by an expression or declaration
/// type plus all of its supertypes, so a unit holding an `ArrayList` also
/// "uses" `List` and `Collection`. Primitive expression types contribute
/// their boxed class.
#[derive(Debug)]
pub struct SymbolIndex<'a> {
    catalog: &'a TypeCatalog,
    types: HashSet<String>,
    /// Member name to the owners it was invoked on.
    members: HashMap<String, BTreeSet<String>>,
    /// Names of invocations whose owner could not be resolved.
    unresolved: HashSet<String>,
}

impl<'a> SymbolIndex<'a> {
    /// Scans a unit's tree.
    pub fn build(root: &Node, catalog: &'a TypeCatalog) -> Self {
        let mut referenced = BTreeSet::new();
        let mut members: HashMap<String, BTreeSet<String>> = HashMap::new();
        let mut unresolved = HashSet::new();

        root.walk(&mut |node: &Node| {
            collect_type(&node.ty, &mut referenced);
            match &node.symbol {
                Some(Symbol::Method { owner, name }) => {
                    members.entry(name.clone()).or_default().insert(owner.clone());
                }
                Some(Symbol::Type(name)) => {
                    referenced.insert(name.clone());
                }
                _ => {
                    if node.kind == NodeKind::MethodInvocation {
                        unresolved.insert(node.text().to_string());
                    }
                }
            }
        });

        let types = referenced
            .iter()
            .flat_map(|name| catalog.ancestors(name))
            .collect();
        Self {
            catalog,
            types,
            members,
            unresolved,
        }
    }

    /// Number of distinct types the unit uses, supertypes included.
    pub fn type_count(&self) -> usize {
        self.types.len()
    }
}

fn collect_type(ty: &JavaType, out: &mut BTreeSet<String>) {
    match ty {
        JavaType::Primitive(p) => {
            out.insert(p.boxed_name().to_string());
        }
        other => other.referenced_classes(out),
    }
}

impl ApplicabilityIndex for SymbolIndex<'_> {
    fn uses_type(&self, name: &str) -> Option<bool> {
        Some(self.types.contains(name))
    }

    fn uses_member(&self, owner: &str, member: &str) -> Option<bool> {
        if self.unresolved.contains(member) {
            return None;
        }
        let found = self.members.get(member).is_some_and(|owners| {
            owners
                .iter()
                .any(|o| self.catalog.is_subclass(o, owner) || self.catalog.is_subclass(owner, o))
        });
        Some(found)
    }
}

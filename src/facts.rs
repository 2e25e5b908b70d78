//! Symbol facts: the type and member usages a template needs from a unit.

use crate::template::Template;
use crate::tree::types::{JavaType, OBJECT, STRING};
use crate::tree::{Node, Symbol};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// An atomic applicability fact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Fact {
    /// The unit uses the class (or a subtype of it).
    UsesType(String),
    /// The unit invokes `member` declared by `owner`; constructors use
    /// the member name `<constructor>`.
    UsesMember { owner: String, member: String },
}

impl Fact {
    pub fn uses_type(name: impl Into<String>) -> Self {
        Fact::UsesType(name.into())
    }

    pub fn uses_member(owner: impl Into<String>, member: impl Into<String>) -> Self {
        Fact::UsesMember {
            owner: owner.into(),
            member: member.into(),
        }
    }

    /// The class a fact is about.
    pub fn owner(&self) -> &str {
        match self {
            Fact::UsesType(name) => name,
            Fact::UsesMember { owner, .. } => owner,
        }
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fact::UsesType(name) => write!(f, "UsesType({})", name),
            Fact::UsesMember { owner, member } => write!(f, "UsesMember({} {}(..))", owner, member),
        }
    }
}

/// Types that nearly every unit uses and are therefore useless as filters.
pub fn is_universal(ty: &JavaType) -> bool {
    match ty {
        JavaType::Class { name, .. } => name == STRING || name == OBJECT,
        JavaType::Array(elem) => is_universal(elem),
        _ => true,
    }
}

/// Extracts the facts of one template.
///
/// Member facts come from every resolved invocation and constructor call in
/// the body. Type facts come from the declared parameter types, keeping only
/// the top-level class: anything assignable to `Map<K, V>` is a `Map`, while
/// its type arguments may be erased at the use site.
pub fn extract_facts(template: &Template) -> BTreeSet<Fact> {
    let mut facts = BTreeSet::new();

    for param in &template.params {
        if let Some(class) = top_level_class(&param.ty) {
            facts.insert(Fact::UsesType(class.to_string()));
        }
    }

    if let Some(root) = template.body.root() {
        root.walk(&mut |node: &Node| {
            if let Some(Symbol::Method { owner, name }) = &node.symbol {
                facts.insert(Fact::uses_member(owner.clone(), name.clone()));
            }
        });
    }

    facts
}

fn top_level_class(ty: &JavaType) -> Option<&str> {
    if is_universal(ty) {
        return None;
    }
    match ty {
        JavaType::Class { name, .. } => Some(name),
        JavaType::Array(elem) => top_level_class(elem),
        _ => None,
    }
}

//! Instantiating after-templates from binding sets.

use crate::error::{Result, RuleError};
use crate::matcher::{BindingSet, Captured};
use crate::template::{Template, TemplateBody};
use crate::tree::types::{JavaType, Primitive};
use crate::tree::{BinaryOp, Node, NodeKind, NodeRef, Symbol, UnaryOp, unparenthesize};
use std::collections::HashMap;
use std::sync::Arc;

/// What to do with a matched subtree.
#[derive(Debug, Clone)]
pub enum RewriteOutcome {
    Replace(NodeRef),
    /// The after-template is the explicit no-op: remove the subtree.
    Delete,
}

impl RewriteOutcome {
    pub fn is_delete(&self) -> bool {
        matches!(self, RewriteOutcome::Delete)
    }

    pub fn replacement(&self) -> Option<&NodeRef> {
        match self {
            RewriteOutcome::Replace(node) => Some(node),
            RewriteOutcome::Delete => None,
        }
    }
}

/// Instantiates `after` with the captures in `bindings`.
///
/// Every occurrence of a parameter receives the very same captured subtree.
/// Template nodes without parameters below them are shared, not copied.
pub fn rewrite(after: &Template, bindings: &BindingSet) -> Result<RewriteOutcome> {
    let root = match &after.body {
        TemplateBody::Empty => return Ok(RewriteOutcome::Delete),
        TemplateBody::Expression(root) | TemplateBody::Statement(root) => root,
    };
    let types = bindings.types();
    Ok(RewriteOutcome::Replace(instantiate(root, bindings, types)?))
}

fn instantiate(node: &NodeRef, bindings: &BindingSet, types: &HashMap<String, JavaType>) -> Result<NodeRef> {
    if let Some(name) = parameter_name(node) {
        return match bindings.get(name) {
            Some(Captured::Single(bound)) => Ok(bound.clone()),
            // only argument lists can take a run
            Some(Captured::Repeated(_)) | None => Err(RuleError::UnboundParameter { name: name.to_string() }),
        };
    }

    let mut children = Vec::with_capacity(node.children.len());
    for child in &node.children {
        match (node.kind == NodeKind::Arguments, parameter_name(child).and_then(|n| bindings.get(n))) {
            (true, Some(Captured::Repeated(run))) => children.extend(run.iter().cloned()),
            _ => children.push(instantiate(child, bindings, types)?),
        }
    }

    let unchanged = children.len() == node.children.len()
        && children.iter().zip(&node.children).all(|(a, b)| Arc::ptr_eq(a, b));
    if unchanged {
        return Ok(node.clone());
    }
    let mut rebuilt = node.rebuilt(children);
    if !types.is_empty() {
        rebuilt.ty = rebuilt.ty.substitute(types);
    }
    Ok(rebuilt.into_ref())
}

fn parameter_name(node: &Node) -> Option<&str> {
    match (&node.kind, &node.symbol) {
        (NodeKind::Identifier, Some(Symbol::Parameter(name))) => Some(name),
        _ => None,
    }
}

fn boolean(value: bool) -> NodeRef {
    Node::new(NodeKind::Literal)
        .with_text(if value { "true" } else { "false" })
        .with_type(JavaType::Primitive(Primitive::Boolean))
        .into_ref()
}

fn boolean_value(node: &NodeRef) -> Option<bool> {
    let node = unparenthesize(node);
    match (&node.kind, node.text()) {
        (NodeKind::Literal, "true") => Some(true),
        (NodeKind::Literal, "false") => Some(false),
        _ => None,
    }
}

fn not(node: NodeRef) -> NodeRef {
    Node::new(NodeKind::Unary(UnaryOp::Not))
        .with_type(JavaType::Primitive(Primitive::Boolean))
        .with_children(vec![node])
        .into_ref()
}

/// Folds boolean literals out of a rewritten expression: `!true`, `!!x`,
/// `x == true`, `x && true` and their mirrored forms.
pub fn simplify_booleans(node: &NodeRef) -> NodeRef {
    let children: Vec<NodeRef> = node.children.iter().map(simplify_booleans).collect();
    let changed = children.iter().zip(&node.children).any(|(a, b)| !Arc::ptr_eq(a, b));
    let node = if changed { node.rebuilt(children).into_ref() } else { node.clone() };

    match &node.kind {
        NodeKind::Unary(UnaryOp::Not) => {
            let Some(operand) = node.child(0) else {
                return node;
            };
            if let Some(value) = boolean_value(operand) {
                return boolean(!value);
            }
            let inner = unparenthesize(operand);
            match (&inner.kind, inner.child(0)) {
                (NodeKind::Unary(UnaryOp::Not), Some(x)) => x.clone(),
                _ => node,
            }
        }
        NodeKind::Binary(op @ (BinaryOp::Eq | BinaryOp::Ne | BinaryOp::And | BinaryOp::Or)) => {
            let (Some(left), Some(right)) = (node.child(0), node.child(1)) else {
                return node;
            };
            let (value, other, literal_first) = match (boolean_value(left), boolean_value(right)) {
                (_, Some(v)) => (v, left, false),
                (Some(v), None) => (v, right, true),
                (None, None) => return node,
            };
            match (op, value) {
                (BinaryOp::Eq, true) | (BinaryOp::Ne, false) | (BinaryOp::And, true) | (BinaryOp::Or, false) => {
                    other.clone()
                }
                (BinaryOp::Eq, false) | (BinaryOp::Ne, true) => not(other.clone()),
                // `x && false` still evaluates `x`
                (BinaryOp::And, false) | (BinaryOp::Or, true) if !literal_first && has_side_effects(other) => node,
                (BinaryOp::And, false) => boolean(false),
                (BinaryOp::Or, true) => boolean(true),
                _ => node,
            }
        }
        _ => node,
    }
}

fn has_side_effects(node: &Node) -> bool {
    let mut effects = false;
    node.walk(&mut |n: &Node| {
        effects |= match &n.kind {
            NodeKind::MethodInvocation | NodeKind::NewObject => true,
            NodeKind::Unary(op) => matches!(op, UnaryOp::PreInc | UnaryOp::PreDec | UnaryOp::PostInc | UnaryOp::PostDec),
            NodeKind::Other(kind) => kind == "assignment_expression",
            _ => false,
        };
    });
    effects
}

//! Template compilation: typed parameters plus a body become a [`Pattern`].

mod compiler;
mod pattern;

pub use compiler::{TemplateContext, compile_template};
pub use pattern::Pattern;

use crate::tree::types::JavaType;
use crate::tree::{Node, NodeKind, NodeRef, unparenthesize};
use serde::{Deserialize, Serialize};

/// Structural category used to route patterns to traversal hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeClassification {
    Binary,
    Unary,
    MethodInvocation,
    NewObject,
    Lambda,
    Ternary,
    FieldAccess,
    Expression,
    Statement,
}

impl NodeClassification {
    pub const ALL: [NodeClassification; 9] = [
        NodeClassification::Binary,
        NodeClassification::Unary,
        NodeClassification::MethodInvocation,
        NodeClassification::NewObject,
        NodeClassification::Lambda,
        NodeClassification::Ternary,
        NodeClassification::FieldAccess,
        NodeClassification::Expression,
        NodeClassification::Statement,
    ];

    /// Classifies a node by its top-level shape.
    pub fn of(node: &Node) -> Option<Self> {
        Some(match &node.kind {
            NodeKind::Binary(_) => NodeClassification::Binary,
            NodeKind::Unary(_) => NodeClassification::Unary,
            NodeKind::MethodInvocation => NodeClassification::MethodInvocation,
            NodeKind::NewObject => NodeClassification::NewObject,
            NodeKind::Lambda => NodeClassification::Lambda,
            NodeKind::Ternary => NodeClassification::Ternary,
            NodeKind::FieldAccess => NodeClassification::FieldAccess,
            kind if kind.is_statement() => NodeClassification::Statement,
            kind if kind.is_expression() => NodeClassification::Expression,
            NodeKind::Other(k) if k.ends_with("_expression") || k == "array_access" || k == "class_literal" => {
                NodeClassification::Expression
            }
            NodeKind::Other(k) if k.ends_with("_statement") => NodeClassification::Statement,
            _ => return None,
        })
    }

    /// The generic tier a classification falls back to.
    pub fn fallback(&self) -> Self {
        match self {
            NodeClassification::Statement => NodeClassification::Statement,
            _ => NodeClassification::Expression,
        }
    }
}

/// A filter on a captured subtree, evaluated after structural matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// The capture is a compile-time constant.
    IsConstant,
    /// The capture is a method invocation.
    IsCall,
    Not(Box<Predicate>),
}

impl Predicate {
    /// Parses a predicate name as written in rule sources.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "constant" | "literal" => Some(Predicate::IsConstant),
            "call" | "method_invocation" | "MethodInvocationMatcher" => Some(Predicate::IsCall),
            _ => None,
        }
    }

    pub fn negate(self) -> Self {
        match self {
            Predicate::Not(inner) => *inner,
            other => Predicate::Not(Box::new(other)),
        }
    }

    pub fn test(&self, node: &NodeRef) -> bool {
        match self {
            Predicate::IsConstant => node.is_constant(),
            Predicate::IsCall => unparenthesize(node).kind == NodeKind::MethodInvocation,
            Predicate::Not(inner) => !inner.test(node),
        }
    }
}

/// A declared template parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    /// Declared type; for repeated parameters, the element type.
    pub ty: JavaType,
    pub predicate: Option<Predicate>,
    pub repeated: bool,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: JavaType) -> Self {
        Self {
            name: name.into(),
            ty,
            predicate: None,
            repeated: false,
        }
    }

    /// Marks the parameter as capturing zero or more arguments.
    pub fn repeated(mut self) -> Self {
        self.repeated = true;
        if let JavaType::Array(elem) = self.ty {
            self.ty = *elem;
        }
        self
    }

    pub fn with_predicate(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(predicate);
        self
    }
}

/// The resolved body of a template.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateBody {
    Expression(NodeRef),
    /// A statement; expression statements hold the inner expression.
    Statement(NodeRef),
    /// The explicit no-op body.
    Empty,
}

impl TemplateBody {
    pub fn root(&self) -> Option<&NodeRef> {
        match self {
            TemplateBody::Expression(root) | TemplateBody::Statement(root) => Some(root),
            TemplateBody::Empty => None,
        }
    }

    pub fn is_statement(&self) -> bool {
        matches!(self, TemplateBody::Statement(_))
    }
}

/// A compiled template.
#[derive(Debug, Clone)]
pub struct Template {
    pub params: Vec<Parameter>,
    pub body: TemplateBody,
    /// `None` only for the empty body.
    pub pattern: Option<Pattern>,
    pub classification: NodeClassification,
    /// Type of the body expression; `Void` for statements.
    pub result_type: JavaType,
}

impl Template {
    pub fn param(&self, name: &str) -> Option<&Parameter> {
        self.params.iter().find(|p| p.name == name)
    }
}

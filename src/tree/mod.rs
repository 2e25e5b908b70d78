//! Attributed syntax tree shared by templates and compilation units.
//!
//! Nodes are immutable and reference counted, so a rewrite can graft a
//! captured subtree into several places without copying it. Every node
//! carries its resolved [`JavaType`] and, where it names something, the
//! [`Symbol`] it resolves to.

pub mod catalog;
pub mod print;
pub mod types;

use std::ops::Range;
use std::sync::Arc;
use types::JavaType;

/// Shared handle to an immutable node.
pub type NodeRef = Arc<Node>;

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Mul,
    Div,
    Rem,
    Add,
    Sub,
    Shl,
    Shr,
    UShr,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    BitAnd,
    BitXor,
    BitOr,
    And,
    Or,
}

impl BinaryOp {
    pub fn from_token(token: &str) -> Option<Self> {
        Some(match token {
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            "%" => BinaryOp::Rem,
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "<<" => BinaryOp::Shl,
            ">>" => BinaryOp::Shr,
            ">>>" => BinaryOp::UShr,
            "<" => BinaryOp::Lt,
            ">" => BinaryOp::Gt,
            "<=" => BinaryOp::Le,
            ">=" => BinaryOp::Ge,
            "==" => BinaryOp::Eq,
            "!=" => BinaryOp::Ne,
            "&" => BinaryOp::BitAnd,
            "^" => BinaryOp::BitXor,
            "|" => BinaryOp::BitOr,
            "&&" => BinaryOp::And,
            "||" => BinaryOp::Or,
            _ => return None,
        })
    }

    pub fn token(&self) -> &'static str {
        match self {
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::UShr => ">>>",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitXor => "^",
            BinaryOp::BitOr => "|",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    /// Binding strength; higher binds tighter.
    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 12,
            BinaryOp::Add | BinaryOp::Sub => 11,
            BinaryOp::Shl | BinaryOp::Shr | BinaryOp::UShr => 10,
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge => 9,
            BinaryOp::Eq | BinaryOp::Ne => 8,
            BinaryOp::BitAnd => 7,
            BinaryOp::BitXor => 6,
            BinaryOp::BitOr => 5,
            BinaryOp::And => 4,
            BinaryOp::Or => 3,
        }
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge | BinaryOp::Eq | BinaryOp::Ne
        )
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
    BitNot,
    PreInc,
    PreDec,
    PostInc,
    PostDec,
}

impl UnaryOp {
    pub fn from_token(token: &str) -> Option<Self> {
        Some(match token {
            "!" => UnaryOp::Not,
            "-" => UnaryOp::Neg,
            "+" => UnaryOp::Plus,
            "~" => UnaryOp::BitNot,
            _ => return None,
        })
    }

    pub fn token(&self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::Neg => "-",
            UnaryOp::Plus => "+",
            UnaryOp::BitNot => "~",
            UnaryOp::PreInc | UnaryOp::PostInc => "++",
            UnaryOp::PreDec | UnaryOp::PostDec => "--",
        }
    }

    pub fn is_postfix(&self) -> bool {
        matches!(self, UnaryOp::PostInc | UnaryOp::PostDec)
    }
}

/// Node kinds.
///
/// Expression kinds keep a fixed child layout:
/// - `Binary`: `[left, right]`
/// - `Unary`: `[operand]`
/// - `MethodInvocation`: `[receiver or Empty, Arguments]`, name in `text`
/// - `FieldAccess`: `[receiver]`, field name in `text`
/// - `NewObject`: `[Arguments]`, type as written in `text`
/// - `Lambda`: `[LambdaParams, body]`
/// - `Ternary`: `[condition, then, else]`
/// - `Parenthesized`: `[inner]`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKind {
    CompilationUnit,
    ClassDeclaration,
    MethodDeclaration,
    Block,
    ExpressionStatement,
    Return,
    /// Local variable declaration; name in `text`, declared type in `ty`,
    /// initializer (if any) as the only child.
    LocalVariable,
    Binary(BinaryOp),
    Unary(UnaryOp),
    MethodInvocation,
    Arguments,
    FieldAccess,
    Identifier,
    Literal,
    NewObject,
    Lambda,
    LambdaParams,
    Ternary,
    Parenthesized,
    /// Placeholder for an absent optional child.
    Empty,
    /// Syntax the engine carries through but does not model.
    Other(String),
}

impl NodeKind {
    pub fn is_statement(&self) -> bool {
        matches!(
            self,
            NodeKind::ExpressionStatement | NodeKind::Return | NodeKind::LocalVariable | NodeKind::Block
        )
    }

    pub fn is_expression(&self) -> bool {
        matches!(
            self,
            NodeKind::Binary(_)
                | NodeKind::Unary(_)
                | NodeKind::MethodInvocation
                | NodeKind::FieldAccess
                | NodeKind::Identifier
                | NodeKind::Literal
                | NodeKind::NewObject
                | NodeKind::Lambda
                | NodeKind::Ternary
                | NodeKind::Parenthesized
        )
    }
}

/// What a name resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Symbol {
    /// A template parameter.
    Parameter(String),
    /// A local variable or method parameter in a compilation unit.
    Local(String),
    Field { owner: String, name: String },
    /// A method; constructors use the name `<constructor>`.
    Method { owner: String, name: String },
    /// A class name used as an expression (static receiver).
    Type(String),
}

pub const CONSTRUCTOR: &str = "<constructor>";

/// A node of the attributed tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub text: Option<String>,
    pub ty: JavaType,
    pub symbol: Option<Symbol>,
    /// Byte range in the source the node was parsed from.
    pub span: Option<Range<usize>>,
    pub children: Vec<NodeRef>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            text: None,
            ty: JavaType::Unknown,
            symbol: None,
            span: None,
            children: Vec::new(),
        }
    }

    pub fn empty() -> NodeRef {
        Arc::new(Node::new(NodeKind::Empty))
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_type(mut self, ty: JavaType) -> Self {
        self.ty = ty;
        self
    }

    pub fn with_symbol(mut self, symbol: Symbol) -> Self {
        self.symbol = Some(symbol);
        self
    }

    pub fn with_span(mut self, span: Range<usize>) -> Self {
        self.span = Some(span);
        self
    }

    pub fn with_children(mut self, children: Vec<NodeRef>) -> Self {
        self.children = children;
        self
    }

    pub fn into_ref(self) -> NodeRef {
        Arc::new(self)
    }

    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    pub fn child(&self, index: usize) -> Option<&NodeRef> {
        self.children.get(index)
    }

    pub fn is_empty(&self) -> bool {
        self.kind == NodeKind::Empty
    }

    /// Copies this node with new children. The copy has no source span,
    /// since its text no longer matches the original range.
    pub fn rebuilt(&self, children: Vec<NodeRef>) -> Node {
        Node {
            kind: self.kind.clone(),
            text: self.text.clone(),
            ty: self.ty.clone(),
            symbol: self.symbol.clone(),
            span: None,
            children,
        }
    }

    /// Structural equality: kind, text, symbol and children, ignoring spans
    /// and types.
    pub fn same_structure(&self, other: &Node) -> bool {
        self.kind == other.kind
            && self.text == other.text
            && self.symbol == other.symbol
            && self.children.len() == other.children.len()
            && self
                .children
                .iter()
                .zip(&other.children)
                .all(|(a, b)| Arc::ptr_eq(a, b) || a.same_structure(b))
    }

    /// Pre-order walk over this node and all descendants.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a Node)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }

    /// True for a literal (or a parenthesized / negated literal).
    pub fn is_constant(&self) -> bool {
        match &self.kind {
            NodeKind::Literal => true,
            NodeKind::Parenthesized
            | NodeKind::Unary(UnaryOp::Neg | UnaryOp::Plus | UnaryOp::Not | UnaryOp::BitNot) => {
                self.children.first().is_some_and(|c| c.is_constant())
            }
            NodeKind::Binary(_) => self.children.iter().all(|c| c.is_constant()),
            _ => false,
        }
    }
}

/// Strips any parentheses wrapped around `node`.
pub fn unparenthesize(node: &NodeRef) -> NodeRef {
    let mut node = node.clone();
    while node.kind == NodeKind::Parenthesized {
        match node.children.first() {
            Some(inner) => node = inner.clone(),
            None => break,
        }
    }
    node
}

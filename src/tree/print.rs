//! Rendering trees back to Java source and applying text edits.

use super::types::JavaType;
use super::{Node, NodeKind};
use std::ops::Range;

/// A replacement of a byte range in a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub span: Range<usize>,
    pub replacement: String,
}

impl Edit {
    pub fn new(span: Range<usize>, replacement: impl Into<String>) -> Self {
        Self {
            span,
            replacement: replacement.into(),
        }
    }
}

/// Renders a node as Java source.
///
/// Subtrees that still carry a span are copied verbatim from `source`;
/// everything else is printed structurally, adding parentheses where operator
/// precedence requires them.
pub fn render(node: &Node, source: &str) -> String {
    let mut out = String::new();
    Printer { source }.print(node, &mut out);
    out
}

/// Applies non-overlapping edits, back to front so earlier offsets stay valid.
pub fn apply_edits(source: &str, edits: &[Edit]) -> String {
    let mut edits = edits.to_vec();
    edits.sort_by(|a, b| b.span.start.cmp(&a.span.start));

    let mut result = source.to_string();
    let mut floor = usize::MAX;
    for edit in &edits {
        let Range { start, end } = edit.span.clone();
        if start <= end && end <= result.len() && end <= floor {
            result.replace_range(start..end, &edit.replacement);
            floor = start;
        }
    }
    result
}

/// Widens a statement span to swallow its indentation and line break when
/// the statement sits alone on its line.
pub fn deletion_span(source: &str, span: Range<usize>) -> Range<usize> {
    let bytes = source.as_bytes();
    let mut start = span.start;
    while start > 0 && matches!(bytes[start - 1], b' ' | b'\t') {
        start -= 1;
    }
    let mut end = span.end;
    while end < bytes.len() && matches!(bytes[end], b' ' | b'\t') {
        end += 1;
    }
    let line_start = start == 0 || bytes[start - 1] == b'\n';
    let line_end = end == bytes.len() || bytes[end] == b'\n' || bytes[end] == b'\r';
    if !(line_start && line_end) {
        return span;
    }
    if end < bytes.len() && bytes[end] == b'\r' {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'\n' {
        end += 1;
    }
    start..end
}

/// Binding strength of an expression node.
pub(crate) fn precedence(node: &Node) -> u8 {
    match &node.kind {
        NodeKind::Binary(op) => op.precedence(),
        NodeKind::Unary(op) if op.is_postfix() => 15,
        NodeKind::Unary(_) => 14,
        NodeKind::Ternary => 2,
        NodeKind::Lambda => 1,
        _ => 16,
    }
}

struct Printer<'a> {
    source: &'a str,
}

impl Printer<'_> {
    fn print(&self, node: &Node, out: &mut String) {
        if let Some(text) = node.span.clone().and_then(|span| self.source.get(span)) {
            out.push_str(text);
            return;
        }
        match &node.kind {
            NodeKind::Other(kind) if kind == "throw_statement" => {
                out.push_str("throw ");
                if let Some(expr) = node.child(0) {
                    self.print(expr, out);
                }
                out.push(';');
            }
            NodeKind::Identifier | NodeKind::Literal | NodeKind::Other(_) => out.push_str(node.text()),
            NodeKind::Empty => {}
            NodeKind::Binary(op) => {
                self.operand(node.child(0), op.precedence(), out);
                out.push(' ');
                out.push_str(op.token());
                out.push(' ');
                self.operand(node.child(1), op.precedence() + 1, out);
            }
            NodeKind::Unary(op) if op.is_postfix() => {
                self.operand(node.child(0), 15, out);
                out.push_str(op.token());
            }
            NodeKind::Unary(op) => {
                out.push_str(op.token());
                self.operand(node.child(0), 14, out);
            }
            NodeKind::MethodInvocation => {
                if let Some(receiver) = node.child(0).filter(|r| !r.is_empty()) {
                    self.operand(Some(receiver), 16, out);
                    out.push('.');
                }
                out.push_str(node.text());
                out.push('(');
                if let Some(args) = node.child(1) {
                    self.print(args, out);
                }
                out.push(')');
            }
            NodeKind::FieldAccess => {
                if let Some(receiver) = node.child(0).filter(|r| !r.is_empty()) {
                    self.operand(Some(receiver), 16, out);
                    out.push('.');
                }
                out.push_str(node.text());
            }
            NodeKind::Arguments | NodeKind::LambdaParams => {
                for (i, arg) in node.children.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.print(arg, out);
                }
            }
            NodeKind::NewObject => {
                out.push_str("new ");
                out.push_str(node.text());
                out.push('(');
                if let Some(args) = node.child(0) {
                    self.print(args, out);
                }
                out.push(')');
            }
            NodeKind::Lambda => {
                let params = node.child(0);
                let single = params.is_some_and(|p| p.children.len() == 1);
                if !single {
                    out.push('(');
                }
                if let Some(params) = params {
                    self.print(params, out);
                }
                if !single {
                    out.push(')');
                }
                out.push_str(" -> ");
                if let Some(body) = node.child(1) {
                    self.print(body, out);
                }
            }
            NodeKind::Ternary => {
                self.operand(node.child(0), 3, out);
                out.push_str(" ? ");
                self.operand(node.child(1), 2, out);
                out.push_str(" : ");
                self.operand(node.child(2), 2, out);
            }
            NodeKind::Parenthesized => {
                out.push('(');
                if let Some(inner) = node.child(0) {
                    self.print(inner, out);
                }
                out.push(')');
            }
            NodeKind::ExpressionStatement => {
                if let Some(expr) = node.child(0) {
                    self.print(expr, out);
                }
                out.push(';');
            }
            NodeKind::Return => {
                out.push_str("return");
                if let Some(expr) = node.child(0).filter(|e| !e.is_empty()) {
                    out.push(' ');
                    self.print(expr, out);
                }
                out.push(';');
            }
            NodeKind::LocalVariable => {
                out.push_str(&short_type(&node.ty));
                out.push(' ');
                out.push_str(node.text());
                if let Some(init) = node.child(0).filter(|e| !e.is_empty()) {
                    out.push_str(" = ");
                    self.print(init, out);
                }
                out.push(';');
            }
            NodeKind::Block => {
                out.push_str("{\n");
                for stmt in &node.children {
                    self.print(stmt, out);
                    out.push('\n');
                }
                out.push('}');
            }
            NodeKind::CompilationUnit | NodeKind::ClassDeclaration | NodeKind::MethodDeclaration => {
                for (i, child) in node.children.iter().enumerate() {
                    if i > 0 {
                        out.push('\n');
                    }
                    self.print(child, out);
                }
            }
        }
    }

    fn operand(&self, node: Option<&super::NodeRef>, min: u8, out: &mut String) {
        let Some(node) = node else {
            return;
        };
        if precedence(node) < min {
            out.push('(');
            self.print(node, out);
            out.push(')');
        } else {
            self.print(node, out);
        }
    }
}

/// Java type with package prefixes dropped.
fn short_type(ty: &JavaType) -> String {
    match ty {
        JavaType::Class { name, args } => {
            let simple = name.rsplit('.').next().unwrap_or(name);
            if args.is_empty() {
                simple.to_string()
            } else {
                let args: Vec<String> = args.iter().map(short_type).collect();
                format!("{}<{}>", simple, args.join(", "))
            }
        }
        JavaType::Array(elem) => format!("{}[]", short_type(elem)),
        JavaType::Unknown => "var".to_string(),
        other => other.to_string(),
    }
}

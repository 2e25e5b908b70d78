//! Lowering of tree-sitter Java syntax into attributed [`Node`] trees.
//!
//! Lowering resolves names through lexical scopes, types every expression it
//! can and records the member each invocation or field access refers to.
//! Syntax without a dedicated [`NodeKind`] is kept as `Other` so rewrites can
//! still reach expressions nested inside it.

use super::java::TemplateEnv;
use crate::tree::catalog::TypeCatalog;
use crate::tree::types::{JavaType, Primitive, TypeNames};
use crate::tree::{BinaryOp, CONSTRUCTOR, Node, NodeKind, NodeRef, Symbol, UnaryOp};
use std::collections::HashMap;
use tree_sitter::Node as TsNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Unit,
    Template,
}

#[derive(Debug, Clone)]
struct Binding {
    ty: JavaType,
    symbol: Symbol,
}

#[derive(Debug, Default)]
struct ClassContext {
    name: String,
    fields: HashMap<String, JavaType>,
    methods: HashMap<String, JavaType>,
}

const LITERALS: &[&str] = &[
    "decimal_integer_literal",
    "hex_integer_literal",
    "octal_integer_literal",
    "binary_integer_literal",
    "decimal_floating_point_literal",
    "hex_floating_point_literal",
    "true",
    "false",
    "null_literal",
    "character_literal",
    "string_literal",
    "text_block",
];

const EXPRESSIONS: &[&str] = &[
    "binary_expression",
    "unary_expression",
    "update_expression",
    "method_invocation",
    "field_access",
    "identifier",
    "this",
    "parenthesized_expression",
    "object_creation_expression",
    "lambda_expression",
    "ternary_expression",
    "cast_expression",
    "assignment_expression",
    "array_access",
    "instanceof_expression",
    "array_creation_expression",
    "method_reference",
    "class_literal",
];

/// Kinds that open a lexical scope for declarations among their children.
const SCOPES: &[&str] = &[
    "for_statement",
    "enhanced_for_statement",
    "catch_clause",
    "try_with_resources_statement",
    "switch_block_statement_group",
];

pub(crate) struct Lowerer<'a> {
    source: &'a str,
    names: TypeNames,
    catalog: &'a TypeCatalog,
    mode: Mode,
    scopes: Vec<HashMap<String, Binding>>,
    classes: Vec<ClassContext>,
    type_bounds: HashMap<String, JavaType>,
    /// Names a template body used without declaring them.
    pub(crate) unresolved: Vec<String>,
}

impl<'a> Lowerer<'a> {
    pub(crate) fn for_unit(source: &'a str, names: TypeNames, catalog: &'a TypeCatalog) -> Self {
        Self {
            source,
            names,
            catalog,
            mode: Mode::Unit,
            scopes: vec![HashMap::new()],
            classes: Vec::new(),
            type_bounds: HashMap::new(),
            unresolved: Vec::new(),
        }
    }

    pub(crate) fn for_template(source: &'a str, env: &TemplateEnv<'a>) -> Self {
        let mut names = env.names.clone();
        let mut type_bounds = HashMap::new();
        for param in env.type_params {
            names.add_type_var(&param.name);
            let bound = param.bounds.first().cloned().unwrap_or_else(JavaType::object);
            type_bounds.insert(param.name.clone(), bound);
        }
        let root = env
            .params
            .iter()
            .map(|(name, ty)| {
                (
                    name.clone(),
                    Binding {
                        ty: ty.clone(),
                        symbol: Symbol::Parameter(name.clone()),
                    },
                )
            })
            .collect();
        Self {
            source,
            names,
            catalog: env.catalog,
            mode: Mode::Template,
            scopes: vec![root],
            classes: Vec::new(),
            type_bounds,
            unresolved: Vec::new(),
        }
    }

    fn text(&self, node: TsNode) -> &'a str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    fn finish(&self, ts: TsNode, node: Node) -> NodeRef {
        match self.mode {
            Mode::Unit => node.with_span(ts.byte_range()).into_ref(),
            Mode::Template => node.into_ref(),
        }
    }

    fn parse_type(&self, text: &str) -> JavaType {
        match text.trim() {
            "var" => JavaType::Unknown,
            text => self.names.parse_or_unknown(text),
        }
    }

    fn lookup(&self, name: &str) -> Option<&Binding> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    fn bind(&mut self, name: &str, ty: JavaType) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(
                name.to_string(),
                Binding {
                    ty,
                    symbol: Symbol::Local(name.to_string()),
                },
            );
        }
    }

    fn scoped<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.scopes.push(HashMap::new());
        let result = f(self);
        self.scopes.pop();
        result
    }

    /// Lowers any node, dispatching on whether it is an expression.
    pub(crate) fn lower_any(&mut self, node: TsNode) -> NodeRef {
        let kind = node.kind();
        if EXPRESSIONS.contains(&kind) || LITERALS.contains(&kind) {
            self.lower_expr(node)
        } else {
            self.lower_statement(node)
        }
    }

    fn lower_statement(&mut self, node: TsNode) -> NodeRef {
        match node.kind() {
            "program" => {
                let children: Vec<NodeRef> = named(node)
                    .into_iter()
                    .filter(|c| !matches!(c.kind(), "package_declaration" | "import_declaration"))
                    .map(|c| self.lower_any(c))
                    .collect();
                self.finish(node, Node::new(NodeKind::CompilationUnit).with_children(children))
            }
            "class_declaration" | "interface_declaration" | "enum_declaration" | "record_declaration" => {
                self.lower_class(node)
            }
            "method_declaration" | "constructor_declaration" => self.lower_method(node),
            "block" | "constructor_body" => {
                let children: Vec<NodeRef> =
                    self.scoped(|this| named(node).into_iter().map(|c| this.lower_any(c)).collect());
                self.finish(node, Node::new(NodeKind::Block).with_children(children))
            }
            "expression_statement" => {
                let children: Vec<NodeRef> = named(node).into_iter().map(|c| self.lower_any(c)).collect();
                self.finish(node, Node::new(NodeKind::ExpressionStatement).with_children(children))
            }
            "return_statement" => {
                let value = match named(node).first() {
                    Some(value) => self.lower_expr(*value),
                    None => Node::empty(),
                };
                self.finish(node, Node::new(NodeKind::Return).with_children(vec![value]))
            }
            "local_variable_declaration" => self.lower_local(node),
            "enhanced_for_statement" => self.scoped(|this| this.lower_enhanced_for(node)),
            kind if SCOPES.contains(&kind) => self.scoped(|this| this.lower_generic(node)),
            _ => self.lower_generic(node),
        }
    }

    fn lower_generic(&mut self, node: TsNode) -> NodeRef {
        let children: Vec<NodeRef> = named(node).into_iter().map(|c| self.lower_any(c)).collect();
        let ty = self.generic_type(node, &children);
        let mut lowered = Node::new(NodeKind::Other(node.kind().to_string())).with_type(ty);
        if children.is_empty() {
            lowered = lowered.with_text(self.text(node));
        }
        self.finish(node, lowered.with_children(children))
    }

    fn generic_type(&self, node: TsNode, children: &[NodeRef]) -> JavaType {
        match node.kind() {
            "cast_expression" => node
                .child_by_field_name("type")
                .map(|t| self.parse_type(self.text(t)))
                .unwrap_or(JavaType::Unknown),
            "assignment_expression" => children.first().map(|c| c.ty.clone()).unwrap_or(JavaType::Unknown),
            "array_access" => match children.first().map(|c| &c.ty) {
                Some(JavaType::Array(elem)) => (**elem).clone(),
                _ => JavaType::Unknown,
            },
            "instanceof_expression" => JavaType::Primitive(Primitive::Boolean),
            "class_literal" => JavaType::class("java.lang.Class"),
            _ => JavaType::Unknown,
        }
    }

    fn lower_class(&mut self, node: TsNode) -> NodeRef {
        let name = node
            .child_by_field_name("name")
            .map(|n| self.text(n).to_string())
            .unwrap_or_default();
        let body = node.child_by_field_name("body");
        let mut context = ClassContext {
            name: name.clone(),
            ..Default::default()
        };
        for member in body.map(named).unwrap_or_default() {
            match member.kind() {
                "field_declaration" => {
                    let ty = member
                        .child_by_field_name("type")
                        .map(|t| self.parse_type(self.text(t)))
                        .unwrap_or(JavaType::Unknown);
                    let mut cursor = member.walk();
                    for declarator in member.children_by_field_name("declarator", &mut cursor) {
                        if let Some(field) = declarator.child_by_field_name("name") {
                            context.fields.insert(self.text(field).to_string(), ty.clone());
                        }
                    }
                }
                "method_declaration" => {
                    let returns = member
                        .child_by_field_name("type")
                        .map(|t| self.parse_type(self.text(t)))
                        .unwrap_or(JavaType::Unknown);
                    if let Some(method) = member.child_by_field_name("name") {
                        context.methods.insert(self.text(method).to_string(), returns);
                    }
                }
                _ => {}
            }
        }

        self.classes.push(context);
        let children: Vec<NodeRef> = self.scoped(|this| {
            body.map(named)
                .unwrap_or_default()
                .into_iter()
                .map(|member| this.lower_any(member))
                .collect()
        });
        self.classes.pop();
        self.finish(
            node,
            Node::new(NodeKind::ClassDeclaration)
                .with_text(name.clone())
                .with_type(JavaType::class(name))
                .with_children(children),
        )
    }

    fn lower_method(&mut self, node: TsNode) -> NodeRef {
        let name = node
            .child_by_field_name("name")
            .map(|n| self.text(n).to_string())
            .unwrap_or_default();
        let returns = node
            .child_by_field_name("type")
            .map(|t| self.parse_type(self.text(t)))
            .unwrap_or(JavaType::Void);
        let body = self.scoped(|this| {
            if let Some(params) = node.child_by_field_name("parameters") {
                for param in named(params) {
                    this.bind_parameter(param);
                }
            }
            match node.child_by_field_name("body") {
                Some(body) => this.lower_statement(body),
                None => Node::empty(),
            }
        });
        self.finish(
            node,
            Node::new(NodeKind::MethodDeclaration)
                .with_text(name)
                .with_type(returns)
                .with_children(vec![body]),
        )
    }

    fn bind_parameter(&mut self, param: TsNode) {
        match param.kind() {
            "formal_parameter" => {
                let ty = param
                    .child_by_field_name("type")
                    .map(|t| self.parse_type(self.text(t)))
                    .unwrap_or(JavaType::Unknown);
                if let Some(name) = param.child_by_field_name("name") {
                    self.bind(self.text(name), ty);
                }
            }
            "spread_parameter" => {
                let children = named(param);
                let elem = children
                    .iter()
                    .find(|c| c.kind() != "modifiers" && c.kind() != "variable_declarator")
                    .map(|t| self.parse_type(self.text(*t)))
                    .unwrap_or(JavaType::Unknown);
                let name = children
                    .iter()
                    .find(|c| c.kind() == "variable_declarator")
                    .and_then(|d| d.child_by_field_name("name"));
                if let Some(name) = name {
                    self.bind(self.text(name), JavaType::Array(Box::new(elem)));
                }
            }
            _ => {}
        }
    }

    fn lower_local(&mut self, node: TsNode) -> NodeRef {
        let declared = node
            .child_by_field_name("type")
            .map(|t| self.parse_type(self.text(t)))
            .unwrap_or(JavaType::Unknown);
        let declarators: Vec<TsNode> = {
            let mut cursor = node.walk();
            node.children_by_field_name("declarator", &mut cursor).collect()
        };

        let mut locals = Vec::new();
        for declarator in &declarators {
            let name = declarator
                .child_by_field_name("name")
                .map(|n| self.text(n))
                .unwrap_or_default();
            let init = match declarator.child_by_field_name("value") {
                Some(value) => self.lower_any(value),
                None => Node::empty(),
            };
            let ty = if declared.is_known() {
                declared.clone()
            } else {
                init.ty.clone()
            };
            self.bind(name, ty.clone());
            let local = Node::new(NodeKind::LocalVariable)
                .with_text(name)
                .with_type(ty)
                .with_symbol(Symbol::Local(name.to_string()))
                .with_children(vec![init]);
            let span_node = if declarators.len() == 1 { node } else { *declarator };
            locals.push(self.finish(span_node, local));
        }

        match locals.len() {
            1 => locals.remove(0),
            _ => self.finish(
                node,
                Node::new(NodeKind::Other(node.kind().to_string())).with_children(locals),
            ),
        }
    }

    fn lower_enhanced_for(&mut self, node: TsNode) -> NodeRef {
        let value = node.child_by_field_name("value").map(|v| self.lower_any(v));
        let declared = node
            .child_by_field_name("type")
            .map(|t| self.parse_type(self.text(t)))
            .unwrap_or(JavaType::Unknown);
        let element = match (&declared, value.as_ref().map(|v| &v.ty)) {
            (JavaType::Unknown, Some(JavaType::Array(elem))) => (**elem).clone(),
            (JavaType::Unknown, Some(iterable)) => self
                .catalog
                .as_super(iterable, "java.lang.Iterable")
                .and_then(|view| match view {
                    JavaType::Class { mut args, .. } if args.len() == 1 => args.pop(),
                    _ => None,
                })
                .unwrap_or(JavaType::Unknown),
            (declared, _) => declared.clone(),
        };
        if let Some(name) = node.child_by_field_name("name") {
            self.bind(self.text(name), element);
        }
        let mut children: Vec<NodeRef> = value.into_iter().collect();
        if let Some(body) = node.child_by_field_name("body") {
            children.push(self.lower_any(body));
        }
        self.finish(
            node,
            Node::new(NodeKind::Other(node.kind().to_string())).with_children(children),
        )
    }

    pub(crate) fn lower_expr(&mut self, node: TsNode) -> NodeRef {
        let kind = node.kind();
        if LITERALS.contains(&kind) {
            let text = self.text(node);
            let lowered = Node::new(NodeKind::Literal)
                .with_text(text)
                .with_type(literal_type(kind, text));
            return self.finish(node, lowered);
        }
        match kind {
            "parenthesized_expression" => {
                let inner = match named(node).first() {
                    Some(inner) => self.lower_expr(*inner),
                    None => Node::empty(),
                };
                let lowered = Node::new(NodeKind::Parenthesized)
                    .with_type(inner.ty.clone())
                    .with_children(vec![inner]);
                self.finish(node, lowered)
            }
            "binary_expression" => self.lower_binary(node),
            "unary_expression" => {
                let op = node
                    .child_by_field_name("operator")
                    .and_then(|o| UnaryOp::from_token(o.kind()));
                let operand = node.child_by_field_name("operand").map(|o| self.lower_expr(o));
                match (op, operand) {
                    (Some(op), Some(operand)) => self.unary(node, op, operand),
                    _ => self.lower_generic(node),
                }
            }
            "update_expression" => {
                let first = node.child(0).map(|c| c.kind());
                let last = node.child(1).map(|c| c.kind());
                let op = match (first, last) {
                    (Some("++"), _) => UnaryOp::PreInc,
                    (Some("--"), _) => UnaryOp::PreDec,
                    (_, Some("++")) => UnaryOp::PostInc,
                    _ => UnaryOp::PostDec,
                };
                match named(node).first() {
                    Some(operand) => {
                        let operand = self.lower_expr(*operand);
                        self.unary(node, op, operand)
                    }
                    None => self.lower_generic(node),
                }
            }
            "method_invocation" => self.lower_invocation(node),
            "field_access" => self.lower_field_access(node),
            "identifier" => self.lower_identifier(node),
            "this" => {
                let ty = self
                    .classes
                    .last()
                    .map(|c| JavaType::class(c.name.clone()))
                    .unwrap_or(JavaType::Unknown);
                self.finish(node, Node::new(NodeKind::Identifier).with_text("this").with_type(ty))
            }
            "object_creation_expression" => self.lower_new(node),
            "lambda_expression" => self.scoped(|this| this.lower_lambda(node)),
            "ternary_expression" => {
                let parts: Vec<NodeRef> = ["condition", "consequence", "alternative"]
                    .iter()
                    .map(|field| match node.child_by_field_name(field) {
                        Some(part) => self.lower_expr(part),
                        None => Node::empty(),
                    })
                    .collect();
                let ty = conditional_type(&parts[1].ty, &parts[2].ty);
                self.finish(node, Node::new(NodeKind::Ternary).with_type(ty).with_children(parts))
            }
            _ => self.lower_generic(node),
        }
    }

    fn unary(&self, node: TsNode, op: UnaryOp, operand: NodeRef) -> NodeRef {
        let ty = match op {
            UnaryOp::Not => JavaType::Primitive(Primitive::Boolean),
            UnaryOp::PreInc | UnaryOp::PreDec | UnaryOp::PostInc | UnaryOp::PostDec => operand.ty.clone(),
            _ => match operand.ty.as_primitive() {
                Some(p) => JavaType::Primitive(Primitive::promote(p, Primitive::Int)),
                None => JavaType::Unknown,
            },
        };
        self.finish(
            node,
            Node::new(NodeKind::Unary(op)).with_type(ty).with_children(vec![operand]),
        )
    }

    fn lower_binary(&mut self, node: TsNode) -> NodeRef {
        let op = node
            .child_by_field_name("operator")
            .and_then(|o| BinaryOp::from_token(o.kind()));
        let (Some(op), Some(left), Some(right)) = (
            op,
            node.child_by_field_name("left"),
            node.child_by_field_name("right"),
        ) else {
            return self.lower_generic(node);
        };
        let left = self.lower_expr(left);
        let right = self.lower_expr(right);
        let ty = binary_type(op, &left.ty, &right.ty);
        self.finish(
            node,
            Node::new(NodeKind::Binary(op))
                .with_type(ty)
                .with_children(vec![left, right]),
        )
    }

    fn lower_arguments(&mut self, node: Option<TsNode>) -> NodeRef {
        let Some(node) = node else {
            return Node::new(NodeKind::Arguments).into_ref();
        };
        let args: Vec<NodeRef> = named(node).into_iter().map(|a| self.lower_expr(a)).collect();
        self.finish(node, Node::new(NodeKind::Arguments).with_children(args))
    }

    fn lower_invocation(&mut self, node: TsNode) -> NodeRef {
        let name = node
            .child_by_field_name("name")
            .map(|n| self.text(n))
            .unwrap_or_default();
        let receiver = match node.child_by_field_name("object") {
            Some(object) => self.lower_receiver(object),
            None => Node::empty(),
        };
        let args = self.lower_arguments(node.child_by_field_name("arguments"));

        let (symbol, ty) = if receiver.is_empty() {
            match self.classes.last() {
                Some(class) => (
                    Some(Symbol::Method {
                        owner: class.name.clone(),
                        name: name.to_string(),
                    }),
                    class.methods.get(name).cloned().unwrap_or(JavaType::Unknown),
                ),
                None => {
                    if self.mode == Mode::Template {
                        self.unresolved.push(format!("{}()", name));
                    }
                    (None, JavaType::Unknown)
                }
            }
        } else {
            self.resolve_member(&receiver, name, false)
        };

        let mut lowered = Node::new(NodeKind::MethodInvocation)
            .with_text(name)
            .with_type(ty)
            .with_children(vec![receiver, args]);
        if let Some(symbol) = symbol {
            lowered = lowered.with_symbol(symbol);
        }
        self.finish(node, lowered)
    }

    fn lower_field_access(&mut self, node: TsNode) -> NodeRef {
        let field = node
            .child_by_field_name("field")
            .map(|n| self.text(n))
            .unwrap_or_default();
        let receiver = match node.child_by_field_name("object") {
            Some(object) => self.lower_receiver(object),
            None => Node::empty(),
        };
        let (symbol, ty) = if receiver.text() == "this" && receiver.kind == NodeKind::Identifier {
            self.own_field(field)
        } else {
            self.resolve_member(&receiver, field, true)
        };
        let mut lowered = Node::new(NodeKind::FieldAccess)
            .with_text(field)
            .with_type(ty)
            .with_children(vec![receiver]);
        if let Some(symbol) = symbol {
            lowered = lowered.with_symbol(symbol);
        }
        self.finish(node, lowered)
    }

    fn own_field(&self, name: &str) -> (Option<Symbol>, JavaType) {
        match self.classes.last() {
            Some(class) => (
                Some(Symbol::Field {
                    owner: class.name.clone(),
                    name: name.to_string(),
                }),
                class.fields.get(name).cloned().unwrap_or(JavaType::Unknown),
            ),
            None => (None, JavaType::Unknown),
        }
    }

    /// Lowers an invocation or field-access receiver, recognizing class
    /// names (simple or qualified) used as static receivers.
    fn lower_receiver(&mut self, node: TsNode) -> NodeRef {
        if matches!(node.kind(), "identifier" | "field_access" | "scoped_identifier") {
            let text = self.text(node);
            if let Some(fqn) = self.as_type_name(text) {
                let lowered = Node::new(NodeKind::Identifier)
                    .with_text(text)
                    .with_type(JavaType::class(fqn.clone()))
                    .with_symbol(Symbol::Type(fqn));
                return self.finish(node, lowered);
            }
        }
        self.lower_expr(node)
    }

    fn as_type_name(&self, text: &str) -> Option<String> {
        let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        let segments: Vec<&str> = compact.split('.').collect();
        let head = segments.first()?;
        if self.lookup(*head).is_some()
            || self
                .classes
                .last()
                .is_some_and(|c| c.fields.contains_key(*head))
        {
            return None;
        }
        let upper = |s: &str| s.chars().next().is_some_and(|c| c.is_ascii_uppercase());
        if segments.len() == 1 {
            return upper(*head).then(|| self.names.qualify(*head));
        }
        let qualified = self.names.qualify(&compact);
        if self.catalog.contains(&qualified) {
            return Some(qualified);
        }
        let (last, packages) = segments.split_last()?;
        let package_path = packages.iter().all(|s| !upper(*s));
        (package_path && upper(*last)).then_some(compact)
    }

    fn lower_identifier(&mut self, node: TsNode) -> NodeRef {
        let name = self.text(node);
        let mut lowered = Node::new(NodeKind::Identifier).with_text(name);
        if let Some(binding) = self.lookup(name) {
            lowered = lowered
                .with_type(binding.ty.clone())
                .with_symbol(binding.symbol.clone());
        } else if self.classes.last().is_some_and(|c| c.fields.contains_key(name)) {
            let (symbol, ty) = self.own_field(name);
            lowered = lowered.with_type(ty);
            if let Some(symbol) = symbol {
                lowered = lowered.with_symbol(symbol);
            }
        } else if name.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
            let fqn = self.names.qualify(name);
            lowered = lowered
                .with_type(JavaType::class(fqn.clone()))
                .with_symbol(Symbol::Type(fqn));
        } else if self.mode == Mode::Template {
            self.unresolved.push(name.to_string());
        } else {
            lowered = lowered.with_symbol(Symbol::Local(name.to_string()));
        }
        self.finish(node, lowered)
    }

    /// Resolves `name` as a member of the receiver's static type.
    fn resolve_member(&mut self, receiver: &Node, name: &str, field: bool) -> (Option<Symbol>, JavaType) {
        let owner = match (&receiver.symbol, &receiver.ty) {
            (Some(Symbol::Type(fqn)), _) => JavaType::class(fqn.clone()),
            (_, JavaType::TypeVar(var)) => self
                .type_bounds
                .get(var)
                .cloned()
                .unwrap_or_else(JavaType::object),
            (_, JavaType::Primitive(_)) => return (None, JavaType::Unknown),
            (_, ty) => ty.clone(),
        };
        if field && name == "length" && matches!(owner, JavaType::Array(_)) {
            return (None, JavaType::Primitive(Primitive::Int));
        }
        let symbol = |owner: &str| {
            if field {
                Symbol::Field {
                    owner: owner.to_string(),
                    name: name.to_string(),
                }
            } else {
                Symbol::Method {
                    owner: owner.to_string(),
                    name: name.to_string(),
                }
            }
        };
        if let Some(member) = self.catalog.find_member(&owner, name, field) {
            return (Some(symbol(&member.declaring)), member.returns);
        }
        match owner.class_name() {
            Some(class) => {
                if self.mode == Mode::Template && self.catalog.contains(class) {
                    self.unresolved.push(format!("{}.{}", class, name));
                }
                (Some(symbol(class)), JavaType::Unknown)
            }
            None => (None, JavaType::Unknown),
        }
    }

    fn lower_new(&mut self, node: TsNode) -> NodeRef {
        let type_text = node
            .child_by_field_name("type")
            .map(|t| self.text(t))
            .unwrap_or_default();
        let ty = self.parse_type(type_text);
        let args = self.lower_arguments(node.child_by_field_name("arguments"));
        let mut children = vec![args];
        if let Some(body) = named(node).into_iter().find(|c| c.kind() == "class_body") {
            children.push(self.lower_generic(body));
        }
        let mut lowered = Node::new(NodeKind::NewObject)
            .with_text(type_text)
            .with_type(ty.clone())
            .with_children(children);
        if let Some(owner) = ty.class_name() {
            lowered = lowered.with_symbol(Symbol::Method {
                owner: owner.to_string(),
                name: CONSTRUCTOR.to_string(),
            });
        }
        self.finish(node, lowered)
    }

    fn lower_lambda(&mut self, node: TsNode) -> NodeRef {
        let mut params = Vec::new();
        if let Some(parameters) = node.child_by_field_name("parameters") {
            let declared: Vec<(TsNode, JavaType)> = match parameters.kind() {
                "identifier" => vec![(parameters, JavaType::Unknown)],
                "inferred_parameters" => named(parameters)
                    .into_iter()
                    .map(|p| (p, JavaType::Unknown))
                    .collect(),
                _ => named(parameters)
                    .into_iter()
                    .filter_map(|p| {
                        let ty = p
                            .child_by_field_name("type")
                            .map(|t| self.parse_type(self.text(t)))
                            .unwrap_or(JavaType::Unknown);
                        p.child_by_field_name("name").map(|n| (n, ty))
                    })
                    .collect(),
            };
            for (name_node, ty) in declared {
                let name = self.text(name_node);
                self.bind(name, ty.clone());
                let param = Node::new(NodeKind::Identifier)
                    .with_text(name)
                    .with_type(ty)
                    .with_symbol(Symbol::Local(name.to_string()));
                params.push(self.finish(name_node, param));
            }
        }
        let params = Node::new(NodeKind::LambdaParams).with_children(params).into_ref();
        let body = match node.child_by_field_name("body") {
            Some(body) => self.lower_any(body),
            None => Node::empty(),
        };
        self.finish(node, Node::new(NodeKind::Lambda).with_children(vec![params, body]))
    }
}

pub(crate) fn named(node: TsNode<'_>) -> Vec<TsNode<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|c| !c.is_extra())
        .collect()
}

fn literal_type(kind: &str, text: &str) -> JavaType {
    let primitive = |p| JavaType::Primitive(p);
    match kind {
        "decimal_integer_literal" | "hex_integer_literal" | "octal_integer_literal" | "binary_integer_literal" => {
            if text.ends_with(['l', 'L']) {
                primitive(Primitive::Long)
            } else {
                primitive(Primitive::Int)
            }
        }
        "decimal_floating_point_literal" | "hex_floating_point_literal" => {
            if text.ends_with(['f', 'F']) {
                primitive(Primitive::Float)
            } else {
                primitive(Primitive::Double)
            }
        }
        "true" | "false" => primitive(Primitive::Boolean),
        "character_literal" => primitive(Primitive::Char),
        "null_literal" => JavaType::Null,
        "string_literal" | "text_block" => JavaType::string(),
        _ => JavaType::Unknown,
    }
}

fn binary_type(op: BinaryOp, left: &JavaType, right: &JavaType) -> JavaType {
    let boolean = JavaType::Primitive(Primitive::Boolean);
    if op.is_comparison() || matches!(op, BinaryOp::And | BinaryOp::Or) {
        return boolean;
    }
    if op == BinaryOp::Add && (left.is_string() || right.is_string()) {
        return JavaType::string();
    }
    let (Some(l), Some(r)) = (left.as_primitive(), right.as_primitive()) else {
        return JavaType::Unknown;
    };
    match op {
        BinaryOp::Shl | BinaryOp::Shr | BinaryOp::UShr => {
            JavaType::Primitive(Primitive::promote(l, Primitive::Int))
        }
        BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor
            if l == Primitive::Boolean && r == Primitive::Boolean =>
        {
            boolean
        }
        _ if l == Primitive::Boolean || r == Primitive::Boolean => JavaType::Unknown,
        _ => JavaType::Primitive(Primitive::promote(l, r)),
    }
}

fn conditional_type(then: &JavaType, otherwise: &JavaType) -> JavaType {
    match (then, otherwise) {
        (JavaType::Null, other) | (other, JavaType::Null) => other.boxed(),
        (a, b) if a == b => a.clone(),
        (a, b) => match (a, b) {
            (JavaType::Primitive(x), JavaType::Primitive(y))
                if *x != Primitive::Boolean && *y != Primitive::Boolean =>
            {
                JavaType::Primitive(Primitive::promote(*x, *y))
            }
            _ => JavaType::Unknown,
        },
    }
}
